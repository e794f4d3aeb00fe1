use anyhow::{anyhow, bail, Context, Result};
use blockpatch::hcl::lexer::line_of;
use blockpatch::{apply, load_all, ApplyOptions, ColorChoice, HclEditor, Settings, SourceKind};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockpatch")]
#[command(about = "Replace named blocks in source and configuration files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a change plan
    Apply {
        /// Plan file (.json or .toml), or a directory of plan files
        #[arg(short, long)]
        plan: PathBuf,

        /// Print a diff of what would change without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Root directory that change paths are resolved against
        #[arg(short, long, env = "BLOCKPATCH_ROOT")]
        root: Option<PathBuf>,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Colorize diff output
        #[arg(long, value_enum)]
        color: Option<ColorChoice>,

        /// Settings file (defaults to blockpatch.toml in the root)
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Show where a block is located
    Locate {
        /// File to search
        #[arg(short, long)]
        file: PathBuf,

        /// Block type: `function`, or the declarative block keyword
        #[arg(short = 't', long = "type")]
        target_type: String,

        /// Function name, or declarative labels joined with ','
        #[arg(short, long, default_value = "")]
        name: String,

        /// Settings file with extra extension mappings
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else warnings only
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "blockpatch=debug"
        } else {
            "blockpatch=warn"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Commands::Apply {
            plan,
            dry_run,
            root,
            workers,
            color,
            settings,
        } => cmd_apply(plan, dry_run, root, workers, color, settings),

        Commands::Locate {
            file,
            target_type,
            name,
            settings,
        } => cmd_locate(&file, &target_type, &name, settings),
    }
}

/// Load `--settings`, or `blockpatch.toml` from `dir`.
fn load_settings(explicit: Option<PathBuf>, dir: &Path) -> Result<Settings> {
    let settings = match explicit {
        Some(path) => Settings::load(path)?,
        None => Settings::discover(dir)?,
    };
    Ok(settings)
}

fn cmd_apply(
    plan: PathBuf,
    dry_run: bool,
    root: Option<PathBuf>,
    workers: Option<usize>,
    color: Option<ColorChoice>,
    settings: Option<PathBuf>,
) -> Result<()> {
    let cwd = env::current_dir().context("failed to read current directory")?;
    let settings = load_settings(settings, root.as_deref().unwrap_or(&cwd))?;

    // flag or BLOCKPATCH_ROOT, then settings; otherwise paths are cwd-relative
    let root = root.or_else(|| settings.apply.root.clone());
    let color = match color.or(settings.apply.color).unwrap_or_default() {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal(),
    };
    colored::control::set_override(color);

    let options = ApplyOptions {
        root,
        dry_run,
        workers: workers.or(settings.apply.workers).unwrap_or(0),
        color,
        registry: settings.registry()?,
    };

    let plans = load_all(&plan)?;
    if plans.is_empty() {
        bail!("no plan files found in {}", plan.display());
    }

    for (plan_path, plan) in plans {
        debug!(plan = %plan_path.display(), query = %plan.query, "loaded plan");
        let report = apply(&plan, &options)
            .with_context(|| format!("failed to apply plan {}", plan_path.display()))?;

        if dry_run {
            print!("{}", report.render());
            eprintln!(
                "{} {}: {} file(s) would change",
                "⊙".cyan(),
                plan_path.display(),
                report.changed_count()
            );
        } else {
            for path in report.written() {
                println!("{} {}", "✓".green(), path.display());
            }
            eprintln!(
                "{} {}: {} file(s) written",
                "✓".green(),
                plan_path.display(),
                report.written().count()
            );
        }
    }

    Ok(())
}

fn cmd_locate(file: &Path, target_type: &str, name: &str, settings: Option<PathBuf>) -> Result<()> {
    let cwd = env::current_dir().context("failed to read current directory")?;
    let registry = load_settings(settings, &cwd)?.registry()?;
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let (byte_start, byte_end, start_line, end_line) = match registry.detect(file) {
        SourceKind::Procedural(lang) => {
            if target_type != "function" {
                bail!("unsupported target type '{target_type}' for {lang} source");
            }
            let span = blockpatch::ts::locate(lang, &source, name)?
                .ok_or_else(|| anyhow!("function not found: {name}"))?;
            (span.byte_start, span.byte_end, span.start_line, span.end_line)
        }
        SourceKind::Declarative => {
            let editor = HclEditor::parse(&source)?;
            let block = editor.require_block(target_type, name)?;
            (
                block.span.start,
                block.span.end,
                line_of(&source, block.span.start),
                line_of(&source, block.span.end),
            )
        }
        SourceKind::Unsupported => bail!("unsupported file type: {}", file.display()),
    };

    println!(
        "{}:{}-{} (bytes {}..{})",
        file.display(),
        start_line,
        end_line,
        byte_start,
        byte_end
    );
    println!("{}", &source[byte_start..byte_end]);
    Ok(())
}
