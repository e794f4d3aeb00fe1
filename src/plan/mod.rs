//! Change plans: what to patch, as built by the upstream planner.

pub mod loader;
pub mod schema;

pub use loader::{load_all, load_from_path, load_from_str, PlanError, PlanFormat};
pub use schema::{
    Block, BlockChange, Change, ChangePlan, PlanChanges, ValidationError, ValidationIssue,
};
