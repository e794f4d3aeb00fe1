//! Closest-name suggestions for not-found errors.

use strsim::jaro_winkler;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Return the candidate most similar to `wanted`, if any clears the threshold.
pub fn closest<'a, I>(wanted: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|candidate| *candidate != wanted)
        .map(|candidate| (jaro_winkler(wanted, candidate), candidate))
        .filter(|(score, _)| *score >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Format an optional suggestion as a trailing hint for error messages.
pub fn suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(candidate) => format!(" (did you mean '{candidate}'?)"),
        None => String::new(),
    }
}
