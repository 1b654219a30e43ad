//! Matching detected patterns to contract security schemes

use crate::domain::value_objects::SecurityPattern;

/// Reduce a scheme name to its distinguishing stem, e.g. `BearerAuth` -> `bearer`
pub fn normalize_scheme_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem = lower.strip_suffix("auth").unwrap_or(&lower);
    let stem = stem.strip_suffix("authentication").unwrap_or(stem);
    let stem = stem.strip_prefix("api").unwrap_or(stem);
    stem.trim().to_string()
}

/// Whether any detected pattern satisfies `scheme`.
///
/// Exact stems always match. A stem containing the other (either way round)
/// only matches when the pattern's confidence reaches `min_substring_confidence`.
pub fn matches_scheme(
    patterns: &[SecurityPattern],
    scheme: &str,
    min_substring_confidence: f64,
) -> bool {
    let required = normalize_scheme_name(scheme);

    patterns.iter().any(|pattern| {
        let detected = normalize_scheme_name(&pattern.scheme_guess);
        if detected == required {
            return true;
        }
        !detected.is_empty()
            && !required.is_empty()
            && (detected.contains(&required) || required.contains(&detected))
            && pattern.confidence >= min_substring_confidence
    })
}
