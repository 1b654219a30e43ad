//! Source heuristics for the API layer

use tracing::warn;

use crate::domain::entities::{Finding, ImplementedEndpoint};
use crate::domain::value_objects::{FindingSeverity, FindingType};
use crate::infrastructure::matcher::{json_pointer_for_operation, normalize_path};

/// Keyword scans over an endpoint's source file
///
/// These are coarse signals, independent of the contract: they flag handler
/// files with no trace of authentication, input validation or error handling.
pub struct ApiLayerAnalyzer;

impl ApiLayerAnalyzer {
    /// Read the endpoint's source and scan it. Unreadable sources yield nothing.
    pub fn analyze(endpoint: &ImplementedEndpoint) -> Vec<Finding> {
        match std::fs::read_to_string(&endpoint.source_file) {
            Ok(code) => Self::analyze_source(&code, endpoint),
            Err(e) => {
                warn!(
                    error = %e,
                    file = %endpoint.source_file.display(),
                    "Failed to read endpoint file"
                );
                Vec::new()
            }
        }
    }

    pub fn analyze_source(code: &str, endpoint: &ImplementedEndpoint) -> Vec<Finding> {
        let lower = code.to_lowercase();
        let mut findings = Vec::new();

        let registers_routes = lower.contains("app.") || lower.contains("router.");
        if registers_routes && !contains_any(&lower, &["auth", "authenticate", "jwt"]) {
            findings.push(Self::finding(
                endpoint,
                FindingType::MissingAuth,
                FindingSeverity::Critical,
                "may be missing authentication",
                "Protect the route with authentication middleware",
            ));
        }

        if !contains_any(&lower, &["validate", "validator", "joi", "zod"]) {
            findings.push(Self::finding(
                endpoint,
                FindingType::MissingValidation,
                FindingSeverity::High,
                "may be missing input validation",
                "Validate request input before use",
            ));
        }

        if !contains_any(&lower, &["try", "catch", "error", "err"]) {
            findings.push(Self::finding(
                endpoint,
                FindingType::MissingErrorHandling,
                FindingSeverity::High,
                "may be missing error handling",
                "Handle failures and map them to error responses",
            ));
        }

        findings
    }

    fn finding(
        endpoint: &ImplementedEndpoint,
        finding_type: FindingType,
        severity: FindingSeverity,
        issue: &str,
        fix: &str,
    ) -> Finding {
        Finding::new(
            finding_type,
            severity,
            endpoint.source_file.display().to_string(),
            format!("Endpoint {} {}", endpoint.label(), issue),
            json_pointer_for_operation(&normalize_path(&endpoint.path), &endpoint.method),
        )
        .with_fix(fix)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> ImplementedEndpoint {
        ImplementedEndpoint::new("POST", "/users", "routes/users.js")
    }

    #[test]
    fn bare_express_route_flags_all_three() {
        let code = "router.post('/users', (req, res) => res.json(req.body));";

        let findings = ApiLayerAnalyzer::analyze_source(code, &endpoint());
        let types: Vec<_> = findings.iter().map(|f| f.finding_type).collect();
        assert_eq!(
            types,
            vec![
                FindingType::MissingAuth,
                FindingType::MissingValidation,
                FindingType::MissingErrorHandling
            ]
        );
        assert_eq!(findings[0].severity, FindingSeverity::Critical);
    }

    #[test]
    fn guarded_handler_is_clean() {
        let code = r#"
router.post('/users', requireAuth, async (req, res) => {
  try {
    const user = schema.validate(req.body);
    res.status(201).json(user);
  } catch (e) {
    res.status(400).end();
  }
});
"#;
        assert!(ApiLayerAnalyzer::analyze_source(code, &endpoint()).is_empty());
    }

    #[test]
    fn non_route_files_skip_auth_check() {
        let code = "func CreateUser(w http.ResponseWriter, r *http.Request) error { return nil }";

        let findings = ApiLayerAnalyzer::analyze_source(code, &endpoint());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].finding_type, FindingType::MissingValidation);
    }

    #[test]
    fn unreadable_source_yields_nothing() {
        let endpoint = ImplementedEndpoint::new("GET", "/users", "does/not/exist.js");
        assert!(ApiLayerAnalyzer::analyze(&endpoint).is_empty());
    }
}
