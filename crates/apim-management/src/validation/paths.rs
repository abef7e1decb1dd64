//! Context path checks.

use regex::Regex;

use super::ValidationIssue;
use super::Severity;
use crate::apis::entity::Api;

/// Slash-led path of letters, digits, `/`, `.`, `-` and `_`.
fn path_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/[/.a-zA-Z0-9_-]*$").unwrap())
}

/// `/orders` and `/orders/` are the same context path.
fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Check `paths` for format errors, duplicates and overlaps with the other
/// APIs of the environment.
pub fn check_context_paths(
    api_id: &str,
    paths: &[(Option<String>, String)],
    others: &[Api],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen: Vec<(Option<String>, String)> = Vec::new();

    for (host, path) in paths {
        if !path_pattern().is_match(path.trim()) {
            issues.push(severe(format!("Context path [{path}] is invalid")));
            continue;
        }
        let normalized = normalize(path);
        if seen.iter().any(|(h, p)| h == host && *p == normalized) {
            issues.push(severe(format!("Context path [{path}] is declared more than once")));
            continue;
        }

        for other in others.iter().filter(|o| o.id != api_id) {
            let conflict = other
                .definition
                .context_paths()
                .into_iter()
                .any(|(h, p)| h == *host && overlaps(&normalize(&p), &normalized));
            if conflict {
                issues.push(severe(format!(
                    "Context path [{path}] is already covered by API [{}]",
                    other.name
                )));
            }
        }
        seen.push((host.clone(), normalized));
    }
    issues
}

fn severe(message: String) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Severe,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::{ApiDefinition, ApiDefinitionV2, ProxyV2, VirtualHost};

    fn v2_api(id: &str, path: &str) -> Api {
        let definition = ApiDefinition::V2(ApiDefinitionV2 {
            proxy: ProxyV2 {
                virtual_hosts: vec![VirtualHost {
                    host: None,
                    path: path.into(),
                    override_entrypoint: false,
                }],
                strip_context_path: true,
                preserve_host: false,
                groups: vec![],
            },
            execution_mode: Default::default(),
            flow_mode: Default::default(),
            properties: vec![],
            services: Default::default(),
            resources: vec![],
            tags: vec![],
            response_templates: Default::default(),
        });
        Api::new(id, id, "env", "org", id, "1", definition)
    }

    fn paths(values: &[&str]) -> Vec<(Option<String>, String)> {
        values.iter().map(|p| (None, p.to_string())).collect()
    }

    #[test]
    fn test_invalid_and_duplicate_paths() {
        let issues = check_context_paths("api-1", &paths(&["orders", "/a b", "/ok", "/ok/"]), &[]);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity == Severity::Severe));
    }

    #[test]
    fn test_overlap_with_other_api() {
        let others = vec![v2_api("api-2", "/orders"), v2_api("api-1", "/orders/v1")];
        assert_eq!(check_context_paths("api-1", &paths(&["/orders/v1"]), &others).len(), 1);
        assert!(check_context_paths("api-1", &paths(&["/ordersx"]), &others).is_empty());
    }
}
