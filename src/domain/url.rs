//! External URL rules
//!
//! The workload is reachable either through an ingress relation or, without
//! one, through the unit's own FQDN.

use url::Url;

/// Schemes accepted for an externally reachable URL
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Check that `external_url` is an absolute http(s) URL with a host.
///
/// Malformed input yields `false`; this never fails.
pub fn validate_external_url(external_url: &str) -> bool {
    match Url::parse(external_url) {
        Ok(parsed) => {
            ALLOWED_SCHEMES.contains(&parsed.scheme())
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// URL of the workload inside the cluster
pub fn internal_url(host: &str, http_port: u16) -> String {
    format!("http://{}:{}", host, http_port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(validate_external_url("https://example.com"));
        assert!(validate_external_url("http://snips.example.com:8080/path"));
        assert!(validate_external_url("http://10.1.2.3"));
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        assert!(!validate_external_url("ftp://x"));
        assert!(!validate_external_url("ssh://snips.example.com"));
    }

    #[test]
    fn test_validate_rejects_missing_parts() {
        assert!(!validate_external_url("example.com"));
        assert!(!validate_external_url("http://"));
        assert!(!validate_external_url("not-a-url"));
        assert!(!validate_external_url(""));
    }

    #[test]
    fn test_internal_url() {
        assert_eq!(
            internal_url("snips-0.snips-endpoints.dev.svc.cluster.local", 8080),
            "http://snips-0.snips-endpoints.dev.svc.cluster.local:8080"
        );
        assert!(validate_external_url(&internal_url("snips-0", 8080)));
    }
}
