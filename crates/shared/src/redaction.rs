//! Secret detection and redaction for log fields and exporter endpoints.

use url::Url;

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// ```
/// use scantel_shared::is_secret_key;
///
/// assert!(is_secret_key("OTEL_EXPORTER_OTLP_HEADERS_AUTH"));
/// assert!(is_secret_key("apiKey"));
/// assert!(!is_secret_key("SCANTEL_LOG_LEVEL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"]
        .iter()
        .any(|marker| key.contains(marker))
}

/// Strip userinfo and query from an endpoint before it is logged or shown.
///
/// Inputs that do not parse as a URL are returned as [`REDACTED`].
pub fn redact_endpoint(endpoint: &str) -> String {
    let Ok(mut url) = Url::parse(endpoint) else {
        return REDACTED.to_string();
    };
    let had_credentials = !url.username().is_empty() || url.password().is_some();
    if had_credentials {
        // set_* only fails for cannot-be-a-base URLs, which carry no userinfo.
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    if url.query().is_some() {
        url.set_query(None);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_secret_patterns() {
        assert!(is_secret_key("SCANTEL_METRICS_TOKEN"));
        assert!(is_secret_key("basic_auth"));
        assert!(is_secret_key("client_secret"));
        assert!(!is_secret_key("SCANTEL_METRICS_ENDPOINT"));
        assert!(!is_secret_key("stage"));
    }

    #[test]
    fn strips_credentials_and_query() {
        assert_eq!(
            redact_endpoint("https://user:pw@collector.local:4318/v1/metrics?token=abc"),
            "https://collector.local:4318/v1/metrics"
        );
        assert_eq!(
            redact_endpoint("http://localhost:4318"),
            "http://localhost:4318/"
        );
    }

    #[test]
    fn unparsable_endpoint_is_hidden() {
        assert_eq!(redact_endpoint("not a url"), REDACTED);
    }
}
