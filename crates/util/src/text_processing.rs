//! # Text Processing Utilities
//!
//! Redaction of secrets before text reaches logs or the screen.

use once_cell::sync::Lazy;
use regex::Regex;

/// Redacts values that look like secrets in a string.
///
/// Key names are preserved so the redacted text stays useful for debugging.
///
/// # Example
/// ```rust
/// use inview_util::redact_sensitive;
///
/// let redacted = redact_sensitive("INVIEW_API_KEY=abc123 TOKEN=xyz789");
/// assert_eq!(redacted, "INVIEW_API_KEY=[REDACTED] TOKEN=[REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, "[REDACTED]")
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in get_redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}{}", prefix, replacement)
            })
            .to_string();
    }

    redacted
}

/// Ordered redaction patterns. Group 1 is kept, the rest of the match is replaced.
pub fn get_redact_patterns() -> &'static Vec<Regex> {
    static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

    &REDACT_PATTERNS
}

fn build_redact_patterns() -> Vec<Regex> {
    [
        r"(?i)(authorization:\s+)[^\s]+(?:\s+[^\s]+)*",
        r"(?i)((?:^|\b)Bearer\s+)[A-Za-z0-9\-._~+/]+=*",
        r"(?i)\b([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)[^\s&]+",
        r#"(?i)("(?:apiKey|api_key|token|password)"\s*:\s*)"[^"]*""#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_authorization_header() {
        assert_eq!(redact_sensitive("Authorization: 0123abcd"), "Authorization: [REDACTED]");
    }

    #[test]
    fn redacts_query_and_json_secrets() {
        let redacted = redact_sensitive("GET /x?api_key=s3cr3t&page=1");
        assert_eq!(redacted, "GET /x?api_key=[REDACTED]&page=1");
        let json = redact_sensitive(r#"{"apiKey": "hunter2", "baseUrl": "https://x"}"#);
        assert_eq!(json, r#"{"apiKey": [REDACTED], "baseUrl": "https://x"}"#);
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive("connection PLC-A selected"), "connection PLC-A selected");
    }
}
