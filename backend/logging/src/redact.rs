//! Log Redaction Layer
//!
//! Scrubs bearer tokens, API keys and JWTs, and shortens `data:` URL payloads
//! so a single log line never carries a whole image.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)|(eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+)|(sk-[a-zA-Z0-9]{32,})")
        .expect("token pattern is valid")
});
static DATA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(data:[a-z]+/[a-zA-Z0-9.+\-]+;base64,)[A-Za-z0-9+/=]{16,}")
        .expect("data url pattern is valid")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TOKEN_RE.replace_all(input, "[REDACTED_TOKEN]");
    DATA_URL_RE
        .replace_all(&redacted, "${1}[IMAGE_PAYLOAD]")
        .into_owned()
}
