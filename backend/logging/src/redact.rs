//! Log Redaction
//!
//! Scrubs access tokens and API keys from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(access_token|token|key)=[^&\s]+").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static VK_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"vk1\.a\.[A-Za-z0-9_\-]{16,}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TOKEN_PARAM_RE.replace_all(input, "$1=[REDACTED]");
    let redacted = BEARER_RE.replace_all(&redacted, "Bearer [REDACTED_TOKEN]");
    VK_TOKEN_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}
