//! Input sanitization and XSS pattern detection.
//!
//! Defense in depth for content submission paths. This is pattern matching,
//! not an HTML sanitizer: it removes the obvious vectors and flags content
//! that looks like an injection attempt.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// `javascript:` scheme, tolerating whitespace before the colon.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static JAVASCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex literal"));

/// Inline event-handler attributes such as `onclick=` or `onerror =`.
#[allow(clippy::expect_used)]
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid regex literal"));

/// Patterns any one of which marks content as an XSS attempt.
#[allow(clippy::expect_used)]
static XSS_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<\s*script\b",
        r"(?i)<\s*iframe\b",
        r"(?i)<\s*object\b",
        r"(?i)<\s*embed\b",
        r"(?i)javascript\s*:",
        r"(?i)\bon\w+\s*=",
    ])
    .expect("valid regex literals")
});

/// Strip angle brackets, `javascript:` prefixes and inline event handlers,
/// then trim surrounding whitespace.
///
/// Removal repeats until nothing matches, so nested input such as
/// `javajavascript:script:` cannot reassemble a scheme.
pub fn sanitize_input(text: &str) -> String {
    let mut current: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();
    loop {
        let without_scheme = JAVASCRIPT_SCHEME.replace_all(&current, "");
        let next = EVENT_HANDLER.replace_all(&without_scheme, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// True if `content` matches any known XSS pattern.
pub fn detect_xss(content: &str) -> bool {
    XSS_PATTERNS.is_match(content)
}
