use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex patterns that are reused across the codebase
pub struct RegexPatterns;

impl RegexPatterns {
    /// Regex for matching `<script>` blocks, including their content
    pub fn html_script() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)<script\b[\s\S]*?</script>")
                .expect("Failed to compile HTML script regex")
        });
        &RE
    }

    /// Regex for matching the `javascript:` URL scheme
    pub fn javascript_scheme() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)javascript:").expect("Failed to compile javascript scheme regex")
        });
        &RE
    }

    /// Regex for matching inline event handler attributes (`onclick=`, `onload =`)
    pub fn event_handler() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)on\w+\s*=").expect("Failed to compile event handler regex")
        });
        &RE
    }

    /// Regex for matching a `YYYY-MM-DD` date key
    pub fn date_key() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile date key regex")
        });
        &RE
    }
}
