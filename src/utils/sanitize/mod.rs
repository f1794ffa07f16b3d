//! Best-effort input scrubbing for message text.
//!
//! This strips the obvious script-injection shapes before text is stored or
//! printed. It is not a security boundary: output is always treated as plain
//! text by every consumer in this crate.

use super::regex::RegexPatterns;

/// Maximum length of a message body.
pub const MAX_TEXT_CHARS: usize = 500;
/// Maximum length of an author name.
pub const MAX_AUTHOR_CHARS: usize = 50;
/// Maximum length of a category name.
pub const MAX_CATEGORY_CHARS: usize = 20;
/// Maximum length of a journal entry.
pub const MAX_JOURNAL_CHARS: usize = 1000;

/// Trim, cap at `max_chars` characters, then strip `<script>` blocks,
/// `javascript:` and `on*=` substrings.
pub fn sanitize_input(input: &str, max_chars: usize) -> String {
    let trimmed = input.trim();
    let capped: String = if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect()
    } else {
        trimmed.to_string()
    };

    let out = RegexPatterns::html_script().replace_all(&capped, "");
    let out = RegexPatterns::javascript_scheme().replace_all(&out, "");
    let out = RegexPatterns::event_handler().replace_all(&out, "");
    out.into_owned()
}
