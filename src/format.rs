//! Text-to-markup conversion for chat messages.
//!
//! Every entry point escapes the input before any substitution runs, so the only
//! markup in the output is the small tag set produced here.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_3: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid h3 pattern"));
static HEADING_2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid h2 pattern"));
static HEADING_1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid h1 pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code pattern"));
static CODE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```|;|\{|\bdef\b|\bfunction\b|\bclass\b|\bconsole.log\b")
        .expect("valid code detection pattern")
});

/// Replace the five markup-significant characters with entities.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Convert user or bot text into safe markup.
///
/// Order matters: escaping runs first, headings are matched longest prefix first,
/// and italic runs over what bold left behind.
pub fn format_message(message: &str) -> String {
    let escaped = escape_html(message);
    let formatted = HEADING_3.replace_all(&escaped, "<h3>${1}</h3>");
    let formatted = HEADING_2.replace_all(&formatted, "<h2>${1}</h2>");
    let formatted = HEADING_1.replace_all(&formatted, "<h1>${1}</h1>");
    let formatted = BOLD.replace_all(&formatted, "<strong>${1}</strong>");
    let formatted = ITALIC.replace_all(&formatted, "<em>${1}</em>");
    let formatted = INLINE_CODE.replace_all(&formatted, "<code>${1}</code>");
    formatted.replace('\n', "<br>")
}

/// Wrap raw code verbatim in a preformatted block. No markdown substitutions.
pub fn code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>", escape_html(code))
}

/// Escaped text with line breaks only; used for status and error lines.
pub fn plain_text(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Heuristic used to render pasted code as a code block instead of markdown.
pub fn is_code_like(text: &str) -> bool {
    CODE_LIKE.is_match(text)
}
