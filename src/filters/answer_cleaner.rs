use once_cell::sync::Lazy;
use regex::Regex;

// Markdown bold markers
static BOLD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Flattens model output for a single-line JSON answer: drops `**` and turns each line break into a space.
pub fn clean_answer(text: &str) -> String {
    let without_bold = BOLD_MARKER.replace_all(text, "");
    LINE_BREAK.replace_all(&without_bold, " ").into_owned()
}
