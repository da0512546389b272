//! Post-processing for model output: strip markdown the model emits anyway,
//! then fit the result into the platform's character budget.

use once_cell::sync::Lazy;
use regex::Regex;

pub const ELLIPSIS: &str = "...";

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*_]{3,}[ \t]*$").unwrap());
static RE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]*)`").unwrap());
static RE_BOLD_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_ITALIC_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
// Underscore emphasis only when not glued to a word (keeps snake_case, URLs).
static RE_BOLD_UNDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])__([^_\n]+?)__($|[^\w])").unwrap());
static RE_ITALIC_UNDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\n]+?)_($|[^\w])").unwrap());
static RE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
// Gaps left inside a line by removed markers; leading indentation is kept.
static RE_INNER_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S)[ \t]{2,}").unwrap());
static RE_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn strip_pass(text: &str) -> String {
    let s = RE_FENCE.replace_all(text, "");
    let s = RE_RULE.replace_all(&s, "");
    let s = RE_HEADER.replace_all(&s, "");
    let s = RE_BULLET.replace_all(&s, "");
    let s = RE_CODE.replace_all(&s, "$1");
    let s = RE_BOLD_STAR.replace_all(&s, "$1");
    let s = RE_ITALIC_STAR.replace_all(&s, "$1");
    let s = RE_BOLD_UNDER.replace_all(&s, "${1}${2}${3}");
    let s = RE_ITALIC_UNDER.replace_all(&s, "${1}${2}${3}");
    let s = s.replace(['*', '`'], "");
    let s = RE_INNER_GAP.replace_all(&s, "$1 ");
    let s = RE_TRAILING_WS.replace_all(&s, "");
    let s = RE_BLANKS.replace_all(&s, "\n\n");
    s.trim().to_string()
}

/// Remove markdown artifacts and collapse runs of blank lines.
///
/// Every rewrite shortens the text, so iterating until nothing changes
/// terminates and makes the function idempotent.
pub fn strip_markdown(text: &str) -> String {
    let mut current = strip_pass(text);
    loop {
        let next = strip_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Cut `text` to at most `max_chars` characters, ending in `...` when cut.
/// Returns the text and whether it was truncated.
pub fn fit_to_length(text: &str, max_chars: usize) -> (String, bool) {
    let len = text.chars().count();
    if len <= max_chars {
        return (text.to_string(), false);
    }
    if max_chars < ELLIPSIS.len() {
        return (text.chars().take(max_chars).collect(), true);
    }
    let mut out: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    (out, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_header_are_removed() {
        let raw = "# Big news\n\nThis is **bold** and *italic* text.\n\n#AI #Rust";
        let out = strip_markdown(raw);
        assert_eq!(out, "Big news\n\nThis is bold and italic text.\n\n#AI #Rust");
    }

    #[test]
    fn bullets_rules_and_code() {
        let raw = "Intro\n\n- one\n* two\n+ three\n\n---\n\nUse `cargo` now.\n```rust\nfn main() {}\n```\nEnd";
        let out = strip_markdown(raw);
        assert_eq!(out, "Intro\n\none\ntwo\nthree\n\nUse cargo now.\n\nEnd");
    }

    #[test]
    fn underscore_emphasis_but_not_snake_case() {
        let out = strip_markdown("A _fresh_ look at __real__ snake_case_names.");
        assert_eq!(out, "A fresh look at real snake_case_names.");
    }

    #[test]
    fn blank_line_runs_collapse_to_one() {
        let out = strip_markdown("a\n\n\n\n\nb\n \n\t\n\nc");
        assert_eq!(out, "a\n\nb\n\nc");
    }

    #[test]
    fn nested_stars_fully_stripped() {
        assert_eq!(strip_markdown("***wow***"), "wow");
        assert_eq!(strip_markdown("2 * 3 = 6"), "2 3 = 6");
    }

    #[test]
    fn removed_markers_leave_single_spaces() {
        assert_eq!(strip_markdown("Costs fell 5 * 3 times"), "Costs fell 5 3 times");
        assert_eq!(
            strip_markdown("Ship it ** now ** or `  ` later"),
            "Ship it now or later"
        );
        let once = strip_markdown("a  *  b");
        assert_eq!(once, "a b");
        assert_eq!(strip_markdown(&once), once);
    }

    #[test]
    fn idempotent_on_sample() {
        let raw = "## Title\n**A** _b_ `c`\n\n\n\n- d\n***\n";
        let once = strip_markdown(raw);
        assert_eq!(strip_markdown(&once), once);
    }

    #[test]
    fn fit_to_length_exact_budget() {
        let text = "x".repeat(3005);
        let (out, cut) = fit_to_length(&text, 3000);
        assert!(cut);
        assert_eq!(out.chars().count(), 3000);
        assert!(out.ends_with(ELLIPSIS));

        let (same, cut) = fit_to_length("short", 3000);
        assert!(!cut);
        assert_eq!(same, "short");
    }

    #[test]
    fn fit_to_length_counts_chars_not_bytes() {
        let text = "é".repeat(20);
        let (out, cut) = fit_to_length(&text, 10);
        assert!(cut);
        assert_eq!(out.chars().count(), 10);
        assert_eq!(out, format!("{}...", "é".repeat(7)));
    }
}
