//! Fixed style contract + per-run user prompt.

use crate::ingest::types::NewsItem;

pub const SYSTEM_PROMPT: &str = "\
You write LinkedIn posts about technology and AI for an audience of software engineers, \
tech leads and AI practitioners.

Voice:
- Professional and conversational; no corporate jargon or buzzword salad.
- Add a point of view: connect the stories instead of just summarizing them.
- Short paragraphs separated by a blank line so the post reads well on mobile.

Rules:
- Output exactly one post and nothing else: no preamble, no sign-off.
- 150 to 300 words, never more than 3000 characters.
- Choose only the 2 or 3 most interesting or most closely connected stories from the list.
- Open with a strong hook. Never start with \"I\" or \"Today\".
- End with a thought-provoking question that invites comments.
- Finish with 3 to 5 relevant hashtags on the last line (for example #AI #SoftwareEngineering).
- Plain text only. Absolutely no markdown: no asterisks, no underscores for emphasis, \
no hyphen or asterisk bullets, no # headings (the # sign is only allowed in the final hashtags), \
no horizontal rules, no backticks or code blocks.
- Do not include URLs.
- Use only facts present in the provided summaries. Never invent numbers, quotes or events.";

/// `"{n}. [{source}] {title}"` per item, summary indented on the next line.
pub fn format_items(items: &[NewsItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mut block = format!("{}. [{}] {}", i + 1, item.source, item.title);
            if !item.summary.is_empty() {
                block.push_str("\n   ");
                block.push_str(&item.summary);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_prompt(items: &[NewsItem]) -> String {
    format!(
        "Here are today's top tech and AI news items. Write a LinkedIn post based on the most interesting 2-3 stories:\n\n{}\n\nWrite a single engaging LinkedIn post now.",
        format_items(items)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(source: &str, title: &str, summary: &str) -> NewsItem {
        NewsItem {
            source: source.into(),
            title: title.into(),
            summary: summary.into(),
            link: String::new(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn items_are_numbered_with_optional_summary() {
        let items = vec![
            item("TechCrunch", "Chips get faster", "A new node ships."),
            item("AI News", "Model released", ""),
        ];
        let out = format_items(&items);
        assert_eq!(
            out,
            "1. [TechCrunch] Chips get faster\n   A new node ships.\n\n2. [AI News] Model released"
        );
    }

    #[test]
    fn user_prompt_wraps_items() {
        let p = build_user_prompt(&[item("S", "T", "")]);
        assert!(p.contains("1. [S] T"));
        assert!(p.ends_with("Write a single engaging LinkedIn post now."));
    }
}
