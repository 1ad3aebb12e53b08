//! Markdown to HTML.
//!
//! A thin wrapper over pulldown-cmark with the extensions blog posts lean on:
//! tables, footnotes, strikethrough and task lists. Code blocks come out as
//! escaped `<pre><code>` text; nothing in a post body is ever executed.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

const WORDS_PER_MINUTE: usize = 200;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render markdown to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Estimated reading time in whole minutes, never less than one.
///
/// Counts words of prose text only; code blocks and inline code are skipped
/// since nobody reads a listing at prose speed.
pub fn reading_minutes(markdown: &str) -> u32 {
    let mut words = 0usize;
    let mut in_code_block = false;
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) if !in_code_block => words += text.split_whitespace().count(),
            _ => {}
        }
    }
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_basic_markdown() {
        let html = to_html("# Title\n\nSome **bold** and *italic* text.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn code_blocks_are_escaped_verbatim() {
        let md = "```html\n<script>alert('x')</script>\n```\n";
        let html = to_html(md);
        assert!(html.contains("<pre><code class=\"language-html\">"));
        assert!(html.contains("&lt;script&gt;alert('x')&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn tables_enabled() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn strikethrough_enabled() {
        assert!(to_html("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn reading_time_minimum_is_one() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes("a few words"), 1);
    }

    #[test]
    fn reading_time_rounds_up() {
        let body = "word ".repeat(401);
        assert_eq!(reading_minutes(&body), 3);
    }

    #[test]
    fn reading_time_ignores_code_blocks() {
        let code = "x ".repeat(1000);
        let body = format!("Intro text.\n\n```\n{code}\n```\n");
        assert_eq!(reading_minutes(&body), 1);
    }
}
