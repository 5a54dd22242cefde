//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

/// Convert Markdown text to an HTML body fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("# Heading\n\nA **bold** paragraph.");
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<p>A <strong>bold</strong> paragraph.</p>"));
    }

    #[test]
    fn test_void_elements_are_self_closed() {
        let html = markdown_to_html("one  \ntwo\n\n---\n");
        assert!(html.contains("<br />"));
        assert!(html.contains("<hr />"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }
}
