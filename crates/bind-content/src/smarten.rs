//! Typographic punctuation for rendered HTML: curly quotes, em dashes and
//! ellipses. The inverse of converting them back to ASCII.

/// Elements whose text is copied verbatim.
const VERBATIM_ELEMENTS: &[&str] = &["pre", "code", "kbd", "script", "style", "math"];

const LEFT_DOUBLE: char = '\u{201c}';
const RIGHT_DOUBLE: char = '\u{201d}';
const LEFT_SINGLE: char = '\u{2018}';
const RIGHT_SINGLE: char = '\u{2019}';
const EM_DASH: char = '\u{2014}';
const ELLIPSIS: char = '\u{2026}';

/// Apply smart punctuation to the text of an HTML fragment.
///
/// Tags, comments and the contents of [`VERBATIM_ELEMENTS`] are left alone.
/// Quote direction is decided by the character before the quote, carried
/// across tag boundaries.
pub fn smarten(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut verbatim_depth = 0usize;
    let mut prev: Option<char> = None;
    let mut rest = html;

    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            let tag = &rest[..end];
            if let Some((name, closing, self_closing)) = tag_info(tag) {
                if VERBATIM_ELEMENTS.contains(&name.as_str()) && !self_closing {
                    if closing {
                        verbatim_depth = verbatim_depth.saturating_sub(1);
                    } else {
                        verbatim_depth += 1;
                    }
                }
            }
            out.push_str(tag);
            rest = &rest[end..];
            continue;
        }

        let end = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..end];
        if verbatim_depth > 0 {
            out.push_str(text);
            if let Some(last) = text.chars().last() {
                prev = Some(last);
            }
        } else {
            smarten_text(text, &mut prev, &mut out);
        }
        rest = &rest[end..];
    }

    out
}

/// `(lower-case name, is closing tag, is self-closing)` for a tag.
fn tag_info(tag: &str) -> Option<(String, bool, bool)> {
    let inner = tag.strip_prefix('<')?.trim_end_matches('>');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), closing, inner.ends_with('/')))
}

fn smarten_text(text: &str, prev: &mut Option<char>, out: &mut String) {
    let text = text
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'");
    let chars: Vec<char> = text.chars().collect();
    let at = |i: usize| chars.get(i).copied();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let (emitted, consumed) = match c {
            '`' if at(i + 1) == Some('`') => (LEFT_DOUBLE, 2),
            '\'' if at(i + 1) == Some('\'') => (RIGHT_DOUBLE, 2),
            '-' if at(i + 1) == Some('-') => {
                if at(i + 2) == Some('-') {
                    (EM_DASH, 3)
                } else {
                    (EM_DASH, 2)
                }
            }
            '.' if at(i + 1) == Some('.') && at(i + 2) == Some('.') => (ELLIPSIS, 3),
            '.' if at(i + 1) == Some(' ')
                && at(i + 2) == Some('.')
                && at(i + 3) == Some(' ')
                && at(i + 4) == Some('.') =>
            {
                (ELLIPSIS, 5)
            }
            '"' => {
                if opens_quote(*prev) {
                    (LEFT_DOUBLE, 1)
                } else {
                    (RIGHT_DOUBLE, 1)
                }
            }
            '\'' => {
                let decade = at(i + 1).is_some_and(|c| c.is_ascii_digit())
                    && at(i + 2).is_some_and(|c| c.is_ascii_digit())
                    && at(i + 3) == Some('s');
                if !decade && opens_quote(*prev) {
                    (LEFT_SINGLE, 1)
                } else {
                    (RIGHT_SINGLE, 1)
                }
            }
            other => (other, 1),
        };
        out.push(emitted);
        *prev = Some(emitted);
        i += consumed;
    }
}

fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => {
            c.is_whitespace()
                || matches!(c, '(' | '[' | '{' | '-' | EM_DASH | LEFT_DOUBLE | LEFT_SINGLE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_and_apostrophes() {
        let html = "<p>\"Hello,\" she said. 'Hi,' I said. It's fine.</p>";
        assert_eq!(
            smarten(html),
            "<p>\u{201c}Hello,\u{201d} she said. \u{2018}Hi,\u{2019} I said. It\u{2019}s fine.</p>"
        );
    }

    #[test]
    fn test_dashes_and_ellipsis() {
        assert_eq!(
            smarten("<p>wait -- no --- stop... now. . .</p>"),
            "<p>wait \u{2014} no \u{2014} stop\u{2026} now\u{2026}</p>"
        );
    }

    #[test]
    fn test_decade_abbreviation() {
        assert_eq!(smarten("<p>the '80s</p>"), "<p>the \u{2019}80s</p>");
    }

    #[test]
    fn test_backtick_quotes() {
        assert_eq!(
            smarten("<p>``quoted''</p>"),
            "<p>\u{201c}quoted\u{201d}</p>"
        );
    }

    #[test]
    fn test_escaped_quote_entities() {
        assert_eq!(
            smarten("<p>&quot;x&quot; and &#39;y&#39;</p>"),
            "<p>\u{201c}x\u{201d} and \u{2018}y\u{2019}</p>"
        );
    }

    #[test]
    fn test_markup_and_code_untouched() {
        let html = "<p class=\"a--b\">Use <code>\"raw\" -- ...</code> and \"smart\"</p>\n<pre><code>x = 'a'\n</code></pre>";
        let expected = "<p class=\"a--b\">Use <code>\"raw\" -- ...</code> and \u{201c}smart\u{201d}</p>\n<pre><code>x = 'a'\n</code></pre>";
        assert_eq!(smarten(html), expected);
    }

    #[test]
    fn test_quotes_across_inline_tags() {
        assert_eq!(
            smarten("<p>\"<em>Really</em>\"</p>"),
            "<p>\u{201c}<em>Really</em>\u{201d}</p>"
        );
    }

    #[test]
    fn test_comments_untouched() {
        assert_eq!(smarten("<!-- \"x\" -- -->"), "<!-- \"x\" -- -->");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let html = "<p>Nothing to change here</p>";
        assert_eq!(smarten(html), html);
    }
}
