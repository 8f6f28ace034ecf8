use crate::block::Inline;
use crate::escape::{escape_code, escape_link_url, escape_text};

/// Italic marker. The zero-width spaces keep `_` from merging with an
/// adjacent `__` underline run.
pub const ITALIC: &str = "\u{200B}_\u{200B}";
pub const BOLD: &str = "*";
pub const UNDERLINE: &str = "__";
pub const STRIKETHROUGH: &str = "~";
pub const CODE: &str = "`";

/// Label used for images without alt text
const IMAGE_LABEL: &str = "Image";

pub fn inlines_to_markdown_v2(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline_to_markdown_v2(inline, out);
    }
}

pub fn inline_to_markdown_v2(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Literal(text) => out.push_str(&escape_text(text)),
        Inline::Emphasis {
            delimiter_char,
            delimiter_count,
            children,
        } => match emphasis_marker(*delimiter_char, *delimiter_count) {
            Some(marker) => {
                out.push_str(marker);
                inlines_to_markdown_v2(children, out);
                out.push_str(marker);
            }
            None => inlines_to_markdown_v2(children, out),
        },
        Inline::Link {
            url,
            is_image,
            children,
        } => {
            out.push('[');
            inlines_to_markdown_v2(children, out);
            if *is_image && children.is_empty() {
                out.push_str(IMAGE_LABEL);
            }
            out.push_str("](");
            out.push_str(&escape_link_url(url));
            out.push(')');
        }
        Inline::CodeSpan(content) => {
            out.push('`');
            out.push_str(&escape_code(content));
            out.push('`');
        }
        Inline::LineBreak => out.push('\n'),
        Inline::HtmlInline(tag) => {
            if let Some(marker) = html_tag_marker(tag) {
                out.push_str(marker);
            }
        }
        Inline::Autolink(url) => {
            out.push('[');
            out.push_str(&escape_text(url));
            out.push_str("](");
            out.push_str(&escape_link_url(url));
            out.push(')');
        }
        Inline::Spoiler(content) => {
            out.push_str("||");
            out.push_str(&escape_text(content));
            out.push_str("||");
        }
        Inline::Container(children) => inlines_to_markdown_v2(children, out),
    }
}

/// Map a delimiter run to its MarkdownV2 marker
fn emphasis_marker(delimiter_char: char, delimiter_count: usize) -> Option<&'static str> {
    match (delimiter_char, delimiter_count) {
        ('_', 2) => Some(UNDERLINE),
        ('*', 2) => Some(BOLD),
        ('_' | '*', 1) => Some(ITALIC),
        ('~', _) => Some(STRIKETHROUGH),
        _ => None,
    }
}

/// Map an inline HTML tag name (opening or closing) to its marker
pub fn html_tag_marker(tag: &str) -> Option<&'static str> {
    let name = tag.strip_prefix('/').unwrap_or(tag).to_ascii_lowercase();
    match name.as_str() {
        "b" | "strong" => Some(BOLD),
        "i" | "em" => Some(ITALIC),
        "u" => Some(UNDERLINE),
        "s" | "strike" => Some(STRIKETHROUGH),
        "code" => Some(CODE),
        _ => None,
    }
}

/// Unescaped text of an inline, as used for table cells.
///
/// Only literals, code spans, and the children of emphasis and links
/// contribute; breaks, HTML, autolinks and spoilers are dropped.
pub fn plain_text(inline: &Inline) -> String {
    match inline {
        Inline::Literal(text) => text.clone(),
        Inline::Emphasis { children, .. } | Inline::Link { children, .. } => {
            children.iter().map(plain_text).collect()
        }
        Inline::CodeSpan(content) => content.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(inline: Inline) -> String {
        let mut out = String::new();
        inline_to_markdown_v2(&inline, &mut out);
        out
    }

    fn emphasis(delimiter_char: char, delimiter_count: usize, text: &str) -> Inline {
        Inline::Emphasis {
            delimiter_char,
            delimiter_count,
            children: vec![Inline::text(text)],
        }
    }

    #[test]
    fn emphasis_markers() {
        assert_eq!(render(emphasis('*', 2, "b")), "*b*");
        assert_eq!(render(emphasis('_', 2, "u")), "__u__");
        assert_eq!(render(emphasis('*', 1, "i")), "\u{200B}_\u{200B}i\u{200B}_\u{200B}");
        assert_eq!(render(emphasis('_', 1, "i")), "\u{200B}_\u{200B}i\u{200B}_\u{200B}");
        assert_eq!(render(emphasis('~', 2, "s")), "~s~");
        assert_eq!(render(emphasis('~', 1, "s")), "~s~");
    }

    #[test]
    fn unknown_delimiter_renders_children_only() {
        assert_eq!(render(emphasis('*', 3, "x.y")), "x\\.y");
        assert_eq!(render(emphasis('=', 2, "mark")), "mark");
    }

    #[test]
    fn nested_emphasis_escapes_literals() {
        let inline = Inline::Emphasis {
            delimiter_char: '*',
            delimiter_count: 2,
            children: vec![Inline::text("a "), emphasis('~', 2, "1+1=2")],
        };
        assert_eq!(render(inline), "*a ~1\\+1\\=2~*");
    }

    #[test]
    fn link_escapes_url_but_not_dots() {
        let inline = Inline::Link {
            url: "https://example.com/a_(b)".to_string(),
            is_image: false,
            children: vec![Inline::text("see.this")],
        };
        assert_eq!(render(inline), "[see\\.this](https://example.com/a_(b\\))");
    }

    #[test]
    fn image_without_alt_uses_default_label() {
        let inline = Inline::Link {
            url: "https://example.com/cat.png".to_string(),
            is_image: true,
            children: vec![],
        };
        assert_eq!(render(inline), "[Image](https://example.com/cat.png)");
    }

    #[test]
    fn image_with_alt_uses_alt() {
        let inline = Inline::Link {
            url: "cat.png".to_string(),
            is_image: true,
            children: vec![Inline::text("a cat")],
        };
        assert_eq!(render(inline), "[a cat](cat.png)");
    }

    #[test]
    fn code_span_uses_code_escaping() {
        assert_eq!(
            render(Inline::CodeSpan("a.b(`c`)\\".to_string())),
            "`a.b(\\`c\\`)\\\\`"
        );
    }

    #[test]
    fn html_tags_map_case_insensitively() {
        assert_eq!(render(Inline::HtmlInline("B".to_string())), "*");
        assert_eq!(render(Inline::HtmlInline("/strong".to_string())), "*");
        assert_eq!(render(Inline::HtmlInline("em".to_string())), ITALIC);
        assert_eq!(render(Inline::HtmlInline("/U".to_string())), "__");
        assert_eq!(render(Inline::HtmlInline("strike".to_string())), "~");
        assert_eq!(render(Inline::HtmlInline("/code".to_string())), "`");
        assert_eq!(render(Inline::HtmlInline("span".to_string())), "");
    }

    #[test]
    fn autolink_escapes_label_and_url_separately() {
        assert_eq!(
            render(Inline::Autolink("https://a.b/c".to_string())),
            "[https://a\\.b/c](https://a.b/c)"
        );
    }

    #[test]
    fn spoiler_and_line_break() {
        assert_eq!(render(Inline::Spoiler("top-secret".to_string())), "||top\\-secret||");
        assert_eq!(render(Inline::LineBreak), "\n");
    }

    #[test]
    fn container_renders_children() {
        let inline =
            Inline::Container(vec![Inline::text("a."), Inline::LineBreak, Inline::text("b")]);
        assert_eq!(render(inline), "a\\.\nb");
    }

    #[test]
    fn plain_text_is_narrow() {
        let link = Inline::Link {
            url: "u".to_string(),
            is_image: false,
            children: vec![emphasis('*', 2, "bold"), Inline::CodeSpan("x.y".to_string())],
        };
        assert_eq!(plain_text(&link), "boldx.y");
        assert_eq!(plain_text(&Inline::Spoiler("s".to_string())), "");
        assert_eq!(plain_text(&Inline::Autolink("http://a".to_string())), "");
        assert_eq!(plain_text(&Inline::LineBreak), "");
        assert_eq!(plain_text(&Inline::HtmlInline("b".to_string())), "");
    }
}
