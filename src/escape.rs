//! Escaping for the three MarkdownV2 contexts: prose, code and link URLs.

/// Characters that are markup anywhere in MarkdownV2 prose.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape plain text: every special character and every backslash gets a
/// leading backslash.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || SPECIAL_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape text inside `pre` and `code` entities. Only the backslash and the
/// backtick are significant there.
pub fn escape_code(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}

/// Escape a URL placed inside the `(...)` part of an inline link.
pub fn escape_link_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escapes_every_special_char() {
        assert_eq!(
            escape_text("_*[]()~`>#+-=|{}.!"),
            "\\_\\*\\[\\]\\(\\)\\~\\`\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!"
        );
        assert_eq!(escape_text("a\\b"), "a\\\\b");
        assert_eq!(escape_text("plain words, no marks"), "plain words, no marks");
    }

    #[test]
    fn text_keeps_unicode() {
        assert_eq!(escape_text("Привет, мир!"), "Привет, мир\\!");
    }

    #[test]
    fn code_escapes_only_backslash_and_backtick() {
        assert_eq!(escape_code("let x = a.b(c)!;"), "let x = a.b(c)!;");
        assert_eq!(escape_code("`a` \\n"), "\\`a\\` \\\\n");
    }

    #[test]
    fn link_url_escapes_paren_and_backslash() {
        assert_eq!(
            escape_link_url("https://en.wikipedia.org/wiki/Rust_(language)"),
            "https://en.wikipedia.org/wiki/Rust_(language\\)"
        );
        assert_eq!(escape_link_url("a\\b"), "a\\\\b");
        assert_eq!(escape_link_url("https://example.com/a-b.c"), "https://example.com/a-b.c");
    }

    #[test]
    fn empty_input() {
        assert_eq!(escape_text(""), "");
        assert_eq!(escape_code(""), "");
        assert_eq!(escape_link_url(""), "");
    }
}
