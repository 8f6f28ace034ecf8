mod block;
mod config;
mod error;
mod escape;
mod inline;
mod markdown_v2;
mod parser;

pub use block::{Block, Document, Inline, List, ListItem};
pub use config::{Config, ParserConfig};
pub use error::{Error, Result};
pub use escape::{escape_code, escape_link_url, escape_text};

/// Bot API `parse_mode` for text produced by [`render`].
pub const PARSE_MODE: &str = "MarkdownV2";

/// Parse markdown text into a document using the default config.
pub fn parse(markdown: &str) -> Document {
    parse_with_config(markdown, &Config::compiled_default().parser)
}

/// Parse markdown text into a document with custom parser settings.
pub fn parse_with_config(markdown: &str, config: &ParserConfig) -> Document {
    parser::parse(markdown, config)
}

/// Render a document to Telegram MarkdownV2, trimmed of surrounding whitespace.
///
/// Rendering never fails. If Telegram rejects the result, resend the
/// original text without a parse mode.
pub fn render(document: &Document) -> String {
    tracing::trace!(blocks = document.blocks.len(), "rendering document");
    markdown_v2::blocks_to_markdown_v2(&document.blocks)
}

/// Convert markdown to Telegram MarkdownV2 using default config.
pub fn markdown_to_telegram(markdown: &str) -> String {
    markdown_to_telegram_with_config(markdown, Config::compiled_default())
}

/// Convert markdown to Telegram MarkdownV2 with custom config.
pub fn markdown_to_telegram_with_config(markdown: &str, config: &Config) -> String {
    tracing::debug!(input_len = markdown.len(), "converting markdown to MarkdownV2");
    let document = parse_with_config(markdown, &config.parser);
    let rendered = render(&document);
    tracing::debug!(output_len = rendered.len(), "converted markdown");
    rendered
}
