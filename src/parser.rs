use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag};
use regex::Regex;

use crate::block::{Block, Document, Inline, List, ListItem};
use crate::config::ParserConfig;

/// Bare URLs recognized in literal text
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://|ftp://|mailto:|www\.)[^\s<>]+").expect("valid URL pattern")
});

/// Placeholder delimiters standing in for a spoiler while pulldown-cmark
/// parses the rest of the text. Private-use characters are plain text to it.
const SPOILER_OPEN: char = '\u{E000}';
const SPOILER_CLOSE: char = '\u{E001}';

/// Parse markdown text into a document
pub fn parse(markdown: &str, config: &ParserConfig) -> Document {
    let options = options(config);
    let marked = if config.spoilers {
        mark_spoilers(markdown, options)
    } else {
        None
    };
    let (source, spoilers) = match &marked {
        Some((source, spoilers)) => (source.as_str(), spoilers.as_slice()),
        None => (markdown, &[][..]),
    };

    let parser = Parser::new_ext(source, options);
    let mut builder = TreeBuilder {
        source,
        events: parser.into_offset_iter(),
        config,
        spoilers,
        task: None,
        link_depth: 0,
    };
    Document::new(builder.blocks())
}

fn options(config: &ParserConfig) -> Options {
    let mut options = Options::empty();
    if config.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if config.task_lists {
        options.insert(Options::ENABLE_TASKLISTS);
    }
    if config.strikethrough {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if config.definition_lists {
        options.insert(Options::ENABLE_DEFINITION_LIST);
    }
    if config.alerts {
        options.insert(Options::ENABLE_GFM);
    }
    options
}

/// Builds the block tree by recursive descent over the event stream.
/// Every `Start` is consumed together with its matching `End`.
struct TreeBuilder<'a, 'c, I> {
    source: &'a str,
    events: I,
    config: &'c ParserConfig,
    // Raw spoiler contents, indexed by their placeholder tokens
    spoilers: &'a [String],
    // Checkbox state of the innermost open list item
    task: Option<bool>,
    link_depth: usize,
}

impl<'a, I> TreeBuilder<'a, '_, I>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    /// Blocks up to the end of the enclosing container. Inline content that
    /// appears directly in the container (tight list items, definition
    /// bodies) is gathered into paragraphs.
    fn blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut loose = Vec::new();

        while let Some((event, range)) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) if !is_inline_tag(&tag) => {
                    self.flush_paragraph(&mut loose, &mut blocks);
                    let block = self.block(tag);
                    blocks.push(block);
                }
                Event::Rule => {
                    self.flush_paragraph(&mut loose, &mut blocks);
                    blocks.push(Block::ThematicBreak);
                }
                event => self.inline_event(event, range, &mut loose),
            }
        }

        self.flush_paragraph(&mut loose, &mut blocks);
        blocks
    }

    fn flush_paragraph(&mut self, loose: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
        if loose.is_empty() {
            return;
        }
        let inlines = self.finish_inlines(std::mem::take(loose));
        blocks.push(Block::Paragraph { inlines });
    }

    fn block(&mut self, tag: Tag<'a>) -> Block {
        match tag {
            Tag::Paragraph | Tag::DefinitionListTitle => Block::Paragraph {
                inlines: self.inlines(),
            },
            Tag::Heading { level, .. } => Block::Heading {
                level: heading_level_to_u8(level),
                inlines: self.inlines(),
            },
            // Alerts are quotes with a kind; the kind marker is already stripped
            Tag::BlockQuote(_) => Block::Quote {
                blocks: self.blocks(),
            },
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => Some(info.into_string()),
                    _ => None,
                };
                let content = self.raw_text();
                Block::CodeBlock {
                    info,
                    lines: content.lines().map(str::to_string).collect(),
                }
            }
            Tag::HtmlBlock => Block::HtmlBlock {
                raw: self.raw_text().trim_end_matches(['\r', '\n']).to_string(),
            },
            Tag::List(first_number) => Block::List(List {
                ordered: first_number.is_some(),
                items: self.items(),
            }),
            Tag::Table(_) => Block::Table { rows: self.rows() },
            _ => Block::Container {
                blocks: self.blocks(),
            },
        }
    }

    fn items(&mut self) -> Vec<ListItem> {
        let mut items = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(self.item()),
                Event::End(_) => break,
                _ => {}
            }
        }
        items
    }

    fn item(&mut self) -> ListItem {
        let outer = self.task.take();
        let blocks = self.blocks();
        let task = std::mem::replace(&mut self.task, outer);

        let Some(checked) = task else {
            return ListItem {
                blocks,
                ..ListItem::default()
            };
        };

        // Only the literal run right after the checkbox is kept as task text
        let task_text = match blocks.first() {
            Some(Block::Paragraph { inlines }) => match inlines.first() {
                Some(Inline::Literal(text)) => text.trim_start().to_string(),
                _ => String::new(),
            },
            _ => String::new(),
        };

        ListItem {
            is_task: true,
            task_checked: checked,
            task_text,
            blocks,
        }
    }

    /// Header and body rows alike, one `Vec` of cells per row
    fn rows(&mut self) -> Vec<Vec<Vec<Block>>> {
        let mut rows = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::TableHead | Tag::TableRow) => rows.push(self.cells()),
                Event::End(_) => break,
                _ => {}
            }
        }
        rows
    }

    fn cells(&mut self) -> Vec<Vec<Block>> {
        let mut cells = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::TableCell) => {
                    let inlines = self.inlines();
                    cells.push(vec![Block::Paragraph { inlines }]);
                }
                Event::End(_) => break,
                _ => {}
            }
        }
        cells
    }

    /// Text and raw HTML up to the end of the current element
    fn raw_text(&mut self) -> String {
        let mut content = String::new();
        for (event, _) in self.events.by_ref() {
            match event {
                Event::Text(text) | Event::Html(text) => content.push_str(&text),
                Event::End(_) => break,
                _ => {}
            }
        }
        content
    }

    fn inlines(&mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while let Some((event, range)) = self.events.next() {
            match event {
                Event::End(_) => break,
                event => self.inline_event(event, range, &mut inlines),
            }
        }
        self.finish_inlines(inlines)
    }

    fn inline_event(&mut self, event: Event<'a>, range: Range<usize>, out: &mut Vec<Inline>) {
        match event {
            Event::Text(text) => push_text(out, &text),
            Event::Code(code) => out.push(Inline::CodeSpan(code.into_string())),
            Event::SoftBreak | Event::HardBreak => out.push(Inline::LineBreak),
            Event::InlineHtml(html) | Event::Html(html) => {
                out.push(Inline::HtmlInline(html_tag_name(&html)));
            }
            Event::TaskListMarker(checked) => self.task = Some(checked),
            Event::Start(tag) => {
                let inline = self.inline_tag(tag, range);
                out.push(inline);
            }
            _ => {}
        }
    }

    fn inline_tag(&mut self, tag: Tag<'a>, range: Range<usize>) -> Inline {
        match tag {
            Tag::Emphasis => Inline::Emphasis {
                delimiter_char: self.delimiter_at(&range),
                delimiter_count: 1,
                children: self.inlines(),
            },
            Tag::Strong => Inline::Emphasis {
                delimiter_char: self.delimiter_at(&range),
                delimiter_count: 2,
                children: self.inlines(),
            },
            Tag::Strikethrough => Inline::Emphasis {
                delimiter_char: '~',
                delimiter_count: self.delimiter_run(&range, '~'),
                children: self.inlines(),
            },
            Tag::Link {
                link_type: LinkType::Autolink | LinkType::Email,
                dest_url,
                ..
            } => {
                // The label repeats the URL; only the URL is kept
                self.link_children();
                Inline::Autolink(dest_url.into_string())
            }
            Tag::Link { dest_url, .. } => Inline::Link {
                url: dest_url.into_string(),
                is_image: false,
                children: self.link_children(),
            },
            Tag::Image { dest_url, .. } => Inline::Link {
                url: dest_url.into_string(),
                is_image: true,
                children: self.link_children(),
            },
            _ => Inline::Container(self.inlines()),
        }
    }

    fn link_children(&mut self) -> Vec<Inline> {
        self.link_depth += 1;
        let children = self.inlines();
        self.link_depth -= 1;
        children
    }

    /// Delimiter character at the start of an emphasis range
    fn delimiter_at(&self, range: &Range<usize>) -> char {
        self.source
            .get(range.start..)
            .and_then(|s| s.chars().next())
            .unwrap_or('*')
    }

    fn delimiter_run(&self, range: &Range<usize>, delimiter: char) -> usize {
        self.source
            .get(range.clone())
            .map(|s| s.chars().take_while(|&c| c == delimiter).count())
            .unwrap_or(0)
    }

    /// Swap placeholder tokens in a literal run back for spoilers
    fn restore_spoilers(&self, text: &str) -> Vec<Inline> {
        let mut pieces = Vec::new();
        let mut rest = text;

        while let Some(open) = rest.find(SPOILER_OPEN) {
            let after_open = &rest[open + SPOILER_OPEN.len_utf8()..];
            let Some(close) = after_open.find(SPOILER_CLOSE) else {
                break;
            };
            let Some(content) = after_open[..close]
                .parse::<usize>()
                .ok()
                .and_then(|index| self.spoilers.get(index))
            else {
                break;
            };
            push_text(&mut pieces, &rest[..open]);
            pieces.push(Inline::Spoiler(content.clone()));
            rest = &after_open[close + SPOILER_CLOSE.len_utf8()..];
        }

        push_text(&mut pieces, rest);
        pieces.retain(|piece| !matches!(piece, Inline::Literal(text) if text.is_empty()));
        pieces
    }

    /// Split literal runs into spoilers and bare-URL links
    fn finish_inlines(&self, inlines: Vec<Inline>) -> Vec<Inline> {
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines {
            let Inline::Literal(text) = inline else {
                out.push(inline);
                continue;
            };
            let pieces = if self.spoilers.is_empty() {
                vec![Inline::Literal(text)]
            } else {
                self.restore_spoilers(&text)
            };
            for piece in pieces {
                match piece {
                    Inline::Literal(text) if self.config.autolinks && self.link_depth == 0 => {
                        out.extend(linkify(&text));
                    }
                    piece => out.push(piece),
                }
            }
        }
        out
    }
}

fn is_inline_tag(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

/// Append text, merging with a preceding literal. pulldown-cmark splits text
/// around escapes and unmatched delimiters.
fn push_text(out: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Literal(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Inline::Literal(text.to_string()));
    }
}

/// Tag name of a raw inline HTML tag, `/`-prefixed when closing
fn html_tag_name(html: &str) -> String {
    let rest = html.trim().trim_start_matches('<');
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if closing { format!("/{name}") } else { name }
}

/// Replace `||content||` spans with placeholder tokens before inline
/// parsing, so the content stays raw text whatever markup it holds.
///
/// Delimiters inside code, HTML and links, or escaped with a backslash, are
/// not spoiler delimiters. A spoiler stays on one line and its content may
/// not start or end with whitespace. Returns `None` when the text has no
/// candidate spans.
fn mark_spoilers(markdown: &str, options: Options) -> Option<(String, Vec<String>)> {
    if !markdown.contains("||") || markdown.contains([SPOILER_OPEN, SPOILER_CLOSE]) {
        return None;
    }

    let protected: Vec<Range<usize>> = Parser::new_ext(markdown, options)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Html(_) | Event::InlineHtml(_) => Some(range),
            Event::Start(
                Tag::CodeBlock(_) | Tag::HtmlBlock | Tag::Link { .. } | Tag::Image { .. },
            ) => Some(range),
            _ => None,
        })
        .collect();
    let is_delimiter = |pos: usize| {
        !is_escaped(markdown, pos)
            && !protected
                .iter()
                .any(|range| range.contains(&pos) || range.contains(&(pos + 1)))
    };

    let mut marked = String::with_capacity(markdown.len());
    let mut spoilers = Vec::new();
    let mut last = 0;
    let mut search = 0;

    while let Some(found) = markdown[search..].find("||") {
        let open = search + found;
        search = open + 1;
        if !is_delimiter(open) {
            continue;
        }

        let line_end = markdown[open..]
            .find('\n')
            .map_or(markdown.len(), |i| open + i);
        let mut pos = open + 2;
        let mut close = None;
        while let Some(found) = markdown[pos..line_end].find("||") {
            if is_delimiter(pos + found) {
                close = Some(pos + found);
                break;
            }
            pos += found + 1;
        }
        let Some(close) = close else {
            continue;
        };

        let content = &markdown[open + 2..close];
        if content.is_empty()
            || content.starts_with(char::is_whitespace)
            || content.ends_with(char::is_whitespace)
        {
            continue;
        }

        marked.push_str(&markdown[last..open]);
        marked.push(SPOILER_OPEN);
        marked.push_str(&spoilers.len().to_string());
        marked.push(SPOILER_CLOSE);
        spoilers.push(content.to_string());
        last = close + 2;
        search = last;
    }

    if spoilers.is_empty() {
        return None;
    }
    marked.push_str(&markdown[last..]);
    Some((marked, spoilers))
}

/// Whether the character at `pos` follows an odd run of backslashes
fn is_escaped(text: &str, pos: usize) -> bool {
    text[..pos].bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Turn bare URLs in a literal run into links labelled with the URL text
fn linkify(text: &str) -> Vec<Inline> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for found in BARE_URL.find_iter(text) {
        let preceded_ok = text[..found.start()]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '(' | '"' | '\''));
        if !preceded_ok {
            continue;
        }

        let candidate = trim_url(found.as_str());
        let has_host = candidate
            .split_once("//")
            .map_or(candidate.len() > 4, |(_, host)| !host.is_empty());
        if !has_host || (!candidate.contains('.') && !candidate.starts_with("mailto:")) {
            continue;
        }

        push_text(&mut pieces, &text[last..found.start()]);
        let url = if candidate.to_ascii_lowercase().starts_with("www.") {
            format!("http://{candidate}")
        } else {
            candidate.to_string()
        };
        pieces.push(Inline::Link {
            url,
            is_image: false,
            children: vec![Inline::Literal(candidate.to_string())],
        });
        last = found.start() + candidate.len();
    }

    push_text(&mut pieces, &text[last..]);
    pieces.retain(|piece| !matches!(piece, Inline::Literal(text) if text.is_empty()));
    pieces
}

/// Drop trailing sentence punctuation and unbalanced closing parens
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '"', '\'']);
        let trimmed = if trimmed.ends_with(')')
            && trimmed.matches(')').count() > trimmed.matches('(').count()
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
