use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, List};
use crate::escape::{escape_code, escape_text};
use crate::inline::{
    BOLD, CODE, ITALIC, STRIKETHROUGH, UNDERLINE, inlines_to_markdown_v2, plain_text,
};

/// Formatting tag pairs understood in HTML blocks. Group names select the marker.
static FORMAT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<b>(?P<b>.*?)</b>|<i>(?P<i>.*?)</i>|<u>(?P<u>.*?)</u>|<s>(?P<s>.*?)</s>|<code>(?P<code>.*?)</code>",
    )
    .expect("valid format tag pattern")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

const FORMAT_MARKERS: &[(&str, &str)] = &[
    ("b", BOLD),
    ("i", ITALIC),
    ("u", UNDERLINE),
    ("s", STRIKETHROUGH),
    ("code", CODE),
];

/// Convert blocks to Telegram MarkdownV2
pub fn blocks_to_markdown_v2(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        emit_block(block, &mut out);
    }
    out.trim().to_string()
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        // No headings in MarkdownV2; bold stands in
        Block::Heading { inlines, .. } => {
            out.push('*');
            inlines_to_markdown_v2(inlines, out);
            out.push_str("*\n\n");
        }
        Block::Paragraph { inlines } => {
            inlines_to_markdown_v2(inlines, out);
            out.push_str("\n\n");
        }
        Block::List(list) => {
            list_to_markdown_v2(list, "", out);
            out.push('\n');
        }
        Block::Quote { blocks } => {
            for child in blocks {
                let mut quoted = String::new();
                emit_block(child, &mut quoted);
                for line in quoted.split(['\r', '\n']).filter(|line| !line.is_empty()) {
                    out.push('>');
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        Block::CodeBlock { info, lines } => {
            out.push_str("```");
            if let Some(info) = info {
                out.push_str(&escape_code(info));
            }
            out.push('\n');
            for line in lines {
                out.push_str(&escape_code(line));
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        Block::Table { rows } => table_to_markdown_v2(rows, out),
        Block::ThematicBreak => out.push_str("\n\\-\\-\\-\n\n"),
        Block::HtmlBlock { raw } => {
            html_to_markdown_v2(raw, out);
            out.push_str("\n\n");
        }
        Block::Container { blocks } => {
            for child in blocks {
                emit_block(child, out);
            }
        }
    }
}

/// Emit one line per item. Nested lists go through a fresh buffer with the
/// indent grown by two spaces.
fn list_to_markdown_v2(list: &List, indent: &str, out: &mut String) {
    for (index, item) in (1..).zip(&list.items) {
        out.push_str(indent);

        if list.ordered {
            out.push_str(&format!("{index}\\. "));
        } else if item.is_task {
            out.push_str("\\- ");
            out.push_str(if item.task_checked { "\\[x\\] " } else { "\\[ \\] " });
            out.push_str(&escape_text(&item.task_text));
            out.push('\n');
            continue;
        } else {
            out.push_str("• ");
        }

        for block in &item.blocks {
            match block {
                Block::Paragraph { inlines } => inlines_to_markdown_v2(inlines, out),
                Block::List(nested) => {
                    out.push('\n');
                    let mut nested_out = String::new();
                    list_to_markdown_v2(nested, &format!("{indent}  "), &mut nested_out);
                    out.push_str(nested_out.trim_end());
                }
                other => emit_block(other, out),
            }
        }
        out.push('\n');
    }
}

/// Tables become a monospace block with ` | `-joined cells
fn table_to_markdown_v2(rows: &[Vec<Vec<Block>>], out: &mut String) {
    out.push_str("```\n");

    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| cell_text(cell)).collect();
        out.push_str(&escape_code(&cells.join(" | ")));
        out.push('\n');
    }

    out.push_str("```\n\n");
}

fn cell_text(cell: &[Block]) -> String {
    cell.iter()
        .filter_map(|block| match block {
            Block::Paragraph { inlines } => {
                Some(inlines.iter().map(plain_text).collect::<String>())
            }
            _ => None,
        })
        .collect()
}

/// Best-effort HTML: known formatting pairs become markers, every other tag
/// is dropped and the remaining text is escaped.
fn html_to_markdown_v2(html: &str, out: &mut String) {
    let mut last = 0;

    for caps in FORMAT_TAG.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_stripped(&html[last..whole.start()], out);

        for (name, marker) in FORMAT_MARKERS {
            let Some(inner) = caps.name(name) else {
                continue;
            };
            out.push_str(marker);
            if *name == "code" {
                out.push_str(&escape_code(&ANY_TAG.replace_all(inner.as_str(), "")));
            } else {
                html_to_markdown_v2(inner.as_str(), out);
            }
            out.push_str(marker);
            break;
        }

        last = whole.end();
    }

    push_stripped(&html[last..], out);
}

fn push_stripped(html: &str, out: &mut String) {
    out.push_str(&escape_text(&ANY_TAG.replace_all(html, "")));
}
