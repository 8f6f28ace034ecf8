/// Inline content within a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Literal(String),
    /// Emphasis classified by the delimiter run that produced it (`**`, `_`, `~~`, ...)
    Emphasis {
        delimiter_char: char,
        delimiter_count: usize,
        children: Vec<Inline>,
    },
    Link {
        url: String,
        is_image: bool,
        children: Vec<Inline>,
    },
    CodeSpan(String),
    LineBreak,
    /// Raw inline HTML tag name, with a leading `/` for closing tags
    HtmlInline(String),
    Autolink(String),
    /// `||content||`; content is kept raw
    Spoiler(String),
    Container(Vec<Inline>),
}

/// A single list item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub is_task: bool,
    pub task_checked: bool,
    /// Literal text following the checkbox marker of a task item
    pub task_text: String,
    pub blocks: Vec<Block>,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

/// Block-level elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph {
        inlines: Vec<Inline>,
    },
    List(List),
    Quote {
        blocks: Vec<Block>,
    },
    CodeBlock {
        info: Option<String>,
        lines: Vec<String>,
    },
    /// Each cell holds the blocks parsed from it
    Table {
        rows: Vec<Vec<Vec<Block>>>,
    },
    ThematicBreak,
    HtmlBlock {
        raw: String,
    },
    Container {
        blocks: Vec<Block>,
    },
}

/// A parsed document: the top-level blocks in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Literal(text.into())
    }
}

impl Block {
    /// Paragraph holding a single literal run
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            inlines: vec![Inline::text(text)],
        }
    }
}
