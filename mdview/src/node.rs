use std::fmt;
use std::ops::Range;

use pulldown_cmark::CowStr;

/// Whether a node is being entered or left during the depth-first walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Enter,
    Exit,
}

/// The kind of a parsed Markdown node, with the data the compiler needs.
///
/// Container kinds are visited twice (enter, then exit). Leaf kinds are
/// visited once, on enter, and never produce an exit event.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    // Containers
    Document,
    Heading { level: u8 },
    BlockQuote,
    Paragraph,
    Strong,
    Emphasis,
    /// `start` is the number written on the first item of an ordered list.
    List { ordered: bool, start: u64 },
    /// `ordered` mirrors the enclosing list, looked up through the parent.
    ListItem { ordered: bool },

    // Leaves
    CodeBlock { literal: CowStr<'a> },
    Text(CowStr<'a>),
    InlineCode(CowStr<'a>),
    SoftBreak,
    ThematicBreak,

    /// Anything the compiler does not render (links, images, HTML, tables...).
    /// May arrive with or without a matching exit.
    Other(&'static str),
}

/// Fieldless discriminant of [`NodeKind`], used to pair enter and exit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Document,
    Heading,
    BlockQuote,
    Paragraph,
    Strong,
    Emphasis,
    List,
    ListItem,
    CodeBlock,
    Text,
    InlineCode,
    SoftBreak,
    ThematicBreak,
    Other,
}

impl NodeKind<'_> {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Document => NodeTag::Document,
            NodeKind::Heading { .. } => NodeTag::Heading,
            NodeKind::BlockQuote => NodeTag::BlockQuote,
            NodeKind::Paragraph => NodeTag::Paragraph,
            NodeKind::Strong => NodeTag::Strong,
            NodeKind::Emphasis => NodeTag::Emphasis,
            NodeKind::List { .. } => NodeTag::List,
            NodeKind::ListItem { .. } => NodeTag::ListItem,
            NodeKind::CodeBlock { .. } => NodeTag::CodeBlock,
            NodeKind::Text(_) => NodeTag::Text,
            NodeKind::InlineCode(_) => NodeTag::InlineCode,
            NodeKind::SoftBreak => NodeTag::SoftBreak,
            NodeKind::ThematicBreak => NodeTag::ThematicBreak,
            NodeKind::Other(_) => NodeTag::Other,
        }
    }
}

impl NodeTag {
    /// True for kinds that are entered and later exited.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeTag::Document
                | NodeTag::Heading
                | NodeTag::BlockQuote
                | NodeTag::Paragraph
                | NodeTag::Strong
                | NodeTag::Emphasis
                | NodeTag::List
                | NodeTag::ListItem
        )
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeTag::Document => "document",
            NodeTag::Heading => "heading",
            NodeTag::BlockQuote => "block quote",
            NodeTag::Paragraph => "paragraph",
            NodeTag::Strong => "strong",
            NodeTag::Emphasis => "emphasis",
            NodeTag::List => "list",
            NodeTag::ListItem => "list item",
            NodeTag::CodeBlock => "code block",
            NodeTag::Text => "text",
            NodeTag::InlineCode => "inline code",
            NodeTag::SoftBreak => "soft break",
            NodeTag::ThematicBreak => "thematic break",
            NodeTag::Other => "other",
        };
        f.write_str(name)
    }
}

/// One step of the depth-first walk over a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent<'a> {
    pub visit: Visit,
    pub kind: NodeKind<'a>,
    /// Byte span of the node in the source, for diagnostics.
    pub span: Range<usize>,
}

impl<'a> NodeEvent<'a> {
    pub fn enter(kind: NodeKind<'a>) -> Self {
        NodeEvent {
            visit: Visit::Enter,
            kind,
            span: 0..0,
        }
    }

    pub fn exit(kind: NodeKind<'a>) -> Self {
        NodeEvent {
            visit: Visit::Exit,
            kind,
            span: 0..0,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for NodeEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.visit {
            Visit::Enter => "enter",
            Visit::Exit => "exit",
        };
        write!(f, "{} {}", arrow, self.kind.tag())?;
        match &self.kind {
            NodeKind::Heading { level } => write!(f, " h{}", level),
            NodeKind::List { ordered, start } if *ordered => write!(f, " ordered from {}", start),
            NodeKind::List { .. } => write!(f, " bullet"),
            NodeKind::ListItem { ordered } => {
                write!(f, " {}", if *ordered { "ordered" } else { "bullet" })
            }
            NodeKind::CodeBlock { literal } => write!(f, " {:?}", literal.as_ref()),
            NodeKind::Text(s) | NodeKind::InlineCode(s) => write!(f, " {:?}", s.as_ref()),
            NodeKind::Other(name) => write!(f, " ({})", name),
            _ => Ok(()),
        }
    }
}
