use std::fmt;

use crate::arena::TextRef;
use crate::font::FontId;
use crate::style::{Color, TextState};

/// Kind of layout box opened by a [`RenderCommand::BlockOpen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Heading,
    Quote,
    Code,
    Paragraph,
    ListContainer,
    ListItem,
    ThematicBreak,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockType::Heading => "heading",
            BlockType::Quote => "quote",
            BlockType::Code => "code",
            BlockType::Paragraph => "paragraph",
            BlockType::ListContainer => "list",
            BlockType::ListItem => "item",
            BlockType::ThematicBreak => "rule",
        };
        f.write_str(name)
    }
}

/// A run of text with its style fully resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun {
    pub content: TextRef,
    /// Concrete face, after bold/italic/monospace resolution.
    pub font: FontId,
    pub font_size: f32,
    pub color: Color,
    pub letter_spacing: f32,
    pub state: TextState,
}

/// One instruction for the layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    BlockOpen(BlockType),
    Text(TextRun),
    BlockClose(BlockType),
}

/// A [`RenderCommand`] with its text looked up in the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedCommand<'a> {
    BlockOpen(BlockType),
    Text { content: &'a str, run: TextRun },
    BlockClose(BlockType),
}

impl fmt::Display for ResolvedCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedCommand::BlockOpen(block) => write!(f, "open {}", block),
            ResolvedCommand::BlockClose(block) => write!(f, "close {}", block),
            ResolvedCommand::Text { content, run } => {
                write!(
                    f,
                    "text {:?} {} {} {}",
                    content, run.font, run.font_size, run.color
                )?;
                let flags = [
                    (run.state.bold, "bold"),
                    (run.state.italic, "italic"),
                    (run.state.underline, "underline"),
                    (run.state.strikethrough, "strike"),
                    (run.state.monospace, "mono"),
                ];
                for (set, name) in flags {
                    if set {
                        write!(f, " +{}", name)?;
                    }
                }
                Ok(())
            }
        }
    }
}
