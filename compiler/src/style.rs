use std::fmt;

use serde::Deserialize;

use crate::font::FontId;

/// An RGBA color. Deserializes from a `[r, g, b, a]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Color { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Inline text flags. Independent of each other and of the visual config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
}

/// Block-level visual settings inherited by every text run inside a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualConfig {
    /// Logical family; the concrete face is picked by [`crate::font::resolve`].
    pub font: FontId,
    pub font_size: f32,
    pub color: Color,
    pub letter_spacing: f32,
}

/// Everything a scope-opening node saves on entry and restores on exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleFrame {
    pub config: VisualConfig,
    pub state: TextState,
}

/// Proof that a frame was pushed. Consumed by [`StyleStack::pop`].
///
/// Not `Clone`: each push can be undone exactly once.
#[must_use = "a pushed style frame must be popped with its token"]
#[derive(Debug, PartialEq, Eq)]
pub struct ScopeToken {
    depth: usize,
}

/// Saved style frames of the scope-opening nodes currently open.
#[derive(Debug, Default)]
pub struct StyleStack {
    frames: Vec<StyleFrame>,
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save `frame`; the returned token restores it.
    pub fn push(&mut self, frame: StyleFrame) -> ScopeToken {
        self.frames.push(frame);
        ScopeToken {
            depth: self.frames.len(),
        }
    }

    /// Restore the frame saved when `token` was issued.
    ///
    /// Tokens must be returned innermost first; the compiler keeps them in
    /// its open-node stack, which guarantees that order.
    pub fn pop(&mut self, token: ScopeToken) -> Option<StyleFrame> {
        if token.depth != self.frames.len() {
            tracing::warn!(
                expected = self.frames.len(),
                got = token.depth,
                "style scope closed out of order"
            );
            self.frames.truncate(token.depth);
        }
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(size: f32, bold: bool) -> StyleFrame {
        StyleFrame {
            config: VisualConfig {
                font: FontId::Normal,
                font_size: size,
                color: Color::rgba(0, 0, 0, 255),
                letter_spacing: 1.0,
            },
            state: TextState {
                bold,
                ..TextState::default()
            },
        }
    }

    #[test]
    fn push_pop_restores_in_reverse_order() {
        let mut stack = StyleStack::new();
        let outer = stack.push(frame(18.0, false));
        let inner = stack.push(frame(48.0, true));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(inner), Some(frame(48.0, true)));
        assert_eq!(stack.pop(outer), Some(frame(18.0, false)));
        assert!(stack.is_empty());
    }

    #[test]
    fn color_formats_as_hex() {
        assert_eq!(Color::rgba(200, 100, 50, 255).to_string(), "#c86432ff");
    }

    #[test]
    fn color_from_array() {
        assert_eq!(Color::from([1, 2, 3, 4]), Color::rgba(1, 2, 3, 4));
    }
}
