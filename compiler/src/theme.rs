use serde::Deserialize;

use crate::font::FontId;
use crate::style::{Color, StyleFrame, TextState, VisualConfig};

/// Sizes and colors the compiler bakes into text commands.
///
/// Every field has a default, so a theme file only lists what it changes:
///
/// ```toml
/// h1_size = 40.0
/// quote = [90, 90, 90, 255]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Theme {
    pub h1_size: f32,
    pub h2_size: f32,
    /// Shared by heading levels 3 and deeper.
    pub h3_size: f32,
    pub body_size: f32,
    pub letter_spacing: f32,
    pub text: Color,
    pub quote: Color,
    pub code_block: Color,
    pub inline_code: Color,
    pub list_marker: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            h1_size: 48.0,
            h2_size: 36.0,
            h3_size: 28.0,
            body_size: 18.0,
            letter_spacing: 1.0,
            text: Color::rgba(0, 0, 0, 255),
            quote: Color::rgba(120, 120, 120, 255),
            code_block: Color::rgba(200, 100, 50, 255),
            inline_code: Color::rgba(50, 50, 50, 255),
            list_marker: Color::rgba(50, 50, 50, 255),
        }
    }
}

impl Theme {
    pub fn heading_size(&self, level: u8) -> f32 {
        match level {
            0 | 1 => self.h1_size,
            2 => self.h2_size,
            _ => self.h3_size,
        }
    }

    /// The frame in effect at the top of a document.
    pub fn root_frame(&self) -> StyleFrame {
        StyleFrame {
            config: VisualConfig {
                font: FontId::Normal,
                font_size: self.body_size,
                color: self.text,
                letter_spacing: self.letter_spacing,
            },
            state: TextState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_sizes_collapse_past_level_three() {
        let theme = Theme::default();
        assert_eq!(theme.heading_size(1), 48.0);
        assert_eq!(theme.heading_size(2), 36.0);
        assert_eq!(theme.heading_size(3), 28.0);
        assert_eq!(theme.heading_size(6), 28.0);
    }

    #[test]
    fn partial_theme_file_keeps_defaults() {
        let theme: Theme = toml::from_str("h1_size = 40.0\nquote = [90, 90, 90, 255]\n").unwrap();
        assert_eq!(theme.h1_size, 40.0);
        assert_eq!(theme.quote, Color::rgba(90, 90, 90, 255));
        assert_eq!(theme.h2_size, 36.0);
        assert_eq!(theme.code_block, Theme::default().code_block);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Theme>("h7_size = 10.0").is_err());
    }
}
