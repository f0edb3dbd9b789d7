pub mod error;
mod events;

pub use error::{ParseError, ParseErrorKind};

use crate::Document;

/// Bounds applied while parsing, so a hostile file cannot produce an
/// unbounded event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Largest accepted source, in bytes.
    pub max_source_bytes: usize,
    /// Deepest accepted nesting of container nodes.
    pub max_nesting: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        ParseLimits {
            max_source_bytes: 16 * 1024 * 1024,
            max_nesting: 256,
        }
    }
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    limits: ParseLimits,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            limits: ParseLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse the source Markdown into its enter/exit event stream.
    pub fn parse(&self) -> Result<Document<'_>, Vec<ParseError>> {
        let events = events::collect_events(&self.source, self.file_id, self.limits)?;
        Ok(Document {
            events,
            source_id: self.file_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_can_be_tightened() {
        let parser = Parser::new("> > quoted".to_string(), 3).with_limits(ParseLimits {
            max_nesting: 2,
            ..ParseLimits::default()
        });
        let errors = parser.parse().unwrap_err();
        assert!(matches!(
            errors[0].kind,
            ParseErrorKind::NestingTooDeep { limit: 2, .. }
        ));
    }

    #[test]
    fn document_keeps_its_file_id() {
        let parser = Parser::new("text".to_string(), 5);
        let document = parser.parse().unwrap();
        assert_eq!(document.source_id, 5);
        assert!(document.iter().count() > 2);
    }
}
