use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// What went wrong while turning source text into node events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("source is {len} bytes, larger than the {limit} byte limit")]
    SourceTooLarge { len: usize, limit: usize },

    #[error("document nests {depth} levels deep, more than the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
}

/// Parse errors with source location information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            span,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let note = match &self.kind {
            ParseErrorKind::SourceTooLarge { .. } => {
                "split the document or raise the source size limit"
            }
            ParseErrorKind::NestingTooDeep { .. } => {
                "the innermost node that crossed the limit is highlighted"
            }
        };
        Diagnostic::new(Severity::Error)
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(vec![note.to_string()])
    }
}
