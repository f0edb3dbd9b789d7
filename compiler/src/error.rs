use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use mdview::node::NodeTag;
use mdview::parser::ParseError;
use thiserror::Error;

use crate::arena::ArenaError;

/// Failures that leave no command stream at all.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("markdown could not be parsed ({} error(s))", .0.len())]
    Parse(Vec<ParseError>),
}

/// A recoverable problem met while compiling. Compilation always finishes;
/// the affected command degrades as described per kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarningKind {
    /// The text was replaced by an empty string.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Ordered list item with no open ordered list; a blank marker was used.
    #[error("ordered list item outside of an ordered list")]
    OrphanListItem,

    #[error("{found} closed while {open} was still open")]
    MismatchedExit { open: NodeTag, found: NodeTag },

    #[error("{0} closed but was never opened")]
    UnmatchedExit(NodeTag),

    #[error("{0} was still open at the end of the document")]
    Unclosed(NodeTag),
}

/// A warning enriched with the span of the node that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct CompileWarning {
    pub kind: WarningKind,
    pub span: Range<usize>,
}

impl CompileWarning {
    pub fn new(kind: impl Into<WarningKind>, span: Range<usize>) -> Self {
        CompileWarning {
            kind: kind.into(),
            span,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::new(Severity::Warning)
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(file_id, self.span.clone())]);
        match &self.kind {
            WarningKind::Arena(_) => {
                diagnostic.with_notes(vec!["this text is rendered empty".to_string()])
            }
            WarningKind::OrphanListItem => {
                diagnostic.with_notes(vec!["the item is rendered without a number".to_string()])
            }
            _ => diagnostic,
        }
    }
}
