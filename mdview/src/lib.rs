pub mod node;
pub mod parser;
pub mod preprocess;

use crate::node::NodeEvent;

/// A parsed Markdown document, flattened into its depth-first walk.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    /// Enter/exit events in source order, bracketed by the document node.
    pub events: Vec<NodeEvent<'a>>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl<'a> Document<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &NodeEvent<'a>> + '_ {
        self.events.iter()
    }
}

impl<'a> IntoIterator for Document<'a> {
    type Item = NodeEvent<'a>;
    type IntoIter = std::vec::IntoIter<NodeEvent<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
