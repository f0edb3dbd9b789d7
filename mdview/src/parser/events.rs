use std::ops::Range;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::node::{NodeEvent, NodeKind, Visit};
use crate::parser::ParseLimits;
use crate::parser::error::{ParseError, ParseErrorKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse Markdown source text into a flat enter/exit event stream.
pub(super) fn collect_events(
    source: &str,
    file_id: usize,
    limits: ParseLimits,
) -> Result<Vec<NodeEvent<'_>>, Vec<ParseError>> {
    if source.len() > limits.max_source_bytes {
        return Err(vec![ParseError::new(
            ParseErrorKind::SourceTooLarge {
                len: source.len(),
                limit: limits.max_source_bytes,
            },
            0..source.len(),
            file_id,
        )]);
    }

    let parser = CmarkParser::new_ext(source, Options::empty());

    let mut state = EventState::new(source.len(), file_id, limits);
    for (event, range) in parser.into_offset_iter() {
        state.process(event, range).map_err(|err| vec![err])?;
    }
    Ok(state.finalize())
}

// ---------------------------------------------------------------------------
// Event state
// ---------------------------------------------------------------------------

struct EventState<'a> {
    file_id: usize,
    limits: ParseLimits,
    source_len: usize,
    events: Vec<NodeEvent<'a>>,
    /// One entry per open list: (ordered, start number).
    lists: Vec<(bool, u64)>,
    /// Open block-level nodes, innermost last.
    blocks: Vec<OpenBlock>,
    /// Open nodes, the document included.
    depth: usize,
    /// Literal text of the code block being read, with the block's span.
    code: Option<(String, Range<usize>)>,
}

impl<'a> EventState<'a> {
    fn new(source_len: usize, file_id: usize, limits: ParseLimits) -> Self {
        let mut events = Vec::new();
        events.push(NodeEvent::enter(NodeKind::Document).with_span(0..source_len));
        EventState {
            file_id,
            limits,
            source_len,
            events,
            lists: Vec::new(),
            blocks: Vec::new(),
            depth: 1,
            code: None,
        }
    }

    fn process(&mut self, event: Event<'a>, range: Range<usize>) -> Result<(), ParseError> {
        // Code block content arrives as a run of text events; fold it into one literal.
        if let Some((literal, _)) = self.code.as_mut() {
            match event {
                Event::Text(text) => {
                    literal.push_str(&text);
                    return Ok(());
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((literal, span)) = self.code.take() {
                        self.push(
                            Visit::Enter,
                            NodeKind::CodeBlock {
                                literal: CowStr::from(literal),
                            },
                            span,
                        );
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        // Tight list items hold their inlines directly; give them the
        // paragraph a loose item would have.
        match &event {
            Event::Start(tag) if is_block(tag) => self.end_item_paragraph(range.start),
            Event::End(tag_end) if ends_block(tag_end) => self.end_item_paragraph(range.end),
            Event::Rule | Event::Html(_) => self.end_item_paragraph(range.start),
            Event::End(_) => {}
            _ => self.start_item_paragraph(range.start)?,
        }

        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                self.code = Some((String::new(), range));
            }
            Event::Start(tag) => {
                self.open(range.clone())?;
                if is_block(&tag) {
                    self.blocks.push(match tag {
                        Tag::Item => OpenBlock::Item { paragraph: None },
                        _ => OpenBlock::Other,
                    });
                }
                let kind = self.enter_kind(tag);
                self.push(Visit::Enter, kind, range);
            }
            Event::End(tag_end) => {
                self.depth = self.depth.saturating_sub(1);
                if ends_block(&tag_end) {
                    self.blocks.pop();
                }
                let kind = self.exit_kind(tag_end);
                self.push(Visit::Exit, kind, range);
            }
            Event::Text(text) => self.push(Visit::Enter, NodeKind::Text(text), range),
            Event::Code(code) => self.push(Visit::Enter, NodeKind::InlineCode(code), range),
            Event::SoftBreak => self.push(Visit::Enter, NodeKind::SoftBreak, range),
            Event::Rule => self.push(Visit::Enter, NodeKind::ThematicBreak, range),
            Event::HardBreak => self.push(Visit::Enter, NodeKind::Other("hard break"), range),
            Event::Html(_) | Event::InlineHtml(_) => {
                self.push(Visit::Enter, NodeKind::Other("html"), range)
            }
            Event::FootnoteReference(_) => {
                self.push(Visit::Enter, NodeKind::Other("footnote reference"), range)
            }
            Event::TaskListMarker(_) => {
                self.push(Visit::Enter, NodeKind::Other("task list marker"), range)
            }
            _ => self.push(Visit::Enter, NodeKind::Other("inline extension"), range),
        }
        Ok(())
    }

    fn open(&mut self, range: Range<usize>) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.limits.max_nesting {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep {
                    depth: self.depth,
                    limit: self.limits.max_nesting,
                },
                range,
                self.file_id,
            ));
        }
        Ok(())
    }

    /// Open the implicit paragraph of a tight list item, if inline content
    /// arrives directly inside one.
    fn start_item_paragraph(&mut self, at: usize) -> Result<(), ParseError> {
        if let Some(OpenBlock::Item { paragraph: None }) = self.blocks.last() {
            self.open(at..at)?;
            if let Some(OpenBlock::Item { paragraph }) = self.blocks.last_mut() {
                *paragraph = Some(at);
            }
            self.push(Visit::Enter, NodeKind::Paragraph, at..at);
        }
        Ok(())
    }

    fn end_item_paragraph(&mut self, at: usize) {
        if let Some(OpenBlock::Item { paragraph }) = self.blocks.last_mut() {
            if let Some(start) = paragraph.take() {
                self.depth = self.depth.saturating_sub(1);
                self.push(Visit::Exit, NodeKind::Paragraph, start..at);
            }
        }
    }

    fn enter_kind(&mut self, tag: Tag<'a>) -> NodeKind<'a> {
        match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading { level, .. } => NodeKind::Heading {
                level: heading_level_to_u8(&level),
            },
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::List(start) => {
                let ordered = start.is_some();
                let start = start.unwrap_or(1);
                self.lists.push((ordered, start));
                NodeKind::List { ordered, start }
            }
            Tag::Item => NodeKind::ListItem {
                ordered: self.innermost_list_ordered(),
            },
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            other => NodeKind::Other(tag_name(&other)),
        }
    }

    fn exit_kind(&mut self, tag_end: TagEnd) -> NodeKind<'a> {
        match tag_end {
            TagEnd::Paragraph => NodeKind::Paragraph,
            TagEnd::Heading(level) => NodeKind::Heading {
                level: heading_level_to_u8(&level),
            },
            TagEnd::BlockQuote(_) => NodeKind::BlockQuote,
            TagEnd::List(_) => {
                let (ordered, start) = self.lists.pop().unwrap_or((false, 1));
                NodeKind::List { ordered, start }
            }
            TagEnd::Item => NodeKind::ListItem {
                ordered: self.innermost_list_ordered(),
            },
            TagEnd::Emphasis => NodeKind::Emphasis,
            TagEnd::Strong => NodeKind::Strong,
            other => NodeKind::Other(tag_end_name(&other)),
        }
    }

    /// Parent lookup for list items: the innermost open list decides.
    fn innermost_list_ordered(&self) -> bool {
        self.lists.last().is_some_and(|(ordered, _)| *ordered)
    }

    fn push(&mut self, visit: Visit, kind: NodeKind<'a>, span: Range<usize>) {
        self.events.push(NodeEvent { visit, kind, span });
    }

    fn finalize(mut self) -> Vec<NodeEvent<'a>> {
        let end = self.source_len;
        self.events
            .push(NodeEvent::exit(NodeKind::Document).with_span(0..end));
        tracing::debug!(events = self.events.len(), bytes = end, "parsed markdown");
        self.events
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum OpenBlock {
    /// `paragraph` holds the start offset of an implicit paragraph.
    Item { paragraph: Option<usize> },
    Other,
}

fn is_block(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading { .. }
            | Tag::BlockQuote(_)
            | Tag::CodeBlock(_)
            | Tag::HtmlBlock
            | Tag::List(_)
            | Tag::Item
            | Tag::FootnoteDefinition(_)
            | Tag::Table(_)
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell
            | Tag::MetadataBlock(_)
    )
}

fn ends_block(tag_end: &TagEnd) -> bool {
    matches!(
        tag_end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::FootnoteDefinition
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::MetadataBlock(_)
    )
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn tag_name(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::Link { .. } => "link",
        Tag::Image { .. } => "image",
        Tag::HtmlBlock => "html block",
        Tag::FootnoteDefinition(_) => "footnote definition",
        Tag::Table(_) => "table",
        Tag::TableHead => "table head",
        Tag::TableRow => "table row",
        Tag::TableCell => "table cell",
        _ => "block extension",
    }
}

fn tag_end_name(tag_end: &TagEnd) -> &'static str {
    match tag_end {
        TagEnd::Link => "link",
        TagEnd::Image => "image",
        TagEnd::HtmlBlock => "html block",
        TagEnd::FootnoteDefinition => "footnote definition",
        TagEnd::Table => "table",
        TagEnd::TableHead => "table head",
        TagEnd::TableRow => "table row",
        TagEnd::TableCell => "table cell",
        _ => "block extension",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<(Visit, NodeKind<'_>)> {
        collect_events(source, 0, ParseLimits::default())
            .expect("parse failed")
            .into_iter()
            .map(|e| (e.visit, e.kind))
            .collect()
    }

    #[test]
    fn document_brackets_the_stream() {
        let events = kinds("hello");
        assert_eq!(events.first(), Some(&(Visit::Enter, NodeKind::Document)));
        assert_eq!(events.last(), Some(&(Visit::Exit, NodeKind::Document)));
    }

    #[test]
    fn paragraph_with_soft_break() {
        assert_eq!(
            kinds("a\nb"),
            vec![
                (Visit::Enter, NodeKind::Document),
                (Visit::Enter, NodeKind::Paragraph),
                (Visit::Enter, NodeKind::Text("a".into())),
                (Visit::Enter, NodeKind::SoftBreak),
                (Visit::Enter, NodeKind::Text("b".into())),
                (Visit::Exit, NodeKind::Paragraph),
                (Visit::Exit, NodeKind::Document),
            ]
        );
    }

    #[test]
    fn code_block_is_a_single_leaf() {
        let events = kinds("```\nfn main() {}\n\nlet x = 1;\n```\n");
        assert_eq!(
            events,
            vec![
                (Visit::Enter, NodeKind::Document),
                (
                    Visit::Enter,
                    NodeKind::CodeBlock {
                        literal: "fn main() {}\n\nlet x = 1;\n".into()
                    }
                ),
                (Visit::Exit, NodeKind::Document),
            ]
        );
    }

    #[test]
    fn list_items_see_their_parent_list() {
        let events = kinds("3. a\n\n   - b\n");
        let items: Vec<_> = events
            .iter()
            .filter(|(visit, kind)| *visit == Visit::Enter && matches!(kind, NodeKind::ListItem { .. }))
            .map(|(_, kind)| kind.clone())
            .collect();
        assert_eq!(
            items,
            vec![
                NodeKind::ListItem { ordered: true },
                NodeKind::ListItem { ordered: false },
            ]
        );
        assert!(events.contains(&(Visit::Enter, NodeKind::List { ordered: true, start: 3 })));
        assert!(events.contains(&(Visit::Exit, NodeKind::List { ordered: true, start: 3 })));
    }

    #[test]
    fn links_become_other_with_visible_text() {
        let events = kinds("[site](https://example.com)");
        assert!(events.contains(&(Visit::Enter, NodeKind::Other("link"))));
        assert!(events.contains(&(Visit::Exit, NodeKind::Other("link"))));
        assert!(events.contains(&(Visit::Enter, NodeKind::Text("site".into()))));
    }

    fn text_of(events: &[(Visit, NodeKind<'_>)]) -> String {
        events
            .iter()
            .filter_map(|(_, kind)| match kind {
                NodeKind::Text(s) => Some(s.as_ref()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tildes_stay_literal() {
        let events = kinds("~~gone~~");
        assert_eq!(text_of(&events), "~~gone~~");
        assert!(events.iter().all(|(_, kind)| !matches!(kind, NodeKind::Other(_))));
    }

    #[test]
    fn tight_items_get_a_paragraph() {
        assert_eq!(
            kinds("- x\n- y\n"),
            vec![
                (Visit::Enter, NodeKind::Document),
                (Visit::Enter, NodeKind::List { ordered: false, start: 1 }),
                (Visit::Enter, NodeKind::ListItem { ordered: false }),
                (Visit::Enter, NodeKind::Paragraph),
                (Visit::Enter, NodeKind::Text("x".into())),
                (Visit::Exit, NodeKind::Paragraph),
                (Visit::Exit, NodeKind::ListItem { ordered: false }),
                (Visit::Enter, NodeKind::ListItem { ordered: false }),
                (Visit::Enter, NodeKind::Paragraph),
                (Visit::Enter, NodeKind::Text("y".into())),
                (Visit::Exit, NodeKind::Paragraph),
                (Visit::Exit, NodeKind::ListItem { ordered: false }),
                (Visit::Exit, NodeKind::List { ordered: false, start: 1 }),
                (Visit::Exit, NodeKind::Document),
            ]
        );
    }

    #[test]
    fn tight_item_paragraph_closes_before_nested_list() {
        let events = kinds("- a\n  - b\n");
        let shape: Vec<String> = events
            .iter()
            .filter(|(_, kind)| !matches!(kind, NodeKind::Text(_)))
            .map(|(visit, kind)| format!("{:?} {}", visit, kind.tag()))
            .collect();
        assert_eq!(
            shape,
            vec![
                "Enter document",
                "Enter list",
                "Enter list item",
                "Enter paragraph",
                "Exit paragraph",
                "Enter list",
                "Enter list item",
                "Enter paragraph",
                "Exit paragraph",
                "Exit list item",
                "Exit list",
                "Exit list item",
                "Exit list",
                "Exit document",
            ]
        );
    }

    #[test]
    fn implicit_paragraph_span_covers_its_text() {
        let events = collect_events("- abc\n", 0, ParseLimits::default()).unwrap();
        let exit = events
            .iter()
            .find(|e| e.visit == Visit::Exit && e.kind == NodeKind::Paragraph)
            .unwrap();
        assert_eq!(exit.span.start, 2);
        assert!(exit.span.end >= 5);
    }

    #[test]
    fn deep_lists_fit_the_default_nesting_limit() {
        let mut source = String::new();
        for level in 0..40 {
            source.push_str(&"  ".repeat(level));
            source.push_str("- item\n");
        }
        assert!(collect_events(&source, 0, ParseLimits::default()).is_ok());
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let limits = ParseLimits {
            max_nesting: 3,
            ..ParseLimits::default()
        };
        let errors = collect_events("> > > deep", 7, limits).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file_id, 7);
        assert!(matches!(
            errors[0].kind,
            ParseErrorKind::NestingTooDeep { depth: 4, limit: 3 }
        ));
    }

    #[test]
    fn source_size_limit_is_enforced() {
        let limits = ParseLimits {
            max_source_bytes: 4,
            ..ParseLimits::default()
        };
        let errors = collect_events("too long", 0, limits).unwrap_err();
        assert_eq!(
            errors[0].kind,
            ParseErrorKind::SourceTooLarge { len: 8, limit: 4 }
        );
        assert_eq!(errors[0].span, 0..8);
    }
}
