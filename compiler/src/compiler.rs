use std::fmt;
use std::ops::Range;

use mdview::node::{NodeEvent, NodeKind, NodeTag, Visit};
use mdview::parser::Parser;

use crate::arena::{DEFAULT_ARENA_CAPACITY, Generation, TextArena, TextRef};
use crate::command::{BlockType, RenderCommand, ResolvedCommand, TextRun};
use crate::counter::ListCounters;
use crate::error::{CompileError, CompileWarning, WarningKind};
use crate::font::{self, FontId};
use crate::style::{ScopeToken, StyleFrame, StyleStack};
use crate::theme::Theme;

/// Marker for an ordered item that has no counter to read; as wide as the
/// bullet marker so the item still lines up with its siblings.
const ORPHAN_MARKER: &str = "    ";
const BULLET_MARKER: &str = " -  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Bytes of text one compiled document may hold.
    pub arena_capacity: usize,
    /// Number ordered lists from their written start instead of from 1.
    pub honor_list_start: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            honor_list_start: false,
        }
    }
}

/// Turns node events into render commands.
///
/// A compiler owns the text arena and the style and counter stacks of the
/// document it compiles. Each [`Compiler::compile`] call starts a new arena
/// generation; the returned [`Compiled`] borrows the compiler, so the
/// previous output cannot outlive the next compilation.
#[derive(Debug)]
pub struct Compiler {
    theme: Theme,
    options: CompileOptions,
    arena: TextArena,
    styles: StyleStack,
    counters: ListCounters,
}

impl Compiler {
    pub fn new(theme: Theme, options: CompileOptions) -> Self {
        Compiler {
            theme,
            arena: TextArena::with_capacity(options.arena_capacity),
            options,
            styles: StyleStack::new(),
            counters: ListCounters::new(),
        }
    }

    /// Number of saved style frames. Zero whenever no compilation is running.
    pub fn style_depth(&self) -> usize {
        self.styles.depth()
    }

    /// Number of open ordered-list counters. Zero whenever no compilation is running.
    pub fn counter_depth(&self) -> usize {
        self.counters.depth()
    }

    /// Compile a depth-first event stream into a flat command list.
    pub fn compile<'e, I>(&mut self, events: I) -> Compiled<'_>
    where
        I: IntoIterator<Item = NodeEvent<'e>>,
    {
        self.arena.reset();
        self.styles.clear();
        self.counters.clear();

        let mut pass = Pass {
            theme: &self.theme,
            honor_list_start: self.options.honor_list_start,
            arena: &mut self.arena,
            styles: &mut self.styles,
            counters: &mut self.counters,
            current: self.theme.root_frame(),
            open: Vec::new(),
            commands: Vec::new(),
            warnings: Vec::new(),
        };
        for event in events {
            match event.visit {
                Visit::Enter => pass.enter(event.kind, event.span),
                Visit::Exit => pass.exit(event.kind, event.span),
            }
        }
        let (commands, warnings) = pass.finish();

        tracing::debug!(
            commands = commands.len(),
            warnings = warnings.len(),
            arena_bytes = self.arena.used(),
            "compiled document"
        );

        Compiled {
            commands,
            warnings,
            arena: &self.arena,
        }
    }

    /// Parse `source` with default limits and compile it.
    pub fn compile_source(&mut self, source: &str) -> Result<Compiled<'_>, CompileError> {
        let parser = Parser::new(source.to_string(), 0);
        let document = parser.parse().map_err(CompileError::Parse)?;
        Ok(self.compile(document))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(Theme::default(), CompileOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Compilation pass
// ---------------------------------------------------------------------------

/// A container node that has been entered and not yet exited.
struct OpenNode {
    tag: NodeTag,
    /// Block command to close on exit.
    block: Option<BlockType>,
    /// Style frame to restore on exit.
    scope: Option<ScopeToken>,
    /// Ordered list that owns the innermost counter.
    counter: bool,
    span: Range<usize>,
}

struct Pass<'c> {
    theme: &'c Theme,
    honor_list_start: bool,
    arena: &'c mut TextArena,
    styles: &'c mut StyleStack,
    counters: &'c mut ListCounters,
    current: StyleFrame,
    open: Vec<OpenNode>,
    commands: Vec<RenderCommand>,
    warnings: Vec<CompileWarning>,
}

impl Pass<'_> {
    fn enter(&mut self, kind: NodeKind<'_>, span: Range<usize>) {
        match kind {
            NodeKind::Document => self.open(NodeTag::Document, None, None, false, span),
            NodeKind::Heading { level } => {
                let scope = self.save_style();
                self.current.config.font = FontId::Large;
                self.current.config.font_size = self.theme.heading_size(level);
                self.open(NodeTag::Heading, Some(BlockType::Heading), Some(scope), false, span);
            }
            NodeKind::BlockQuote => {
                let scope = self.save_style();
                self.current.config.color = self.theme.quote;
                self.open(NodeTag::BlockQuote, Some(BlockType::Quote), Some(scope), false, span);
            }
            NodeKind::Paragraph => {
                self.open(NodeTag::Paragraph, Some(BlockType::Paragraph), None, false, span)
            }
            NodeKind::Strong => {
                let scope = self.save_style();
                self.current.state.bold = true;
                self.open(NodeTag::Strong, None, Some(scope), false, span);
            }
            NodeKind::Emphasis => {
                let scope = self.save_style();
                self.current.state.italic = true;
                self.open(NodeTag::Emphasis, None, Some(scope), false, span);
            }
            NodeKind::List { ordered, start } => {
                let scope = self.save_style();
                self.open(
                    NodeTag::List,
                    Some(BlockType::ListContainer),
                    Some(scope),
                    ordered,
                    span,
                );
                if ordered {
                    self.counters.open(if self.honor_list_start { start } else { 1 });
                }
            }
            NodeKind::ListItem { ordered } => {
                self.open(NodeTag::ListItem, Some(BlockType::ListItem), None, false, span.clone());
                let marker = if ordered {
                    match self.counters.next() {
                        Some(n) => format!(" {}. ", n),
                        None => {
                            self.warn(WarningKind::OrphanListItem, &span);
                            ORPHAN_MARKER.to_string()
                        }
                    }
                } else {
                    BULLET_MARKER.to_string()
                };
                let mut style = self.current;
                style.config.color = self.theme.list_marker;
                self.emit_text(&marker, style, &span);
            }
            NodeKind::CodeBlock { literal } => {
                let mut style = self.current;
                style.state.monospace = true;
                style.config.color = self.theme.code_block;
                self.commands.push(RenderCommand::BlockOpen(BlockType::Code));
                self.emit_text(&literal, style, &span);
                self.commands.push(RenderCommand::BlockClose(BlockType::Code));
            }
            NodeKind::Text(text) => self.emit_text(&text, self.current, &span),
            NodeKind::InlineCode(code) => {
                let mut style = self.current;
                style.state.monospace = true;
                style.config.color = self.theme.inline_code;
                self.emit_text(&code, style, &span);
            }
            NodeKind::SoftBreak => self.emit_text(" ", self.current, &span),
            NodeKind::ThematicBreak => {
                self.commands.push(RenderCommand::BlockOpen(BlockType::ThematicBreak));
                self.commands.push(RenderCommand::BlockClose(BlockType::ThematicBreak));
            }
            NodeKind::Other(name) => {
                tracing::trace!(kind = name, "skipping unrendered node");
            }
        }
    }

    fn exit(&mut self, kind: NodeKind<'_>, span: Range<usize>) {
        let tag = kind.tag();
        // Leaves and unrendered kinds never open anything.
        if !tag.is_container() {
            return;
        }

        let Some(pos) = self.open.iter().rposition(|node| node.tag == tag) else {
            self.warn(WarningKind::UnmatchedExit(tag), &span);
            return;
        };
        while self.open.len() > pos + 1 {
            if let Some(node) = self.open.pop() {
                self.warn(
                    WarningKind::MismatchedExit {
                        open: node.tag,
                        found: tag,
                    },
                    &span,
                );
                self.close(node);
            }
        }
        if let Some(node) = self.open.pop() {
            self.close(node);
        }
    }

    fn finish(mut self) -> (Vec<RenderCommand>, Vec<CompileWarning>) {
        while let Some(node) = self.open.pop() {
            let span = node.span.clone();
            self.warn(WarningKind::Unclosed(node.tag), &span);
            self.close(node);
        }
        (self.commands, self.warnings)
    }

    fn save_style(&mut self) -> ScopeToken {
        self.styles.push(self.current)
    }

    fn open(
        &mut self,
        tag: NodeTag,
        block: Option<BlockType>,
        scope: Option<ScopeToken>,
        counter: bool,
        span: Range<usize>,
    ) {
        if let Some(block) = block {
            self.commands.push(RenderCommand::BlockOpen(block));
        }
        self.open.push(OpenNode {
            tag,
            block,
            scope,
            counter,
            span,
        });
    }

    fn close(&mut self, node: OpenNode) {
        if let Some(block) = node.block {
            self.commands.push(RenderCommand::BlockClose(block));
        }
        if node.counter {
            self.counters.close();
        }
        if let Some(scope) = node.scope {
            if let Some(frame) = self.styles.pop(scope) {
                self.current = frame;
            }
        }
    }

    fn emit_text(&mut self, text: &str, style: StyleFrame, span: &Range<usize>) {
        let content = match self.arena.allocate(text) {
            Ok(content) => content,
            Err(err) => {
                self.warn(err, span);
                TextRef::empty(self.arena.generation())
            }
        };
        self.commands.push(RenderCommand::Text(TextRun {
            content,
            font: font::resolve(style.config.font, &style.state),
            font_size: style.config.font_size,
            color: style.config.color,
            letter_spacing: style.config.letter_spacing,
            state: style.state,
        }));
    }

    fn warn(&mut self, kind: impl Into<WarningKind>, span: &Range<usize>) {
        let warning = CompileWarning::new(kind, span.clone());
        tracing::warn!(span = ?warning.span, "{}", warning);
        self.warnings.push(warning);
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The command stream of one compiled document, with the arena its text
/// lives in.
#[derive(Debug)]
pub struct Compiled<'c> {
    commands: Vec<RenderCommand>,
    warnings: Vec<CompileWarning>,
    arena: &'c TextArena,
}

impl<'c> Compiled<'c> {
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    pub fn generation(&self) -> Generation {
        self.arena.generation()
    }

    /// Text behind a reference. References from another compilation resolve
    /// to the empty string.
    pub fn text(&self, text: &TextRef) -> &'c str {
        let arena: &'c TextArena = self.arena;
        arena.get(text).unwrap_or("")
    }

    /// Commands in order, with their text looked up.
    pub fn resolved(&self) -> impl Iterator<Item = ResolvedCommand<'c>> + '_ {
        self.commands.iter().map(|command| match *command {
            RenderCommand::BlockOpen(block) => ResolvedCommand::BlockOpen(block),
            RenderCommand::BlockClose(block) => ResolvedCommand::BlockClose(block),
            RenderCommand::Text(run) => ResolvedCommand::Text {
                content: self.text(&run.content),
                run,
            },
        })
    }

    /// Contents of every text command, in order.
    pub fn texts(&self) -> Vec<&'c str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Text(run) => Some(self.text(&run.content)),
                _ => None,
            })
            .collect()
    }

    /// Indented one-command-per-line dump, as printed by the CLI.
    pub fn outline(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Compiled<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;
        for command in self.resolved() {
            if let ResolvedCommand::BlockClose(_) = command {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "{:indent$}{}", "", command, indent = depth * 2)?;
            if let ResolvedCommand::BlockOpen(_) = command {
                depth += 1;
            }
        }
        Ok(())
    }
}
