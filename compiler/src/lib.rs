pub mod arena;
pub mod command;
pub mod compiler;
pub mod counter;
pub mod error;
pub mod font;
pub mod style;
pub mod theme;

pub use arena::{ArenaError, Generation, TextArena, TextRef};
pub use command::{BlockType, RenderCommand, ResolvedCommand, TextRun};
pub use compiler::{CompileOptions, Compiled, Compiler};
pub use error::{CompileError, CompileWarning, WarningKind};
pub use font::FontId;
pub use style::{Color, TextState};
pub use theme::Theme;
