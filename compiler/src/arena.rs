//! Bounded text arena owning every string a compiled document refers to.
//!
//! References handed out by [`TextArena::allocate`] are plain offsets tagged
//! with the arena generation they were made in. [`TextArena::reset`] starts a
//! new generation, after which older references resolve to `None`.

use thiserror::Error;

/// Default arena size: one mebibyte of text per document.
pub const DEFAULT_ARENA_CAPACITY: usize = 1024 * 1024;

/// Lifetime epoch of the references allocated since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u32);

/// A reference to text stored in a [`TextArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRef {
    generation: Generation,
    start: u32,
    len: u32,
}

impl TextRef {
    /// A zero-length reference, valid in the given generation.
    pub fn empty(generation: Generation) -> Self {
        TextRef {
            generation,
            start: 0,
            len: 0,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("text arena out of memory: {requested} bytes requested, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },
}

/// A fixed-capacity bump allocator for text.
#[derive(Debug)]
pub struct TextArena {
    buf: String,
    capacity: usize,
    generation: Generation,
}

impl TextArena {
    pub fn with_capacity(capacity: usize) -> Self {
        // Offsets are stored as u32.
        let capacity = capacity.min(u32::MAX as usize);
        TextArena {
            buf: String::with_capacity(capacity),
            capacity,
            generation: Generation(0),
        }
    }

    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Copy `text` into the arena.
    pub fn allocate(&mut self, text: &str) -> Result<TextRef, ArenaError> {
        if text.len() > self.remaining() {
            return Err(ArenaError::Exhausted {
                requested: text.len(),
                remaining: self.remaining(),
            });
        }
        let start = self.buf.len();
        self.buf.push_str(text);
        Ok(TextRef {
            generation: self.generation,
            start: start as u32,
            len: text.len() as u32,
        })
    }

    /// Resolve a reference made in the current generation.
    pub fn get(&self, text: &TextRef) -> Option<&str> {
        if text.generation != self.generation {
            return None;
        }
        let start = text.start as usize;
        self.buf.get(start..start + text.len as usize)
    }

    /// Drop all text and invalidate every reference handed out so far.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.generation = Generation(self.generation.0.wrapping_add(1));
    }
}

impl Default for TextArena {
    fn default() -> Self {
        TextArena::with_capacity(DEFAULT_ARENA_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_resolve() {
        let mut arena = TextArena::with_capacity(64);
        let a = arena.allocate("hello").unwrap();
        let b = arena.allocate(" world").unwrap();
        assert_eq!(arena.get(&a), Some("hello"));
        assert_eq!(arena.get(&b), Some(" world"));
        assert_eq!(arena.used(), 11);
    }

    #[test]
    fn exhaustion_is_reported_and_leaves_arena_usable() {
        let mut arena = TextArena::with_capacity(8);
        arena.allocate("12345").unwrap();
        let err = arena.allocate("6789").unwrap_err();
        assert_eq!(
            err,
            ArenaError::Exhausted {
                requested: 4,
                remaining: 3
            }
        );
        let small = arena.allocate("678").unwrap();
        assert_eq!(arena.get(&small), Some("678"));
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn empty_text_always_fits() {
        let mut arena = TextArena::with_capacity(0);
        let r = arena.allocate("").unwrap();
        assert!(r.is_empty());
        assert_eq!(arena.get(&r), Some(""));
    }

    #[test]
    fn reset_invalidates_older_references() {
        let mut arena = TextArena::with_capacity(16);
        let old = arena.allocate("stale").unwrap();
        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.get(&old), None);
        let fresh = arena.allocate("fresh").unwrap();
        assert_ne!(old.generation(), fresh.generation());
        assert_eq!(arena.get(&fresh), Some("fresh"));
    }

    #[test]
    fn multibyte_text_round_trips() {
        let mut arena = TextArena::with_capacity(32);
        let r = arena.allocate("中文 ✓").unwrap();
        assert_eq!(arena.get(&r), Some("中文 ✓"));
    }
}
