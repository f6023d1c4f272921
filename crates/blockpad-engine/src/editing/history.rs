//! Undo/redo over whole-document revisions.
//!
//! Ropes share structure, so keeping a clone of the buffer per revision is
//! cheap. Each revision also remembers the single replace that led from it
//! to its neighbour, so restoring it touches only that interval and the
//! incremental reparse sees an ordinary edit.

use std::collections::VecDeque;
use std::ops::Range;

use blockpad_syntax::TextEdit;
use xi_rope::Rope;

/// Revisions kept before the oldest is dropped.
const MAX_DEPTH: usize = 500;

/// A document state to return to.
#[derive(Debug, Clone)]
pub(crate) struct Revision {
    pub text: Rope,
    pub selection: Range<usize>,
    /// Turns `text` into the state that replaced it
    pub edit: TextEdit,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<Revision>,
    redo: Vec<Revision>,
    /// Bumped by every undo and redo
    generation: u64,
}

impl History {
    /// Remember the state before a new edit. Clears the redo stack.
    pub(crate) fn record(&mut self, before: Revision) {
        if self.undo.len() == MAX_DEPTH {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
        self.redo.clear();
    }

    /// Pop the revision to return to; the current state goes on the redo stack.
    pub(crate) fn undo(&mut self, text: Rope, selection: Range<usize>) -> Option<Revision> {
        let previous = self.undo.pop_back()?;
        self.redo.push(Revision {
            text,
            selection,
            edit: previous.edit.inverse(),
        });
        self.generation += 1;
        Some(previous)
    }

    pub(crate) fn redo(&mut self, text: Rope, selection: Range<usize>) -> Option<Revision> {
        let next = self.redo.pop()?;
        self.undo.push_back(Revision {
            text,
            selection,
            edit: next.edit.inverse(),
        });
        self.generation += 1;
        Some(next)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

/// The smallest single replace turning `old` into `new`.
///
/// Returns the replaced range of `old` and the replacing range of `new`,
/// both on char boundaries.
pub(crate) fn minimal_replace(old: &str, new: &str) -> (Range<usize>, Range<usize>) {
    let (a, b) = (old.as_bytes(), new.as_bytes());

    let mut prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    while !old.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = a.len().min(b.len()) - prefix;
    let mut suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    while !old.is_char_boundary(a.len() - suffix) {
        suffix -= 1;
    }

    (prefix..a.len() - suffix, prefix..b.len() - suffix)
}
