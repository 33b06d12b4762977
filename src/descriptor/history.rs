//! Bounded undo/redo history of whole-descriptor snapshots.
//!
//! Two capped double-ended stacks. A snapshot is an independent deep copy;
//! mutating the live descriptor never changes a stored snapshot. When a
//! stack overflows its cap, the OLDEST snapshot is evicted.

use crate::descriptor::model::Descriptor;
use std::collections::VecDeque;

pub const MAX_SNAPSHOTS: usize = 5;

#[derive(Debug, Default)]
pub struct History {
    undo: VecDeque<Descriptor>,
    redo: VecDeque<Descriptor>,
}

impl History {
    /// Record the pre-mutation state of a fresh (non-undo/redo) edit.
    /// Any new edit invalidates the redo stack.
    pub fn record(&mut self, snapshot: Descriptor) {
        push_capped(&mut self.undo, snapshot);
        self.redo.clear();
    }

    /// Pop the most recent undo snapshot, parking `current` on redo.
    pub fn undo(&mut self, current: &Descriptor) -> Option<Descriptor> {
        let restored = self.undo.pop_back()?;
        push_capped(&mut self.redo, current.clone());
        Some(restored)
    }

    /// Pop the most recent redo snapshot, parking `current` on undo.
    pub fn redo(&mut self, current: &Descriptor) -> Option<Descriptor> {
        let restored = self.redo.pop_back()?;
        push_capped(&mut self.undo, current.clone());
        Some(restored)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

fn push_capped(stack: &mut VecDeque<Descriptor>, snapshot: Descriptor) {
    stack.push_back(snapshot);
    while stack.len() > MAX_SNAPSHOTS {
        stack.pop_front();
    }
}
