//! Snapshot-based undo/redo.
//!
//! Every reversible action captures a full `Snapshot` of the canvas
//! *before* it runs and pushes it as a `HistoryEntry`. Undo restores that
//! snapshot and parks the current state on the redo stack; redo does the
//! reverse. Both stacks are bounded: past capacity the oldest entry is
//! dropped.
//!
//! Entries that touched the outside world (tag application) carry their
//! side effects as plain data in `EntryMeta`, so the caller can replay them
//! after `undo`/`redo` returns (see `tagging`).

use crate::store::CanvasState;
use sc_core::id::{EntityId, InstanceId};
use sc_core::model::{Placement, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Immutable deep copy of the canvas state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    placements: Vec<Placement>,
    next_z: i64,
    viewport: Viewport,
    selection: Vec<InstanceId>,
}

impl Snapshot {
    pub(crate) fn new(
        placements: Vec<Placement>,
        next_z: i64,
        viewport: Viewport,
        selection: Vec<InstanceId>,
    ) -> Self {
        Self {
            placements,
            next_z,
            viewport,
            selection,
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn next_z(&self) -> i64 {
        self.next_z
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &[InstanceId] {
        &self.selection
    }
}

/// The kind of user action an entry reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Copy,
    Delete,
    ApplyLabel,
    Rebuild,
}

/// One `(song, tag)` association sent to the tagging service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagPair {
    pub song: EntityId,
    pub tag: EntityId,
}

/// Side-effect descriptors recorded with an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EntryMeta {
    #[default]
    None,
    /// Pairs that were applied remotely when the action ran.
    TagPairs(Vec<TagPair>),
}

impl EntryMeta {
    pub fn tag_pairs(&self) -> &[TagPair] {
        match self {
            EntryMeta::TagPairs(pairs) => pairs,
            EntryMeta::None => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub kind: ActionKind,
    /// State before the action (on the undo stack) or before the undo
    /// (on the redo stack).
    pub snapshot: Snapshot,
    pub meta: EntryMeta,
}

/// Bounded undo/redo stacks.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    /// Maximum depth of each stack.
    capacity: usize,
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::new(),
            capacity,
        }
    }

    /// Record a completed action. Clears the redo stack.
    pub fn push(&mut self, kind: ActionKind, snapshot: Snapshot, meta: EntryMeta) {
        log::debug!("history: push {kind:?}");
        Self::push_bounded(
            &mut self.undo_stack,
            HistoryEntry {
                kind,
                snapshot,
                meta,
            },
            self.capacity,
        );
        self.redo_stack.clear();
    }

    /// Undo the most recent action. Returns the popped entry so the caller
    /// can replay its side effects in reverse.
    pub fn undo(&mut self, state: &mut CanvasState) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop_back()?;
        let current = state.snapshot();
        state.restore(&entry.snapshot);
        Self::push_bounded(
            &mut self.redo_stack,
            HistoryEntry {
                kind: entry.kind,
                snapshot: current,
                meta: entry.meta.clone(),
            },
            self.capacity,
        );
        log::debug!("history: undo {:?}", entry.kind);
        Some(entry)
    }

    /// Redo the most recently undone action.
    pub fn redo(&mut self, state: &mut CanvasState) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop_back()?;
        let current = state.snapshot();
        state.restore(&entry.snapshot);
        Self::push_bounded(
            &mut self.undo_stack,
            HistoryEntry {
                kind: entry.kind,
                snapshot: current,
                meta: entry.meta.clone(),
            },
            self.capacity,
        );
        log::debug!("history: redo {:?}", entry.kind);
        Some(entry)
    }

    fn push_bounded(stack: &mut VecDeque<HistoryEntry>, entry: HistoryEntry, capacity: usize) {
        stack.push_back(entry);
        while stack.len() > capacity {
            stack.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.back()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.back()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
