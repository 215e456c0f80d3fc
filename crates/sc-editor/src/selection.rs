//! Selection maintainer.
//!
//! Every selection change funnels through `apply_selection`, which filters
//! the requested ids down to placements that exist, de-duplicates them
//! (first occurrence wins), and syncs each placement's `selected` flag.
//! The "selection ⊆ placements" invariant therefore holds by construction.

use sc_core::id::InstanceId;
use sc_core::model::Placement;
use std::collections::HashSet;

/// Result of `apply_selection`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub placements: Vec<Placement>,
    pub selection: Vec<InstanceId>,
    /// Some placement's `selected` flag flipped.
    pub placements_changed: bool,
    /// The effective selection differs from `previous`.
    pub selection_changed: bool,
}

impl SelectionOutcome {
    pub fn changed(&self) -> bool {
        self.placements_changed || self.selection_changed
    }
}

/// Filter `requested` to live ids, dedup, and sync selection flags.
pub fn apply_selection(
    placements: &[Placement],
    previous: &[InstanceId],
    requested: &[InstanceId],
) -> SelectionOutcome {
    let live: HashSet<InstanceId> = placements.iter().map(|p| p.id).collect();

    let mut seen: HashSet<InstanceId> = HashSet::with_capacity(requested.len());
    let selection: Vec<InstanceId> = requested
        .iter()
        .copied()
        .filter(|id| live.contains(id) && seen.insert(*id))
        .collect();

    let mut placements_changed = false;
    let placements = placements
        .iter()
        .map(|p| {
            let selected = seen.contains(&p.id);
            if p.selected != selected {
                placements_changed = true;
                Placement {
                    selected,
                    ..p.clone()
                }
            } else {
                p.clone()
            }
        })
        .collect();

    let selection_changed = selection.as_slice() != previous;

    SelectionOutcome {
        placements,
        selection,
        placements_changed,
        selection_changed,
    }
}
