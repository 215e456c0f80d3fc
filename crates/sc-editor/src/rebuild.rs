//! Filter-driven rebuild.
//!
//! Regenerates the whole placement set from the songs matching the current
//! filter, lays them out on the grid, and swaps them into the store. A
//! rebuild over a non-empty canvas is undoable; the initial bootstrap
//! (empty → populated) leaves no history entry.

use crate::history::{ActionKind, EntryMeta, HistoryStack};
use crate::store::CanvasState;
use sc_core::catalog::{EntityProvider, MembershipIndex};
use sc_core::filter::{FilterState, resolve_songs};
use sc_core::layout::{GridParams, grid_layout};
use sc_core::model::{EntityKind, Placement, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// Number of placements created.
    pub created: usize,
    /// A `Rebuild` entry was pushed.
    pub recorded: bool,
    /// A previous selection was cleared.
    pub cleared_selection: bool,
    pub columns: usize,
    pub rows: usize,
}

/// Rebuild `state` for `filter`.
pub fn rebuild(
    state: &mut CanvasState,
    history: &mut HistoryStack,
    filter: &FilterState,
    provider: &dyn EntityProvider,
    index: &dyn MembershipIndex,
    params: &GridParams,
) -> RebuildOutcome {
    let songs = resolve_songs(filter, provider, index);

    let mut fresh: Vec<Placement> = songs
        .iter()
        .enumerate()
        .map(|(z, &song)| Placement::new(EntityKind::Song, song, Point::ORIGIN, z as i64))
        .collect();

    let layout = grid_layout(&fresh, params, Some(provider));
    layout.apply_to(&mut fresh);

    // The pre-rebuild snapshot must include the old selection.
    let before = (!state.is_empty()).then(|| state.snapshot());

    let cleared_selection = !state.selection().is_empty() && state.clear_selection();

    let recorded = match before {
        Some(snapshot) => {
            history.push(ActionKind::Rebuild, snapshot, EntryMeta::None);
            true
        }
        None => false,
    };

    let created = fresh.len();
    state.replace_all(fresh);

    log::debug!(
        "rebuild: {created} placement(s) for {} active tag(s), show_all={}, recorded={recorded}",
        filter.active_tags.len(),
        filter.show_all
    );

    RebuildOutcome {
        created,
        recorded,
        cleared_selection,
        columns: layout.columns,
        rows: layout.rows,
    }
}
