//! Instance store: the canonical list of placements, the viewport, and the
//! monotonic stacking counter.
//!
//! All operations tolerate stale ids (UI latency can hand us ids that were
//! removed a frame ago): they are silent no-ops, never errors. Anything that
//! removes placements re-runs the selection maintainer in the same call so
//! the selection never references a missing placement.

use crate::history::Snapshot;
use crate::selection::apply_selection;
use sc_core::catalog::EntityProvider;
use sc_core::config::CanvasConfig;
use sc_core::id::{EntityId, InstanceId};
use sc_core::model::*;

#[derive(Debug, Clone)]
pub struct CanvasState {
    placements: Vec<Placement>,
    /// Stacking order handed to the next placement / bring-to-front.
    next_z: i64,
    viewport: Viewport,
    selection: Vec<InstanceId>,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl CanvasState {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            placements: Vec::new(),
            next_z: 0,
            viewport: Viewport::default(),
            selection: Vec::new(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn get(&self, id: InstanceId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn selection(&self) -> &[InstanceId] {
        &self.selection
    }

    pub fn is_selected(&self, id: InstanceId) -> bool {
        self.selection.contains(&id)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn next_z(&self) -> i64 {
        self.next_z
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Placements whose entity is `entity`.
    pub fn placements_of(&self, entity: EntityId) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.entity == entity)
    }

    // ─── Placement mutations ─────────────────────────────────────────────

    /// Append a new placement on top of the stack. Always succeeds.
    pub fn add(&mut self, kind: EntityKind, entity: EntityId, position: Point) -> InstanceId {
        let placement = Placement::new(kind, entity, position, self.next_z);
        let id = placement.id;
        self.next_z += 1;
        self.placements.push(placement);
        log::trace!("store: add {id} ({kind:?} {entity})");
        id
    }

    /// Remove one placement. No-op if absent.
    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.remove_where(|p| p.id == id)
    }

    /// Remove several placements in one transaction.
    pub fn remove_many(&mut self, ids: &[InstanceId]) -> bool {
        self.remove_where(|p| ids.contains(&p.id))
    }

    /// Remove every placement of `entity` (entity deleted upstream).
    pub fn remove_all_of_entity(&mut self, entity: EntityId) -> bool {
        self.remove_where(|p| p.entity == entity)
    }

    /// Drop placements whose entity the provider no longer knows.
    pub fn retain_known(&mut self, provider: &dyn EntityProvider) -> bool {
        self.remove_where(|p| !provider.contains(p.entity))
    }

    fn remove_where(&mut self, pred: impl Fn(&Placement) -> bool) -> bool {
        let before = self.placements.len();
        self.placements.retain(|p| !pred(p));
        let removed = before - self.placements.len();
        if removed == 0 {
            return false;
        }
        log::debug!("store: removed {removed} placement(s)");
        // Prune the selection in the same logical step.
        let requested = self.selection.clone();
        self.set_selection(&requested);
        true
    }

    /// Update one placement's position. Ignored for stale ids.
    pub fn move_to(&mut self, id: InstanceId, position: Point) -> bool {
        match self.placements.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.position = position;
                true
            }
            None => false,
        }
    }

    /// Translate the given placements. Stale ids are skipped.
    pub fn move_by(&mut self, ids: &[InstanceId], dx: f32, dy: f32) -> bool {
        let mut moved = false;
        for p in self.placements.iter_mut().filter(|p| ids.contains(&p.id)) {
            p.position = p.position.offset(dx, dy);
            moved = true;
        }
        moved
    }

    /// Give `id` the current top stacking order. Ignored if absent.
    pub fn bring_to_front(&mut self, id: InstanceId) -> bool {
        let top = self.next_z;
        match self.placements.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.z = top;
                self.next_z += 1;
                true
            }
            None => false,
        }
    }

    /// Wholesale replacement. The stacking counter becomes `max(z) + 1`.
    pub fn replace_all(&mut self, placements: Vec<Placement>) {
        self.next_z = placements.iter().map(|p| p.z + 1).max().unwrap_or(0);
        self.placements = placements;
        let requested = self.selection.clone();
        self.set_selection(&requested);
    }

    /// Append already-built placements (copies). Their z is reassigned on top.
    pub(crate) fn append(&mut self, placements: Vec<Placement>) {
        for mut p in placements {
            p.z = self.next_z;
            p.selected = false;
            self.next_z += 1;
            self.placements.push(p);
        }
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_x += dx;
        self.viewport.pan_y += dy;
    }

    pub fn zoom_to(&mut self, zoom: f32) {
        self.viewport.set_zoom(zoom, self.min_zoom, self.max_zoom);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom_to(self.viewport.zoom * factor);
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::default();
        self.zoom_to(1.0);
    }

    // ─── Selection (all routed through `apply_selection`) ────────────────

    /// Replace the selection with `ids` (filtered to live placements).
    /// Returns whether anything changed.
    pub fn set_selection(&mut self, ids: &[InstanceId]) -> bool {
        let outcome = apply_selection(&self.placements, &self.selection, ids);
        let changed = outcome.changed();
        if outcome.placements_changed {
            self.placements = outcome.placements;
        }
        self.selection = outcome.selection;
        changed
    }

    /// Add `id` to the selection.
    pub fn select_one(&mut self, id: InstanceId) -> bool {
        let mut ids = self.selection.clone();
        ids.push(id);
        self.set_selection(&ids)
    }

    /// Add or remove `id`.
    pub fn toggle(&mut self, id: InstanceId) -> bool {
        let mut ids = self.selection.clone();
        if let Some(pos) = ids.iter().position(|s| *s == id) {
            ids.remove(pos);
        } else {
            ids.push(id);
        }
        self.set_selection(&ids)
    }

    /// Select only `id`.
    pub fn select_exclusive(&mut self, id: InstanceId) -> bool {
        self.set_selection(&[id])
    }

    pub fn select_all(&mut self) -> bool {
        let ids: Vec<InstanceId> = self.placements.iter().map(|p| p.id).collect();
        self.set_selection(&ids)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.set_selection(&[])
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.placements.clone(),
            self.next_z,
            self.viewport,
            self.selection.clone(),
        )
    }

    /// Restore from a snapshot. The stored selection is re-validated rather
    /// than trusted.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.placements = snapshot.placements().to_vec();
        self.next_z = snapshot.next_z();
        self.viewport = snapshot.viewport();
        self.selection = Vec::new();
        self.set_selection(snapshot.selection());
    }
}
