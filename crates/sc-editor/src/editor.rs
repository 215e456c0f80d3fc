//! `CanvasEditor`: the single coordinating object.
//!
//! Owns the instance store, history, local catalog mirror, filter watch and
//! pointer tracker, and exposes every user-level canvas action. Each
//! reversible action snapshots the state first and pushes exactly one
//! history entry when it completes. An open drag is committed before any
//! other reversible action runs, so entries stay in push order.

use crate::drag::PointerTracker;
use crate::error::SessionError;
use crate::history::{ActionKind, EntryMeta, HistoryStack, Snapshot, TagPair};
use crate::input::InputEvent;
use crate::rebuild::{RebuildOutcome, rebuild};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::CanvasState;
use crate::tagging::{Direction, ReplayReport, TagError, TagService, replay_redo, replay_undo, send};
use crate::watch::Watch;
use sc_core::catalog::{Catalog, EntityProvider};
use sc_core::config::CanvasConfig;
use sc_core::filter::{FilterState, expand_tags};
use sc_core::id::{EntityId, InstanceId};
use sc_core::layout::GridParams;
use sc_core::model::{EntityKind, Placement, Point};

/// Result of `apply_label`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelOutcome {
    pub applied: Vec<TagPair>,
    pub failed: Vec<(TagPair, TagError)>,
    /// An `ApplyLabel` entry was pushed.
    pub recorded: bool,
}

/// Result of one undo or redo step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub kind: ActionKind,
    pub replay: ReplayReport,
}

pub struct CanvasEditor {
    config: CanvasConfig,
    state: CanvasState,
    history: HistoryStack,
    catalog: Catalog,
    filter: Watch<FilterState>,
    pointer: PointerTracker,
    grid: GridParams,
    /// Set by `teardown`; filter changes are ignored until the next bootstrap.
    torn_down: bool,
}

impl CanvasEditor {
    pub fn new(config: CanvasConfig, catalog: Catalog) -> Self {
        Self {
            state: CanvasState::new(&config),
            history: HistoryStack::new(config.history_capacity),
            grid: config.grid,
            config,
            catalog,
            filter: Watch::new(),
            pointer: PointerTracker::new(),
            torn_down: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn filter(&self) -> Option<&FilterState> {
        self.filter.current()
    }

    /// Register host observers of filter changes (e.g. to repaint chips).
    pub fn filter_watch_mut(&mut self) -> &mut Watch<FilterState> {
        &mut self.filter
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    // ─── Catalog sync ────────────────────────────────────────────────────

    /// Initial load: run the first rebuild for `filter` regardless of what
    /// was seen before. Never pushes history on an empty canvas.
    pub fn bootstrap(&mut self, filter: FilterState) -> RebuildOutcome {
        self.torn_down = false;
        self.filter.reset();
        self.filter.update(filter);
        self.run_rebuild()
    }

    /// Full resynchronization with the persistence layer. Placements of
    /// entities that vanished upstream are dropped.
    pub fn resync(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        if self.state.retain_known(&self.catalog) {
            log::debug!("resync: pruned placements of removed entities");
        }
    }

    /// An entity was permanently deleted upstream.
    pub fn entity_deleted(&mut self, entity: EntityId) -> bool {
        self.catalog.remove_entity(entity);
        self.state.remove_all_of_entity(entity)
    }

    /// Active filter changed. Rebuilds only if the value actually differs
    /// and the editor has not been torn down.
    pub fn set_filter(&mut self, filter: FilterState) -> Option<RebuildOutcome> {
        if self.torn_down {
            log::debug!("set_filter: ignored after teardown");
            return None;
        }
        if !self.filter.update(filter) {
            return None;
        }
        Some(self.run_rebuild())
    }

    /// Container resized. Used by the next rebuild.
    pub fn set_container_width(&mut self, width: f32) {
        self.grid.container_width = width;
    }

    fn run_rebuild(&mut self) -> RebuildOutcome {
        self.pointer.cancel(&mut self.history);
        let filter = self.filter.current().cloned().unwrap_or_default();
        rebuild(
            &mut self.state,
            &mut self.history,
            &filter,
            &self.catalog,
            &self.catalog,
            &self.grid,
        )
    }

    /// Teardown: unregister the rebuild trigger, drop filter observers and
    /// close any in-flight pointer session.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.filter.clear();
        self.pointer.cancel(&mut self.history);
    }

    // ─── Placement actions ───────────────────────────────────────────────

    /// Put an entity on the canvas (drop from a library panel). Unknown
    /// entities are ignored.
    pub fn place(&mut self, entity: EntityId, position: Point) -> Option<InstanceId> {
        let kind = if self.catalog.song(entity).is_some() {
            EntityKind::Song
        } else {
            self.catalog.tag(entity)?.entity_kind()
        };
        Some(self.state.add(kind, entity, position))
    }

    pub fn delete_selection(&mut self) -> bool {
        self.pointer.cancel(&mut self.history);
        if self.state.selection().is_empty() {
            return false;
        }
        let before = self.state.snapshot();
        let ids = self.state.selection().to_vec();
        self.state.remove_many(&ids);
        self.history.push(ActionKind::Delete, before, EntryMeta::None);
        true
    }

    /// Duplicate the selection, offset by `copy_offset`, and select the copies.
    pub fn copy_selection(&mut self) -> Vec<InstanceId> {
        self.pointer.cancel(&mut self.history);
        if self.state.selection().is_empty() {
            return Vec::new();
        }
        let before = self.state.snapshot();
        let offset = self.config.copy_offset;
        let copies: Vec<Placement> = self
            .state
            .selection()
            .iter()
            .filter_map(|id| self.state.get(*id))
            .map(|p| Placement::new(p.kind, p.entity, p.position.offset(offset, offset), 0))
            .collect();
        let ids: Vec<InstanceId> = copies.iter().map(|p| p.id).collect();
        self.state.append(copies);
        self.state.set_selection(&ids);
        self.history.push(ActionKind::Copy, before, EntryMeta::None);
        ids
    }

    /// Apply `tag` (a composite tag applies each component) to `songs`.
    ///
    /// Pairs the service accepts are mirrored locally and recorded; failures
    /// are logged and reported. Pairs already present are skipped so undo
    /// never retracts a tag the song carried before.
    pub fn apply_label(
        &mut self,
        tag: EntityId,
        songs: &[EntityId],
        service: &mut dyn TagService,
    ) -> LabelOutcome {
        self.pointer.cancel(&mut self.history);
        let components = expand_tags(&[tag], &self.catalog);
        let mut outcome = LabelOutcome::default();
        if components.is_empty() {
            log::debug!("apply_label: unknown or empty tag {tag}");
            return outcome;
        }

        let before = self.state.snapshot();
        for &song in songs {
            if self.catalog.song(song).is_none() {
                continue;
            }
            for &component in &components {
                let pair = TagPair {
                    song,
                    tag: component,
                };
                if self.catalog.has_tag(song, component) || outcome.applied.contains(&pair) {
                    continue;
                }
                match send(service, pair, Direction::Apply) {
                    Ok(()) => {
                        self.catalog.tag_song(song, component);
                        outcome.applied.push(pair);
                    }
                    Err(err) => outcome.failed.push((pair, err)),
                }
            }
        }

        if !outcome.applied.is_empty() {
            self.history.push(
                ActionKind::ApplyLabel,
                before,
                EntryMeta::TagPairs(outcome.applied.clone()),
            );
            outcome.recorded = true;
        }
        outcome
    }

    /// Apply `tag` to every song among the selected placements.
    pub fn apply_label_to_selection(
        &mut self,
        tag: EntityId,
        service: &mut dyn TagService,
    ) -> LabelOutcome {
        let mut songs: Vec<EntityId> = Vec::new();
        for id in self.state.selection() {
            if let Some(p) = self.state.get(*id)
                && p.kind == EntityKind::Song
                && !songs.contains(&p.entity)
            {
                songs.push(p.entity);
            }
        }
        self.apply_label(tag, &songs, service)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self, service: &mut dyn TagService) -> Option<StepOutcome> {
        self.pointer.cancel(&mut self.history);
        let entry = self.history.undo(&mut self.state)?;
        self.state.retain_known(&self.catalog);
        let replay = replay_undo(&entry, service, &mut self.catalog);
        Some(StepOutcome {
            kind: entry.kind,
            replay,
        })
    }

    pub fn redo(&mut self, service: &mut dyn TagService) -> Option<StepOutcome> {
        self.pointer.cancel(&mut self.history);
        let entry = self.history.redo(&mut self.state)?;
        self.state.retain_known(&self.catalog);
        let replay = replay_redo(&entry, service, &mut self.catalog);
        Some(StepOutcome {
            kind: entry.kind,
            replay,
        })
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. `hit` is the placement under the pointer as
    /// determined by the renderer. Returns whether the canvas changed.
    pub fn handle_input(
        &mut self,
        event: &InputEvent,
        hit: Option<InstanceId>,
        service: &mut dyn TagService,
    ) -> bool {
        match event {
            InputEvent::PointerDown {
                pointer_id,
                x,
                y,
                modifiers,
            } => self.pointer.pointer_down(
                &mut self.state,
                &mut self.history,
                *pointer_id,
                (*x, *y),
                *modifiers,
                hit,
            ),
            InputEvent::PointerMove { pointer_id, x, y, .. } => {
                self.pointer.pointer_move(&mut self.state, *pointer_id, (*x, *y))
            }
            InputEvent::PointerUp { pointer_id, x, y } => {
                self.pointer
                    .pointer_up(&mut self.state, &mut self.history, *pointer_id, (*x, *y))
            }
            InputEvent::Scroll { dx, dy, zoom } => {
                let before = self.state.viewport();
                self.state.pan_by(*dx, *dy);
                self.state.zoom_by(*zoom);
                self.state.viewport() != before
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(
                key,
                modifiers.ctrl,
                modifiers.shift,
                modifiers.alt,
                modifiers.meta,
            ) {
                Some(action) => self.handle_shortcut(action, service),
                None => false,
            },
        }
    }

    pub fn handle_shortcut(&mut self, action: ShortcutAction, service: &mut dyn TagService) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(service).is_some(),
            ShortcutAction::Redo => self.redo(service).is_some(),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => self.state.select_all(),
            ShortcutAction::Deselect => self.state.clear_selection(),
            ShortcutAction::Duplicate => !self.copy_selection().is_empty(),
            ShortcutAction::ZoomIn => self.zoom_step(self.config.zoom_step),
            ShortcutAction::ZoomOut => self.zoom_step(1.0 / self.config.zoom_step),
            ShortcutAction::ResetView => {
                let before = self.state.viewport();
                self.state.reset_view();
                self.state.viewport() != before
            }
            ShortcutAction::BringToFront => {
                self.pointer.cancel(&mut self.history);
                let ids = self.state.selection().to_vec();
                ids.into_iter()
                    .fold(false, |changed, id| self.state.bring_to_front(id) || changed)
            }
        }
    }

    fn zoom_step(&mut self, factor: f32) -> bool {
        let before = self.state.viewport().zoom;
        self.state.zoom_by(factor);
        self.state.viewport().zoom != before
    }

    // ─── Session ─────────────────────────────────────────────────────────

    /// Serialize the visual state (placements, viewport, selection).
    pub fn save_session(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(&self.state.snapshot())?)
    }

    /// Restore a saved visual state. History is cleared; placements of
    /// entities unknown to the catalog are dropped.
    pub fn load_session(&mut self, text: &str) -> Result<(), SessionError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        self.pointer.cancel(&mut self.history);
        self.state.restore(&snapshot);
        self.state.retain_known(&self.catalog);
        self.history.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::tagging::RecordingTagService;
    use sc_core::model::{Song, Tag};

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn editor() -> CanvasEditor {
        let mut c = Catalog::new();
        c.insert_song(Song::new("ed1", "One", "A"));
        c.insert_song(Song::new("ed2", "Two", "B"));
        c.insert_tag(Tag::plain("edt", "Tag"));
        c.insert_tag(Tag::plain("edu", "Other"));
        c.insert_tag(Tag::composite("edc", "Both", &["edt", "edu"]));
        CanvasEditor::new(CanvasConfig::default(), c)
    }

    #[test]
    fn place_rejects_unknown_entities() {
        let mut ed = editor();
        assert!(ed.place(id("nope"), Point::ORIGIN).is_none());
        let tag = ed.place(id("edc"), Point::ORIGIN).unwrap();
        assert_eq!(ed.state().get(tag).unwrap().kind, EntityKind::CompositeTag);
    }

    #[test]
    fn copy_selection_is_undoable() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        ed.bootstrap(FilterState::show_all());
        ed.handle_shortcut(ShortcutAction::SelectAll, &mut service);
        let copies = ed.copy_selection();
        assert_eq!(copies.len(), 2);
        assert_eq!(ed.state().len(), 4);
        assert_eq!(ed.state().selection(), copies.as_slice());

        let step = ed.undo(&mut service).unwrap();
        assert_eq!(step.kind, ActionKind::Copy);
        assert_eq!(ed.state().len(), 2);
        assert_eq!(ed.state().selection().len(), 2);
    }

    #[test]
    fn composite_label_applies_components() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        let out = ed.apply_label(id("edc"), &[id("ed1")], &mut service);
        assert_eq!(out.applied.len(), 2);
        assert!(ed.catalog().has_tag(id("ed1"), id("edt")));
        assert!(ed.catalog().has_tag(id("ed1"), id("edu")));

        // Already tagged: nothing new to apply or record.
        let again = ed.apply_label(id("edt"), &[id("ed1")], &mut service);
        assert!(again.applied.is_empty());
        assert!(!again.recorded);
        assert_eq!(ed.history().undo_len(), 1);
    }

    #[test]
    fn filter_change_guard() {
        let mut ed = editor();
        ed.bootstrap(FilterState::show_all());
        assert!(ed.set_filter(FilterState::show_all()).is_none());
        let out = ed.set_filter(FilterState::default()).unwrap();
        assert_eq!(out.created, 0);
        assert!(out.recorded);
    }

    #[test]
    fn teardown_drops_observers_and_open_drag() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut ed = editor();
        let mut service = RecordingTagService::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        ed.filter_watch_mut().subscribe(move |_| counter.set(counter.get() + 1));
        ed.bootstrap(FilterState::show_all());
        assert_eq!(seen.get(), 1);

        let target = ed.state().placements()[0].id;
        ed.handle_input(&InputEvent::down(1, 0.0, 0.0), Some(target), &mut service);
        ed.handle_input(&InputEvent::moved(1, 12.0, 0.0), None, &mut service);
        ed.teardown();
        assert!(ed.pointer().session().is_none());
        assert_eq!(ed.history().undo_len(), 1, "moved drag is committed");

        let len = ed.state().len();
        assert!(ed.set_filter(FilterState::tags(&["edt"])).is_none());
        assert_eq!(seen.get(), 1);
        assert_eq!(ed.state().len(), len);
        assert_eq!(ed.history().undo_len(), 1, "no rebuild after teardown");

        // A fresh bootstrap re-arms the trigger.
        ed.bootstrap(FilterState::show_all());
        assert!(ed.set_filter(FilterState::tags(&["edt"])).is_some());
    }

    #[test]
    fn delete_during_drag_commits_the_move_first() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        ed.bootstrap(FilterState::show_all());
        let target = ed.state().placements()[0].id;
        let start = ed.state().get(target).unwrap().position;

        ed.handle_input(&InputEvent::down(1, 0.0, 0.0), Some(target), &mut service);
        ed.handle_input(&InputEvent::moved(1, 30.0, 0.0), None, &mut service);
        ed.handle_shortcut(ShortcutAction::Delete, &mut service);
        assert!(!ed.handle_input(&InputEvent::up(1, 30.0, 0.0), None, &mut service));

        assert_eq!(ed.state().len(), 1);
        assert_eq!(ed.history().undo_len(), 2);
        assert_eq!(ed.history().peek_undo().map(|e| e.kind), Some(ActionKind::Delete));

        let step = ed.undo(&mut service).unwrap();
        assert_eq!(step.kind, ActionKind::Delete);
        assert_eq!(ed.state().len(), 2);
        assert_eq!(ed.state().get(target).unwrap().position, start.offset(30.0, 0.0));

        let step = ed.undo(&mut service).unwrap();
        assert_eq!(step.kind, ActionKind::Move);
        assert_eq!(ed.state().get(target).unwrap().position, start);
    }

    #[test]
    fn keys_route_through_shortcuts() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        ed.bootstrap(FilterState::show_all());
        let key = |k: &str, cmd: bool| InputEvent::Key {
            key: k.to_string(),
            modifiers: Modifiers {
                ctrl: cmd,
                ..Modifiers::NONE
            },
        };
        assert!(ed.handle_input(&key("a", true), None, &mut service));
        assert!(ed.handle_input(&key("Delete", false), None, &mut service));
        assert!(ed.state().is_empty());
        assert!(ed.handle_input(&key("z", true), None, &mut service));
        assert_eq!(ed.state().len(), 2);
        assert!(ed.handle_input(&key("=", true), None, &mut service));
        assert!(ed.state().viewport().zoom > 1.0);
    }

    #[test]
    fn scroll_pans_and_zooms() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        let changed = ed.handle_input(
            &InputEvent::Scroll {
                dx: 3.0,
                dy: 4.0,
                zoom: 2.0,
            },
            None,
            &mut service,
        );
        assert!(changed);
        let vp = ed.state().viewport();
        assert_eq!((vp.pan_x, vp.pan_y, vp.zoom), (3.0, 4.0, 2.0));
    }

    #[test]
    fn session_roundtrip_drops_unknown_entities() {
        let mut ed = editor();
        ed.bootstrap(FilterState::show_all());
        let saved = ed.save_session().unwrap();

        let mut other = editor();
        other.entity_deleted(id("ed2"));
        other.load_session(&saved).unwrap();
        assert_eq!(other.state().len(), 1);
        assert!(!other.history().can_undo());
        assert!(other.load_session("{").is_err());
    }

    #[test]
    fn undo_prunes_placements_deleted_upstream() {
        let mut ed = editor();
        let mut service = RecordingTagService::new();
        ed.bootstrap(FilterState::show_all());
        let target = ed.state().placements()[0].id;
        ed.handle_input(
            &InputEvent::PointerDown {
                pointer_id: 1,
                x: 0.0,
                y: 0.0,
                modifiers: Modifiers::NONE,
            },
            Some(target),
            &mut service,
        );
        ed.handle_input(&InputEvent::up(1, 40.0, 0.0), None, &mut service);
        ed.entity_deleted(id("ed1"));
        ed.entity_deleted(id("ed2"));
        assert!(ed.state().is_empty());
        let step = ed.undo(&mut service).unwrap();
        assert_eq!(step.kind, ActionKind::Move);
        assert!(ed.state().is_empty(), "restored placements of deleted songs are pruned");
        assert!(ed.state().selection().is_empty());
    }
}
