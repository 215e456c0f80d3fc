//! Pointer sessions: dragging placements and panning the canvas.
//!
//! At most one session is in flight, bound to the pointer that started it.
//! Events from other pointers are ignored. A new pointer-down while a
//! session is still open (a missed pointer-up) finishes the stale session
//! first, so its moves land in history as one `Move` entry.
//!
//! A drag is batched: the snapshot is taken at pointer-down and a single
//! undo entry is pushed at pointer-up, and only if something moved.

use crate::history::{ActionKind, EntryMeta, HistoryStack, Snapshot};
use crate::input::{Modifiers, PointerId};
use crate::store::CanvasState;
use sc_core::id::InstanceId;

#[derive(Debug, Clone)]
pub enum PointerSession {
    Drag {
        pointer_id: PointerId,
        last: (f32, f32),
        targets: Vec<InstanceId>,
        before: Snapshot,
        moved: bool,
    },
    Pan {
        pointer_id: PointerId,
        last: (f32, f32),
    },
}

impl PointerSession {
    pub fn pointer_id(&self) -> PointerId {
        match self {
            PointerSession::Drag { pointer_id, .. } | PointerSession::Pan { pointer_id, .. } => {
                *pointer_id
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    session: Option<PointerSession>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&PointerSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.session, Some(PointerSession::Drag { .. }))
    }

    /// Start a session. `hit` is the placement under the pointer, if any.
    pub fn pointer_down(
        &mut self,
        state: &mut CanvasState,
        history: &mut HistoryStack,
        pointer_id: PointerId,
        at: (f32, f32),
        modifiers: Modifiers,
        hit: Option<InstanceId>,
    ) -> bool {
        let mut changed = false;
        if let Some(stale) = self.session.take() {
            log::debug!(
                "drag: pointer {pointer_id} down while pointer {} still active; finishing stale session",
                stale.pointer_id()
            );
            changed |= Self::finish(stale, history);
        }

        let hit = hit.filter(|id| state.contains(*id));
        let Some(hit_id) = hit else {
            if !modifiers.shift {
                changed |= state.clear_selection();
            }
            self.session = Some(PointerSession::Pan {
                pointer_id,
                last: at,
            });
            return changed;
        };

        if modifiers.shift {
            changed |= state.toggle(hit_id);
        } else if !state.is_selected(hit_id) {
            changed |= state.select_exclusive(hit_id);
        }

        if !state.is_selected(hit_id) {
            // Shift-click deselected it: nothing to drag.
            return changed;
        }

        changed |= state.bring_to_front(hit_id);
        self.session = Some(PointerSession::Drag {
            pointer_id,
            last: at,
            targets: state.selection().to_vec(),
            before: state.snapshot(),
            moved: false,
        });
        changed
    }

    pub fn pointer_move(
        &mut self,
        state: &mut CanvasState,
        pointer_id: PointerId,
        at: (f32, f32),
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.pointer_id() != pointer_id {
            return false;
        }

        match session {
            PointerSession::Drag {
                last,
                targets,
                moved,
                ..
            } => {
                let (dx, dy) = state
                    .viewport()
                    .screen_delta_to_world(at.0 - last.0, at.1 - last.1);
                *last = at;
                if dx == 0.0 && dy == 0.0 {
                    return false;
                }
                let any = state.move_by(targets, dx, dy);
                *moved |= any;
                any
            }
            PointerSession::Pan { last, .. } => {
                let (dx, dy) = (at.0 - last.0, at.1 - last.1);
                *last = at;
                if dx == 0.0 && dy == 0.0 {
                    return false;
                }
                state.pan_by(dx, dy);
                true
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        state: &mut CanvasState,
        history: &mut HistoryStack,
        pointer_id: PointerId,
        at: (f32, f32),
    ) -> bool {
        if self.session.as_ref().map(PointerSession::pointer_id) != Some(pointer_id) {
            return false;
        }
        let moved = self.pointer_move(state, pointer_id, at);
        match self.session.take() {
            Some(session) => Self::finish(session, history) || moved,
            None => moved,
        }
    }

    /// Abandon the session without waiting for pointer-up (e.g. focus lost).
    pub fn cancel(&mut self, history: &mut HistoryStack) -> bool {
        match self.session.take() {
            Some(session) => Self::finish(session, history),
            None => false,
        }
    }

    fn finish(session: PointerSession, history: &mut HistoryStack) -> bool {
        match session {
            PointerSession::Drag {
                before, moved: true, ..
            } => {
                history.push(ActionKind::Move, before, EntryMeta::None);
                true
            }
            _ => false,
        }
    }
}
