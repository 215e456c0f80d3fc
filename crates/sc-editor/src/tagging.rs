//! Tagging side effects and their replay.
//!
//! Applying a label talks to an external tagging service. The engine
//! records the pairs that went through as `EntryMeta::TagPairs`; undo asks
//! the service to retract them and redo to reapply them. Remote failures
//! are logged per pair and never block the local rollback: the canvas and
//! the local membership mirror always return to the expected shape, and the
//! remote side catches up at the next full resync.

use crate::history::{HistoryEntry, TagPair};
use sc_core::catalog::Catalog;
use sc_core::id::EntityId;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TagError {
    #[error("tagging service rejected {song} / {tag}: {reason}")]
    Rejected {
        song: EntityId,
        tag: EntityId,
        reason: String,
    },

    #[error("tagging service unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator that persists song/tag associations.
pub trait TagService {
    fn apply_tag(&mut self, song: EntityId, tag: EntityId) -> Result<(), TagError>;

    fn retract_tag(&mut self, song: EntityId, tag: EntityId) -> Result<(), TagError>;
}

/// Which way a pair is being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Retract,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Apply => "apply",
            Direction::Retract => "retract",
        })
    }
}

/// Outcome of replaying one entry's side effects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub attempted: usize,
    pub failed: Vec<(TagPair, TagError)>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send one pair in `direction`, logging a failure with full context.
pub fn send(
    service: &mut dyn TagService,
    pair: TagPair,
    direction: Direction,
) -> Result<(), TagError> {
    let result = match direction {
        Direction::Apply => service.apply_tag(pair.song, pair.tag),
        Direction::Retract => service.retract_tag(pair.song, pair.tag),
    };
    if let Err(err) = &result {
        log::warn!(
            "tagging: {direction} failed for song {} tag {}: {err}",
            pair.song,
            pair.tag
        );
    }
    result
}

fn replay(
    pairs: &[TagPair],
    direction: Direction,
    service: &mut dyn TagService,
    mirror: &mut Catalog,
) -> ReplayReport {
    let mut report = ReplayReport::default();
    for &pair in pairs {
        report.attempted += 1;
        match direction {
            Direction::Apply => mirror.tag_song(pair.song, pair.tag),
            Direction::Retract => mirror.untag_song(pair.song, pair.tag),
        };
        if let Err(err) = send(service, pair, direction) {
            report.failed.push((pair, err));
        }
    }
    if !report.is_clean() {
        log::warn!(
            "tagging: {} of {} {direction} call(s) failed; remote state lags until resync",
            report.failed.len(),
            report.attempted
        );
    }
    report
}

/// Reverse an undone entry's side effects (retract every recorded pair).
pub fn replay_undo(
    entry: &HistoryEntry,
    service: &mut dyn TagService,
    mirror: &mut Catalog,
) -> ReplayReport {
    replay(entry.meta.tag_pairs(), Direction::Retract, service, mirror)
}

/// Re-run a redone entry's side effects (reapply every recorded pair).
pub fn replay_redo(
    entry: &HistoryEntry,
    service: &mut dyn TagService,
    mirror: &mut Catalog,
) -> ReplayReport {
    replay(entry.meta.tag_pairs(), Direction::Apply, service, mirror)
}

/// In-memory `TagService` that records calls and can be told to fail
/// specific pairs. Used by tests and by hosts running without a backend.
#[derive(Debug, Default)]
pub struct RecordingTagService {
    pub calls: Vec<(Direction, TagPair)>,
    failing: Vec<TagPair>,
    offline: bool,
}

impl RecordingTagService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call for `(song, tag)` fail.
    pub fn fail_on(&mut self, song: EntityId, tag: EntityId) {
        self.failing.push(TagPair { song, tag });
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn calls_in(&self, direction: Direction) -> Vec<TagPair> {
        self.calls
            .iter()
            .filter(|(d, _)| *d == direction)
            .map(|(_, p)| *p)
            .collect()
    }

    fn record(&mut self, direction: Direction, song: EntityId, tag: EntityId) -> Result<(), TagError> {
        let pair = TagPair { song, tag };
        self.calls.push((direction, pair));
        if self.offline {
            return Err(TagError::Unavailable("offline".into()));
        }
        if self.failing.contains(&pair) {
            return Err(TagError::Rejected {
                song,
                tag,
                reason: "rejected by test double".into(),
            });
        }
        Ok(())
    }
}

impl TagService for RecordingTagService {
    fn apply_tag(&mut self, song: EntityId, tag: EntityId) -> Result<(), TagError> {
        self.record(Direction::Apply, song, tag)
    }

    fn retract_tag(&mut self, song: EntityId, tag: EntityId) -> Result<(), TagError> {
        self.record(Direction::Retract, song, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ActionKind, EntryMeta};
    use crate::store::CanvasState;

    fn pair(song: &str, tag: &str) -> TagPair {
        TagPair {
            song: EntityId::intern(song),
            tag: EntityId::intern(tag),
        }
    }

    fn entry(pairs: Vec<TagPair>) -> HistoryEntry {
        HistoryEntry {
            kind: ActionKind::ApplyLabel,
            snapshot: CanvasState::default().snapshot(),
            meta: EntryMeta::TagPairs(pairs),
        }
    }

    #[test]
    fn undo_retracts_every_pair_and_updates_mirror() {
        let p1 = pair("tg-s1", "tg-t");
        let p2 = pair("tg-s2", "tg-t");
        let mut mirror = Catalog::new();
        mirror.tag_song(p1.song, p1.tag);
        mirror.tag_song(p2.song, p2.tag);
        let mut service = RecordingTagService::new();

        let report = replay_undo(&entry(vec![p1, p2]), &mut service, &mut mirror);
        assert!(report.is_clean());
        assert_eq!(report.attempted, 2);
        assert_eq!(service.calls_in(Direction::Retract), vec![p1, p2]);
        assert!(!mirror.has_tag(p1.song, p1.tag));
        assert!(!mirror.has_tag(p2.song, p2.tag));
    }

    #[test]
    fn failures_do_not_stop_remaining_pairs() {
        let _ = env_logger::builder().is_test(true).try_init();
        let p1 = pair("tg-s3", "tg-t");
        let p2 = pair("tg-s4", "tg-t");
        let mut mirror = Catalog::new();
        let mut service = RecordingTagService::new();
        service.fail_on(p1.song, p1.tag);

        let report = replay_redo(&entry(vec![p1, p2]), &mut service, &mut mirror);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, p1);
        assert_eq!(service.calls_in(Direction::Apply), vec![p1, p2]);
        // Mirror follows the local history regardless of the remote echo.
        assert!(mirror.has_tag(p1.song, p1.tag));
        assert!(mirror.has_tag(p2.song, p2.tag));
    }

    #[test]
    fn entries_without_pairs_replay_nothing() {
        let mut mirror = Catalog::new();
        let mut service = RecordingTagService::new();
        let e = HistoryEntry {
            kind: ActionKind::Move,
            snapshot: CanvasState::default().snapshot(),
            meta: EntryMeta::None,
        };
        let report = replay_undo(&e, &mut service, &mut mirror);
        assert_eq!(report.attempted, 0);
        assert!(service.calls.is_empty());
    }
}
