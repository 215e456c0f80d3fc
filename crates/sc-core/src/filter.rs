//! Filter resolution: which songs qualify for a given filter state.
//!
//! Active tags are expanded (composite → components) and the membership
//! sets are intersected with AND semantics. Unknown or deleted tags simply
//! contribute nothing, so an impossible filter yields an empty result
//! rather than an error.

use crate::catalog::{EntityProvider, MembershipIndex};
use crate::id::EntityId;
use crate::model::TagKind;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

/// The externally owned filter selection, compared by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub active_tags: Vec<EntityId>,
    pub show_all: bool,
}

impl FilterState {
    pub fn show_all() -> Self {
        Self {
            active_tags: Vec::new(),
            show_all: true,
        }
    }

    pub fn tags(ids: &[&str]) -> Self {
        Self {
            active_tags: ids.iter().map(|s| EntityId::intern(s)).collect(),
            show_all: false,
        }
    }
}

/// Expand tag ids into plain tag ids: plain tags map to themselves,
/// composite tags to their components. Union, de-duplicated, first
/// occurrence order. Unknown ids are dropped.
pub fn expand_tags(tags: &[EntityId], provider: &dyn EntityProvider) -> SmallVec<[EntityId; 8]> {
    fn push(id: EntityId, out: &mut SmallVec<[EntityId; 8]>) {
        if !out.contains(&id) {
            out.push(id);
        }
    }

    let mut out: SmallVec<[EntityId; 8]> = SmallVec::new();
    for &id in tags {
        let Some(tag) = provider.tag(id) else {
            log::debug!("filter: ignoring unknown tag {id}");
            continue;
        };
        match tag.kind {
            TagKind::Plain => push(id, &mut out),
            TagKind::Composite => {
                for &component in &tag.components {
                    push(component, &mut out);
                }
            }
        }
    }
    out
}

/// Songs carrying every one of `tags` (AND), restricted to canonical songs,
/// in canonical song order.
pub fn intersect_membership(
    tags: &[EntityId],
    provider: &dyn EntityProvider,
    index: &dyn MembershipIndex,
) -> Vec<EntityId> {
    let Some((&first, rest)) = tags.split_first() else {
        return Vec::new();
    };

    let mut running: HashSet<EntityId> = match index.songs_for_tag(first) {
        Some(songs) => songs.clone(),
        None => return Vec::new(),
    };

    for tag in rest {
        if running.is_empty() {
            break;
        }
        match index.songs_for_tag(*tag) {
            Some(songs) => running.retain(|s| songs.contains(s)),
            None => running.clear(),
        }
    }

    if running.is_empty() {
        return Vec::new();
    }

    provider
        .song_ids()
        .into_iter()
        .filter(|id| running.contains(id))
        .collect()
}

/// Resolve the candidate song ids for `filter`.
pub fn resolve_songs(
    filter: &FilterState,
    provider: &dyn EntityProvider,
    index: &dyn MembershipIndex,
) -> Vec<EntityId> {
    if filter.active_tags.is_empty() {
        return if filter.show_all {
            provider.song_ids()
        } else {
            Vec::new()
        };
    }

    let expanded = expand_tags(&filter.active_tags, provider);
    if expanded.is_empty() {
        return Vec::new();
    }
    intersect_membership(&expanded, provider, index)
}
