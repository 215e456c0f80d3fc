//! Read-only contracts for canonical entities and song/tag membership,
//! plus `Catalog`, the in-memory implementation that also serves as the
//! local tag-membership mirror.

use crate::id::EntityId;
use crate::model::{Song, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Lookup of canonical songs and tags.
pub trait EntityProvider {
    fn song(&self, id: EntityId) -> Option<&Song>;

    fn tag(&self, id: EntityId) -> Option<&Tag>;

    /// All canonical song ids, in a stable order.
    fn song_ids(&self) -> Vec<EntityId>;

    /// Whether `id` names a known song or tag.
    fn contains(&self, id: EntityId) -> bool {
        self.song(id).is_some() || self.tag(id).is_some()
    }
}

/// Lookup from tag id to the songs currently carrying it.
pub trait MembershipIndex {
    fn songs_for_tag(&self, tag: EntityId) -> Option<&HashSet<EntityId>>;
}

/// Full library payload as delivered by a bootstrap / resync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub songs: Vec<Song>,
    pub tags: Vec<Tag>,
    /// `(song, tag)` rows.
    pub membership: Vec<(EntityId, EntityId)>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: HashMap<EntityId, Song>,
    song_order: Vec<EntityId>,
    tags: HashMap<EntityId, Tag>,
    membership: HashMap<EntityId, HashSet<EntityId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let mut catalog = Self::new();
        for song in seed.songs {
            catalog.insert_song(song);
        }
        for tag in seed.tags {
            catalog.insert_tag(tag);
        }
        for (song, tag) in seed.membership {
            catalog.tag_song(song, tag);
        }
        catalog
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let seed: CatalogSeed = serde_json::from_str(text)?;
        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a song. Replacing keeps its original order slot.
    pub fn insert_song(&mut self, song: Song) {
        if !self.songs.contains_key(&song.id) {
            self.song_order.push(song.id);
        }
        self.songs.insert(song.id, song);
    }

    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.insert(tag.id, tag);
    }

    /// Record that `song` carries `tag`. Returns true if it was newly added.
    pub fn tag_song(&mut self, song: EntityId, tag: EntityId) -> bool {
        self.membership.entry(tag).or_default().insert(song)
    }

    /// Drop `tag` from `song`. Returns true if the pair was present.
    pub fn untag_song(&mut self, song: EntityId, tag: EntityId) -> bool {
        let Some(songs) = self.membership.get_mut(&tag) else {
            return false;
        };
        let removed = songs.remove(&song);
        if songs.is_empty() {
            self.membership.remove(&tag);
        }
        removed
    }

    pub fn has_tag(&self, song: EntityId, tag: EntityId) -> bool {
        self.membership
            .get(&tag)
            .is_some_and(|songs| songs.contains(&song))
    }

    /// Forget a song or tag and every membership row mentioning it.
    pub fn remove_entity(&mut self, id: EntityId) {
        if self.songs.remove(&id).is_some() {
            self.song_order.retain(|s| *s != id);
            for songs in self.membership.values_mut() {
                songs.remove(&id);
            }
            self.membership.retain(|_, songs| !songs.is_empty());
        }
        if self.tags.remove(&id).is_some() {
            self.membership.remove(&id);
        }
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }
}

impl EntityProvider for Catalog {
    fn song(&self, id: EntityId) -> Option<&Song> {
        self.songs.get(&id)
    }

    fn tag(&self, id: EntityId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    fn song_ids(&self) -> Vec<EntityId> {
        self.song_order.clone()
    }
}

impl MembershipIndex for Catalog {
    fn songs_for_tag(&self, tag: EntityId) -> Option<&HashSet<EntityId>> {
        self.membership.get(&tag)
    }
}
