//! Canvas data model.
//!
//! A `Placement` is one visual instance of a canonical entity (song, tag,
//! or composite tag). The canonical records themselves (`Song`, `Tag`) are
//! owned by the persistence layer; the canvas only references them by
//! `EntityId`. Removing a placement never touches the entity.

use crate::id::{EntityId, InstanceId, now_millis};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Entities ────────────────────────────────────────────────────────────

/// What a placement shows. The declaration order is the grid layout's
/// group order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Song,
    Tag,
    CompositeTag,
}

impl EntityKind {
    /// Short prefix used inside generated instance ids.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Tag => "tag",
            EntityKind::CompositeTag => "combo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: EntityId,
    pub title: String,
    pub artist: String,
}

impl Song {
    pub fn new(id: &str, title: &str, artist: &str) -> Self {
        Self {
            id: EntityId::intern(id),
            title: title.to_string(),
            artist: artist.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Plain,
    /// Union of plain tags; expands to `Tag::components` for filtering and tagging.
    Composite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
    pub kind: TagKind,
    /// Component plain-tag ids (empty for plain tags).
    #[serde(default)]
    pub components: SmallVec<[EntityId; 4]>,
}

impl Tag {
    pub fn plain(id: &str, name: &str) -> Self {
        Self {
            id: EntityId::intern(id),
            name: name.to_string(),
            kind: TagKind::Plain,
            components: SmallVec::new(),
        }
    }

    pub fn composite(id: &str, name: &str, components: &[&str]) -> Self {
        Self {
            id: EntityId::intern(id),
            name: name.to_string(),
            kind: TagKind::Composite,
            components: components.iter().map(|c| EntityId::intern(c)).collect(),
        }
    }

    /// The placement kind used to show this tag on the canvas.
    pub fn entity_kind(&self) -> EntityKind {
        match self.kind {
            TagKind::Plain => EntityKind::Tag,
            TagKind::Composite => EntityKind::CompositeTag,
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// A point in canvas (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Pan offset and zoom factor of the unbounded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Set the zoom factor, clamped into `[min, max]`.
    pub fn set_zoom(&mut self, zoom: f32, min: f32, max: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(min, max);
        }
    }

    /// Convert a screen-space delta to a canvas-space delta.
    pub fn screen_delta_to_world(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.zoom, dy / self.zoom)
    }
}

// ─── Placement ───────────────────────────────────────────────────────────

/// A visual instance of exactly one canonical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: InstanceId,
    pub kind: EntityKind,
    pub entity: EntityId,
    pub position: Point,
    /// Stacking order; higher is drawn in front.
    pub z: i64,
    pub selected: bool,
    pub created_at_ms: u64,
}

impl Placement {
    /// Instance factory: fresh id, given position and stacking order.
    pub fn new(kind: EntityKind, entity: EntityId, position: Point, z: i64) -> Self {
        Self {
            id: InstanceId::generate(kind, entity),
            kind,
            entity,
            position,
            z,
            selected: false,
            created_at_ms: now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_factory_assigns_fresh_ids() {
        let song = EntityId::intern("s1");
        let a = Placement::new(EntityKind::Song, song, Point::ORIGIN, 0);
        let b = Placement::new(EntityKind::Song, song, Point::ORIGIN, 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.entity, b.entity);
        assert!(!a.selected);
    }

    #[test]
    fn viewport_zoom_is_clamped() {
        let mut vp = Viewport::default();
        vp.set_zoom(12.0, 0.1, 4.0);
        assert_eq!(vp.zoom, 4.0);
        vp.set_zoom(0.01, 0.1, 4.0);
        assert_eq!(vp.zoom, 0.1);
        vp.set_zoom(f32::NAN, 0.1, 4.0);
        assert_eq!(vp.zoom, 0.1);
    }

    #[test]
    fn composite_tag_maps_to_composite_kind() {
        let t = Tag::composite("mix", "Mix", &["a", "b"]);
        assert_eq!(t.entity_kind(), EntityKind::CompositeTag);
        assert_eq!(t.components.len(), 2);
        assert_eq!(Tag::plain("a", "A").entity_kind(), EntityKind::Tag);
    }
}
