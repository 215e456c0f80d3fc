//! Deterministic grid layout.
//!
//! Sorts placements (songs, then tags, then composite tags; by name within
//! each group) and packs them left-to-right, top-to-bottom into as many
//! fixed-size columns as fit the container. Pure: same input, same output.

use crate::catalog::EntityProvider;
use crate::id::InstanceId;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Container geometry and cell metrics for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub container_width: f32,
    pub padding: f32,
    pub item_width: f32,
    pub item_height: f32,
    pub gap_x: f32,
    pub gap_y: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            container_width: 1280.0,
            padding: 24.0,
            item_width: 220.0,
            item_height: 64.0,
            gap_x: 16.0,
            gap_y: 16.0,
        }
    }
}

impl GridParams {
    /// Columns that fit: `max(1, floor((available + gap_x) / (item_width + gap_x)))`.
    pub fn columns(&self) -> usize {
        let available = self.container_width - 2.0 * self.padding;
        let stride = self.item_width + self.gap_x;
        if stride <= 0.0 {
            return 1;
        }
        let fit = ((available + self.gap_x) / stride).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }
}

/// Result of `grid_layout`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// One entry per input placement, in layout (sorted) order.
    pub positions: Vec<(InstanceId, Point)>,
    pub width: f32,
    pub height: f32,
    pub columns: usize,
    pub rows: usize,
}

impl GridLayout {
    pub fn position_of(&self, id: InstanceId) -> Option<Point> {
        self.positions
            .iter()
            .find_map(|(pid, p)| (*pid == id).then_some(*p))
    }

    /// Merge positions back onto `placements`, matching by instance id.
    pub fn apply_to(&self, placements: &mut [Placement]) {
        for placement in placements.iter_mut() {
            if let Some(p) = self.position_of(placement.id) {
                placement.position = p;
            }
        }
    }
}

/// Sort key of one placement. `primary` is compared first (lowercased
/// parts), then `full` (original case), then the ids.
#[derive(Debug)]
struct SortKey<'a> {
    kind: EntityKind,
    primary: Vec<String>,
    full: String,
    entity: &'a str,
    instance: &'a str,
}

impl<'a> SortKey<'a> {
    fn of(placement: &'a Placement, lookup: Option<&dyn EntityProvider>) -> Self {
        let (primary, full) = match (placement.kind, lookup) {
            (EntityKind::Song, Some(l)) => match l.song(placement.entity) {
                Some(song) => (
                    vec![song.title.to_lowercase(), song.artist.to_lowercase()],
                    format!("{} {}", song.title, song.artist),
                ),
                None => (Vec::new(), String::new()),
            },
            (EntityKind::Tag | EntityKind::CompositeTag, Some(l)) => match l.tag(placement.entity) {
                Some(tag) => (vec![tag.name.to_lowercase()], tag.name.clone()),
                None => (Vec::new(), String::new()),
            },
            (_, None) => (Vec::new(), String::new()),
        };
        Self {
            kind: placement.kind,
            primary,
            full,
            entity: placement.entity.as_str(),
            instance: placement.id.as_str(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.primary.cmp(&other.primary))
            .then_with(|| self.full.cmp(&other.full))
            .then_with(|| self.entity.cmp(other.entity))
            .then_with(|| self.instance.cmp(other.instance))
    }
}

/// Lay out `items` on a grid. Inputs are not modified.
pub fn grid_layout(
    items: &[Placement],
    params: &GridParams,
    lookup: Option<&dyn EntityProvider>,
) -> GridLayout {
    if items.is_empty() {
        return GridLayout {
            positions: Vec::new(),
            width: 2.0 * params.padding,
            height: 2.0 * params.padding,
            columns: 0,
            rows: 0,
        };
    }

    let mut keyed: Vec<(SortKey<'_>, &Placement)> = items
        .iter()
        .map(|p| (SortKey::of(p, lookup), p))
        .collect();
    keyed.sort_by(|a, b| a.0.compare(&b.0));

    let columns = params.columns();
    let rows = items.len().div_ceil(columns);

    let positions = keyed
        .iter()
        .enumerate()
        .map(|(i, (_, placement))| {
            let col = (i % columns) as f32;
            let row = (i / columns) as f32;
            let x = params.padding + col * (params.item_width + params.gap_x);
            let y = params.padding + row * (params.item_height + params.gap_y);
            (placement.id, Point::new(x, y))
        })
        .collect();

    let used_columns = columns.min(items.len());
    let width = 2.0 * params.padding + used_columns as f32 * params.item_width
        + (used_columns.saturating_sub(1)) as f32 * params.gap_x;
    let height = 2.0 * params.padding
        + rows as f32 * params.item_height
        + (rows.saturating_sub(1)) as f32 * params.gap_y;

    log::trace!(
        "grid_layout: {} items, {columns} cols x {rows} rows",
        items.len()
    );

    GridLayout {
        positions,
        width,
        height,
        columns,
        rows,
    }
}
