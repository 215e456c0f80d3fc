//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen events into a unified `InputEvent`
//! consumed by the drag/pan session logic. Coordinates are screen-space.

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// Identifies one physical pointer (mouse, finger, pen) for the lifetime of
/// a press.
pub type PointerId = u32;

#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        pointer_id: PointerId,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerMove {
        pointer_id: PointerId,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        pointer_id: PointerId,
        x: f32,
        y: f32,
    },

    /// Wheel / pinch. `zoom` is a factor (1.0 = no change; >1 = zoom in).
    Scroll { dx: f32, dy: f32, zoom: f32 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(pointer_id: PointerId, x: f32, y: f32) -> Self {
        Self::PointerDown {
            pointer_id,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(pointer_id: PointerId, x: f32, y: f32) -> Self {
        Self::PointerMove {
            pointer_id,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(pointer_id: PointerId, x: f32, y: f32) -> Self {
        Self::PointerUp { pointer_id, x, y }
    }
}
