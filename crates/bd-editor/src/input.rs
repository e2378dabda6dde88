//! Normalized surface events.
//!
//! The host adapts whatever its UI layer produces (DOM events, native
//! window events) to these shapes; everything downstream is host-agnostic.

use bd_core::id::BlockId;
use bd_core::model::BoundingBox;

/// Raw pointer movement, consumed by the resize controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
        }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
        }
    }
}

/// What a drag gesture picked up, as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// An existing block's drag handle.
    Block(BlockId),
    /// A sidebar item's raw payload string.
    Payload(String),
}

/// One tick of a drag gesture, in gesture order.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Start(DragSource),
    /// Pointer over a block; `bounds` is that block's rendered box as the
    /// host measured it this tick.
    Over {
        target: BlockId,
        bounds: BoundingBox,
        pointer_y: f32,
    },
    /// Pointer left every drop target.
    Leave,
    Drop,
    /// Gesture abandoned (escape, drag cancelled by the platform).
    End,
}
