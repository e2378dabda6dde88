//! Resize controller.
//!
//! One handle set per block: right edge (width), bottom edge (height),
//! corner (both). A session runs from pointer-down on a handle to
//! pointer-up; every pointer-move produces a clamped dimension write on
//! the model. At most one session is active at a time — a second
//! pointer-down while resizing is ignored, not queued.

use bd_core::error::EditError;
use bd_core::id::BlockId;
use bd_core::model::Dimensions;

use crate::input::{PointerEvent, PointerPhase};
use crate::sync::{SyncEngine, TreeMutation};

/// Smallest size a block can be dragged down to, in pixels.
pub const MIN_SIZE: f32 = 80.0;

/// Which handle the gesture grabbed. Each handle owns its axes: a width
/// handle never touches height and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Right,
    Bottom,
    Corner,
}

impl Handle {
    fn resizes_width(&self) -> bool {
        matches!(self, Handle::Right | Handle::Corner)
    }

    fn resizes_height(&self) -> bool {
        matches!(self, Handle::Bottom | Handle::Corner)
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveResize {
    id: BlockId,
    handle: Handle,
    start_x: f32,
    start_y: f32,
    start_width: f32,
    start_height: f32,
}

/// Drives resize gestures against the sync engine.
#[derive(Debug, Default)]
pub struct ResizeController {
    active: Option<ActiveResize>,
}

impl ResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Pointer-down on a handle. `fallback` supplies the block's rendered
    /// size when the model holds no explicit dimensions yet (auto-sized
    /// blocks — the host measured them). Ignored while a session is
    /// already running.
    pub fn begin(
        &mut self,
        engine: &SyncEngine,
        id: BlockId,
        handle: Handle,
        x: f32,
        y: f32,
        fallback: Dimensions,
    ) -> Result<(), EditError> {
        if self.active.is_some() {
            log::debug!("resize already active, ignoring second begin");
            return Ok(());
        }
        let block = engine.tree().get(id).ok_or(EditError::InvalidTarget)?;
        let start_width = block
            .dimensions
            .width
            .or(fallback.width)
            .unwrap_or(MIN_SIZE);
        let start_height = block
            .dimensions
            .height
            .or(fallback.height)
            .unwrap_or(MIN_SIZE);

        self.active = Some(ActiveResize {
            id,
            handle,
            start_x: x,
            start_y: y,
            start_width,
            start_height,
        });
        Ok(())
    }

    /// Pointer-move: delta from the gesture start, clamped to the floor.
    /// Returns the mutation it applied, `None` when no session is active.
    pub fn update(
        &mut self,
        engine: &mut SyncEngine,
        x: f32,
        y: f32,
    ) -> Result<Option<TreeMutation>, EditError> {
        let Some(active) = self.active else {
            return Ok(None);
        };

        let width = active
            .handle
            .resizes_width()
            .then(|| (active.start_width + (x - active.start_x)).max(MIN_SIZE));
        let height = active
            .handle
            .resizes_height()
            .then(|| (active.start_height + (y - active.start_y)).max(MIN_SIZE));

        let mutation = TreeMutation::ResizeBlock {
            id: active.id,
            width,
            height,
        };
        engine.apply_mutation(mutation.clone())?;
        Ok(Some(mutation))
    }

    /// Pointer-up: end the session and push the final dimensions to the
    /// external content (dimension writes are not input events).
    pub fn finish(&mut self, engine: &mut SyncEngine) {
        if self.active.take().is_some() {
            engine.flush_to_content();
        }
    }

    /// Drive an active session from a normalized pointer stream. `Down`
    /// is ignored here — starting a session needs the handle identity,
    /// which only `begin` carries.
    pub fn handle_pointer(
        &mut self,
        engine: &mut SyncEngine,
        event: PointerEvent,
    ) -> Result<(), EditError> {
        match event.phase {
            PointerPhase::Down => {}
            PointerPhase::Move => {
                self.update(engine, event.x, event.y)?;
            }
            PointerPhase::Up => self.finish(engine),
        }
        Ok(())
    }

    /// Pointer-up outside a valid context. No partial mutation survives
    /// beyond what `update` already wrote; the session just dies.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
