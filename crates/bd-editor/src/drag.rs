//! Drag and drop: drop-position resolution, payload decoding, and the
//! per-gesture session state machine.
//!
//! Two drag sources feed the same machinery. *Internal* drags pick up a
//! block already in the tree (it stays in the tree until commit — the
//! surface dims it, the model never loses it). *External* drags arrive
//! from the sidebar libraries as tagged payload strings and only become
//! structure at commit time.

use bd_core::error::EditError;
use bd_core::id::BlockId;
use bd_core::model::{BlockKind, BoundingBox, Color, StyleAttr};
use bd_core::parser::parse_fragment;
use bd_core::templates::{
    ContentTemplate, LayoutTemplate, MediaKind, build_content_row, build_layout_rows,
    lookup_content, lookup_layout,
};

use crate::input::{DragEvent, DragSource};
use crate::media::{UploadKind, UploadTicket};
use crate::sync::{SyncEngine, TreeMutation};

// ─── Drop position ───────────────────────────────────────────────────────

/// Which side of the hovered block the drop lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Resolved drop slot for the current pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropPosition {
    pub side: Side,
    /// Where the host should draw the insertion indicator line.
    pub indicator_y: f32,
}

/// Midpoint rule: above the vertical midpoint of the hovered block drops
/// before it, at or below drops after. Pure and idempotent — called on
/// every dragover tick with whatever geometry the host measured.
pub fn resolve_drop(pointer_y: f32, target: BoundingBox) -> DropPosition {
    if pointer_y < target.midpoint_y() {
        DropPosition {
            side: Side::Before,
            indicator_y: target.y,
        }
    } else {
        DropPosition {
            side: Side::After,
            indicator_y: target.bottom(),
        }
    }
}

// ─── Payloads ────────────────────────────────────────────────────────────

/// A decoded external drag payload.
///
/// The wire format is a tagged string: `layout-<id>` and `color-<hex>`
/// prefixes are discriminated before any structural interpretation, then
/// content-template names, then a raw markup fragment as the fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    Layout(&'static LayoutTemplate),
    Color(Color),
    Template(&'static ContentTemplate),
    /// A library entry that carries no markup and instead opens an
    /// uploader dialog (`image`).
    MediaRequest(MediaKind),
    /// Arbitrary markup fragment, validated to parse into at least one
    /// block.
    Markup(String),
}

impl DragPayload {
    pub fn parse(raw: &str) -> Result<Self, EditError> {
        if let Some(id) = raw.strip_prefix("layout-") {
            return lookup_layout(id)
                .map(DragPayload::Layout)
                .ok_or_else(|| EditError::MalformedPayload(format!("unknown layout `{id}`")));
        }
        if let Some(hex) = raw.strip_prefix("color-") {
            return Color::from_hex(hex)
                .map(DragPayload::Color)
                .ok_or_else(|| EditError::MalformedPayload(format!("bad color `{hex}`")));
        }
        if let Some(template) = lookup_content(raw) {
            if template.markup.is_empty() {
                return Ok(DragPayload::MediaRequest(MediaKind::Image));
            }
            return Ok(DragPayload::Template(template));
        }

        // Fallback: a markup fragment. It must yield at least one block.
        let tree = parse_fragment(raw)
            .map_err(|e| EditError::MalformedPayload(format!("unparseable fragment: {e}")))?;
        if tree.rows().is_empty() {
            return Err(EditError::MalformedPayload("empty fragment".into()));
        }
        Ok(DragPayload::Markup(raw.to_string()))
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// What the drag gesture picked up.
#[derive(Debug, Clone, PartialEq)]
enum Armed {
    Internal(BlockId),
    External(DragPayload),
}

#[derive(Debug, Clone, PartialEq)]
enum SessionState {
    Idle,
    Armed(Armed),
    Hovering {
        armed: Armed,
        target: BlockId,
        side: Side,
    },
}

/// Indicator update handed back to the host on hover changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropIndicator {
    pub target: BlockId,
    pub side: Side,
    pub indicator_y: f32,
}

/// What a committed drop did to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum DropEffect {
    /// An internal drag relocated an existing block.
    Moved { id: BlockId },
    /// An external payload inserted `rows` new top-level rows.
    Inserted { rows: usize },
    /// A color swatch restyled a row.
    Styled { id: BlockId },
    /// The payload opens an uploader dialog instead of mutating now.
    UploadRequested(UploadTicket),
    /// Nothing to do (a color swatch released over empty space).
    Cancelled,
}

/// One drag gesture. Transitions are strictly sequential; `drop` and
/// `drag_end` both collapse the session back to `Idle`, so a new gesture
/// can only begin once the previous one has fully settled.
#[derive(Debug, Default)]
pub struct DragSession {
    state: SessionState,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    /// Pick up a block already in the tree. The block is not detached —
    /// it moves only at commit.
    pub fn start_internal(&mut self, id: BlockId) -> Result<(), EditError> {
        if self.is_active() {
            return Err(EditError::InvalidTarget);
        }
        self.state = SessionState::Armed(Armed::Internal(id));
        Ok(())
    }

    /// Arm with a sidebar payload string. Decoding happens here, before
    /// any structural interpretation.
    pub fn start_external(&mut self, payload: &str) -> Result<(), EditError> {
        if self.is_active() {
            return Err(EditError::InvalidTarget);
        }
        let decoded = DragPayload::parse(payload)?;
        self.state = SessionState::Armed(Armed::External(decoded));
        Ok(())
    }

    /// Dragover tick. Returns an indicator update only when the resolved
    /// target/side actually changed — re-entry into the same slot is a
    /// no-op, so the indicator never thrashes within one block.
    pub fn drag_over(
        &mut self,
        target: BlockId,
        bounds: BoundingBox,
        pointer_y: f32,
    ) -> Option<DropIndicator> {
        let position = resolve_drop(pointer_y, bounds);

        let armed = match std::mem::take(&mut self.state) {
            SessionState::Idle => return None,
            SessionState::Armed(armed) => armed,
            SessionState::Hovering {
                armed,
                target: prev_target,
                side: prev_side,
            } => {
                if prev_target == target && prev_side == position.side {
                    self.state = SessionState::Hovering {
                        armed,
                        target: prev_target,
                        side: prev_side,
                    };
                    return None;
                }
                armed
            }
        };

        self.state = SessionState::Hovering {
            armed,
            target,
            side: position.side,
        };
        Some(DropIndicator {
            target,
            side: position.side,
            indicator_y: position.indicator_y,
        })
    }

    /// Pointer left the surface without a target; fall back to armed so a
    /// release appends at the document end.
    pub fn drag_leave(&mut self) {
        if let SessionState::Hovering { armed, .. } = std::mem::take(&mut self.state) {
            self.state = SessionState::Armed(armed);
        }
    }

    /// Cancellation from any state. The tree is untouched.
    pub fn drag_end(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Drive the session from a normalized event stream. `Over` swallows
    /// the indicator update (hosts that draw one call `drag_over`
    /// directly); only `Drop` yields an effect.
    pub fn handle(
        &mut self,
        engine: &mut SyncEngine,
        event: DragEvent,
    ) -> Result<Option<DropEffect>, EditError> {
        match event {
            DragEvent::Start(DragSource::Block(id)) => {
                self.start_internal(id)?;
                Ok(None)
            }
            DragEvent::Start(DragSource::Payload(raw)) => {
                self.start_external(&raw)?;
                Ok(None)
            }
            DragEvent::Over {
                target,
                bounds,
                pointer_y,
            } => {
                self.drag_over(target, bounds, pointer_y);
                Ok(None)
            }
            DragEvent::Leave => {
                self.drag_leave();
                Ok(None)
            }
            DragEvent::Drop => self.drop(engine).map(Some),
            DragEvent::End => {
                self.drag_end();
                Ok(None)
            }
        }
    }

    /// Commit the gesture. On success the mutated tree is pushed to the
    /// external content before the session returns to `Idle`; on failure
    /// the tree is untouched (every rejected move is atomic).
    pub fn drop(&mut self, engine: &mut SyncEngine) -> Result<DropEffect, EditError> {
        let state = std::mem::take(&mut self.state);
        let effect = match state {
            SessionState::Idle => return Err(EditError::InvalidTarget),
            SessionState::Armed(armed) => Self::commit_untargeted(engine, armed),
            SessionState::Hovering {
                armed,
                target,
                side,
            } => Self::commit_at(engine, armed, target, side),
        }?;

        engine.flush_to_content();
        Ok(effect)
    }

    // ── Commit paths ─────────────────────────────────────────────────────

    /// Release with no hover target: append at the document end.
    fn commit_untargeted(engine: &mut SyncEngine, armed: Armed) -> Result<DropEffect, EditError> {
        match armed {
            Armed::Internal(id) => {
                let block = engine.tree().get(id).ok_or(EditError::InvalidTarget)?;
                if !block.kind.is_row() {
                    // A column has no meaningful document-end slot.
                    return Err(EditError::InvalidTarget);
                }
                let end = engine.tree().rows().len().saturating_sub(1);
                engine.apply_mutation(TreeMutation::MoveBlock {
                    id,
                    new_parent: BlockId::intern("root"),
                    index: end,
                })?;
                Ok(DropEffect::Moved { id })
            }
            Armed::External(payload) => {
                let end = engine.tree().rows().len();
                Self::insert_payload(engine, payload, end, None)
            }
        }
    }

    /// Release over a resolved target slot.
    fn commit_at(
        engine: &mut SyncEngine,
        armed: Armed,
        target: BlockId,
        side: Side,
    ) -> Result<DropEffect, EditError> {
        match armed {
            Armed::Internal(id) => Self::commit_move(engine, id, target, side),
            Armed::External(payload) => {
                let row_id = engine
                    .tree()
                    .row_of(target)
                    .ok_or(EditError::InvalidTarget)?;
                let (_, row_pos) = engine
                    .tree()
                    .position_of(row_id)
                    .ok_or(EditError::InvalidTarget)?;
                let index = row_pos + usize::from(side == Side::After);
                Self::insert_payload(engine, payload, index, Some(row_id))
            }
        }
    }

    fn commit_move(
        engine: &mut SyncEngine,
        id: BlockId,
        target: BlockId,
        side: Side,
    ) -> Result<DropEffect, EditError> {
        if id == target || engine.tree().is_ancestor_of(id, target) {
            return Err(EditError::InvalidTarget);
        }

        let kind = engine
            .tree()
            .get(id)
            .map(|b| b.kind.clone())
            .ok_or(EditError::InvalidTarget)?;

        let (new_parent, raw_index) = match kind {
            BlockKind::Row => {
                // Targets of any depth normalize to their row.
                let target_row = engine
                    .tree()
                    .row_of(target)
                    .ok_or(EditError::InvalidTarget)?;
                if target_row == id {
                    return Err(EditError::InvalidTarget);
                }
                let (_, pos) = engine
                    .tree()
                    .position_of(target_row)
                    .ok_or(EditError::InvalidTarget)?;
                (BlockId::intern("root"), pos + usize::from(side == Side::After))
            }
            BlockKind::Column { .. } => Self::column_slot(engine, target, side)?,
            _ => return Err(EditError::InvalidTarget),
        };

        // Same-parent reorder: the move index is interpreted after the
        // dragged block is unlinked, so account for the removal shift.
        let index = match engine.tree().position_of(id) {
            Some((old_parent, old_pos))
                if Some(old_parent) == engine.tree().index_of(new_parent)
                    && old_pos < raw_index =>
            {
                raw_index - 1
            }
            _ => raw_index,
        };

        engine.apply_mutation(TreeMutation::MoveBlock {
            id,
            new_parent,
            index,
        })?;
        Ok(DropEffect::Moved { id })
    }

    /// Where a dragged column may land: next to another column, or at the
    /// end of a row's column list. Anything else is rejected.
    fn column_slot(
        engine: &SyncEngine,
        target: BlockId,
        side: Side,
    ) -> Result<(BlockId, usize), EditError> {
        let tree = engine.tree();
        let target_block = tree.get(target).ok_or(EditError::InvalidTarget)?;

        if target_block.kind.is_column() {
            let (parent_idx, pos) = tree.position_of(target).ok_or(EditError::InvalidTarget)?;
            let parent_id = tree.graph[parent_idx].id;
            return Ok((parent_id, pos + usize::from(side == Side::After)));
        }

        // Row (or a leaf inside one): append to that row's children.
        let row_id = tree.row_of(target).ok_or(EditError::InvalidTarget)?;
        let row_idx = tree.index_of(row_id).ok_or(EditError::InvalidTarget)?;
        Ok((row_id, tree.children(row_idx).len()))
    }

    /// Materialize an external payload at a root-level `index`.
    /// `target_row` is the hovered row, when there was one.
    fn insert_payload(
        engine: &mut SyncEngine,
        payload: DragPayload,
        index: usize,
        target_row: Option<BlockId>,
    ) -> Result<DropEffect, EditError> {
        let root = BlockId::intern("root");
        match payload {
            DragPayload::Layout(template) => {
                let rows = build_layout_rows(template);
                let count = rows.len();
                for (offset, row) in rows.into_iter().enumerate() {
                    engine.apply_mutation(TreeMutation::InsertBlock {
                        parent: root,
                        index: index + offset,
                        subtree: Box::new(row),
                    })?;
                }
                Ok(DropEffect::Inserted { rows: count })
            }
            DragPayload::Template(template) => {
                engine.apply_mutation(TreeMutation::InsertBlock {
                    parent: root,
                    index,
                    subtree: Box::new(build_content_row(template)),
                })?;
                Ok(DropEffect::Inserted { rows: 1 })
            }
            DragPayload::Markup(raw) => {
                let fragment = parse_fragment(&raw)
                    .map_err(|e| EditError::MalformedPayload(e.to_string()))?;
                let rows: Vec<_> = fragment
                    .rows()
                    .iter()
                    .map(|&r| fragment.clone_subtree(r))
                    .collect();
                let count = rows.len();
                for (offset, row) in rows.into_iter().enumerate() {
                    engine.apply_mutation(TreeMutation::InsertBlock {
                        parent: root,
                        index: index + offset,
                        subtree: Box::new(row),
                    })?;
                }
                Ok(DropEffect::Inserted { rows: count })
            }
            DragPayload::Color(color) => match target_row {
                Some(row_id) => {
                    engine.apply_mutation(TreeMutation::SetStyle {
                        id: row_id,
                        attr: StyleAttr::Background(color),
                    })?;
                    Ok(DropEffect::Styled { id: row_id })
                }
                // A swatch over empty space styles nothing.
                None => Ok(DropEffect::Cancelled),
            },
            DragPayload::MediaRequest(kind) => Ok(DropEffect::UploadRequested(UploadTicket {
                kind: UploadKind::from(kind),
                target: target_row,
            })),
        }
    }
}
