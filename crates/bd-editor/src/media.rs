//! Media upload dispatch.
//!
//! Uploads complete out-of-band: the dialog opens, the user picks a file,
//! and the file read finishes after an arbitrary delay — by which time the
//! block the upload was aimed at may have been dragged away or deleted.
//! A ticket captures the insertion context when the dialog opens;
//! completion re-validates it against the live tree instead of trusting a
//! stale reference.

use bd_core::error::EditError;
use bd_core::id::BlockId;
use bd_core::model::StyleAttr;
use bd_core::templates::{self, MediaKind, build_media_row, lookup_content};

use crate::drag::DropEffect;
use crate::sync::{SyncEngine, TreeMutation};

/// What an open uploader dialog will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Video,
    Gif,
    Icon,
    Sticker,
    /// The resolved URL becomes a row's background, not a new block.
    BackgroundImage,
}

impl From<MediaKind> for UploadKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => UploadKind::Image,
            MediaKind::Video => UploadKind::Video,
            MediaKind::Gif => UploadKind::Gif,
            MediaKind::Icon => UploadKind::Icon,
            MediaKind::Sticker => UploadKind::Sticker,
        }
    }
}

/// Issued when an uploader dialog opens; redeemed by `complete_upload`
/// when the file read resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub kind: UploadKind,
    /// The row the upload was aimed at, if the dialog was opened from a
    /// drop or a context menu on a specific block.
    pub target: Option<BlockId>,
}

impl UploadTicket {
    pub fn new(kind: UploadKind, target: Option<BlockId>) -> Self {
        Self { kind, target }
    }
}

/// Redeem a ticket with the resolved URL (object URL or data URL).
///
/// The ticket's target is re-validated first. A target that has since
/// been removed is a recoverable `StaleInsertionContext`: the media is
/// appended at the document end instead of being lost. The insertion is a
/// new block after the target, never an in-place replacement — the block
/// the user aimed at keeps its content.
pub fn complete_upload(
    engine: &mut SyncEngine,
    ticket: UploadTicket,
    url: &str,
) -> Result<DropEffect, EditError> {
    let root = BlockId::intern("root");

    let media_kind = match ticket.kind {
        UploadKind::BackgroundImage => {
            let target = ticket.target.ok_or(EditError::InvalidTarget)?;
            let row_id = engine.tree().row_of(target).ok_or_else(|| {
                log::warn!("background upload target {target} vanished");
                EditError::StaleInsertionContext
            })?;
            engine.apply_mutation(TreeMutation::SetStyle {
                id: row_id,
                attr: StyleAttr::BackgroundImage(url.to_string()),
            })?;
            engine.flush_to_content();
            return Ok(DropEffect::Styled { id: row_id });
        }
        UploadKind::Image => MediaKind::Image,
        UploadKind::Video => MediaKind::Video,
        UploadKind::Gif => MediaKind::Gif,
        UploadKind::Icon => MediaKind::Icon,
        UploadKind::Sticker => MediaKind::Sticker,
    };

    let index = match ticket.target {
        Some(target) if engine.tree().contains(target) => {
            let row_id = engine
                .tree()
                .row_of(target)
                .ok_or(EditError::InvalidTarget)?;
            let (_, pos) = engine
                .tree()
                .position_of(row_id)
                .ok_or(EditError::InvalidTarget)?;
            pos + 1
        }
        Some(target) => {
            log::warn!("upload target {target} vanished, appending at end");
            engine.tree().rows().len()
        }
        None => engine.tree().rows().len(),
    };

    engine.apply_mutation(TreeMutation::InsertBlock {
        parent: root,
        index,
        subtree: Box::new(build_media_row(media_kind, url)),
    })?;
    engine.flush_to_content();
    Ok(DropEffect::Inserted { rows: 1 })
}

// ─── Insert registry ─────────────────────────────────────────────────────

/// What inserting a content-template produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted { row: BlockId },
    UploadRequested(UploadTicket),
}

/// Explicit dispatch from content-template names to insert actions,
/// always invoked with the specific target block identity. Keeps the
/// context menu and toolbar off ambient globals: the caller says *where*,
/// the registry says *how*.
#[derive(Debug, Default)]
pub struct InsertRegistry;

impl InsertRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Insert the named template after `target` (or at the document end
    /// when `target` is `None`).
    pub fn insert(
        &self,
        engine: &mut SyncEngine,
        name: &str,
        target: Option<BlockId>,
    ) -> Result<InsertOutcome, EditError> {
        let template = lookup_content(name)
            .ok_or_else(|| EditError::MalformedPayload(format!("unknown template `{name}`")))?;

        if template.markup.is_empty() {
            return Ok(InsertOutcome::UploadRequested(UploadTicket::new(
                UploadKind::Image,
                target,
            )));
        }

        let index = match target {
            Some(t) => {
                let row_id = engine.tree().row_of(t).ok_or(EditError::InvalidTarget)?;
                let (_, pos) = engine
                    .tree()
                    .position_of(row_id)
                    .ok_or(EditError::InvalidTarget)?;
                pos + 1
            }
            None => engine.tree().rows().len(),
        };

        let subtree = templates::build_content_row(template);
        let row = subtree.block.id;
        engine.apply_mutation(TreeMutation::InsertBlock {
            parent: BlockId::intern("root"),
            index,
            subtree: Box::new(subtree),
        })?;
        engine.flush_to_content();
        Ok(InsertOutcome::Inserted { row })
    }
}
