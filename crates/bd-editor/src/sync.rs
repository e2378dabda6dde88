//! Synchronizer: external content ↔ live block tree.
//!
//! Two representations of the same document exist at once: the external
//! serialized `content` string owned by the host application, and the live
//! block tree behind the directly-editable surface. The sync engine keeps
//! them consistent in both directions:
//!
//! - **External → live**: on first mount the tree is materialized from the
//!   host's content exactly once. Later external changes are applied only
//!   while the live surface does *not* hold input focus — overwriting a
//!   surface mid-edit would destroy the user's cursor and in-progress
//!   keystrokes. A change arriving during focus is deferred and replayed
//!   when focus is lost.
//!
//! - **Live → external**: every input event re-serializes the live markup
//!   into the tree and re-emits `content`. Structural mutations (drag,
//!   resize) are not input events — they go through `apply_mutation` and an
//!   explicit `flush_to_content` push.

use bd_core::emitter::emit_document;
use bd_core::error::EditError;
use bd_core::id::BlockId;
use bd_core::model::*;
use bd_core::parser::parse_fragment;

/// Result of an external → live sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The live tree was replaced with the external content.
    Applied,
    /// The live surface holds focus; the update is parked until blur.
    DeferredFocusHeld,
}

/// The sync engine holds the authoritative block tree and keeps the
/// external content string in step with it.
pub struct SyncEngine {
    /// The current block tree (single source of truth for structure).
    tree: BlockTree,

    /// Last known-good external serialization.
    content: String,

    /// Dirty flag: set when the tree changes and `content` needs re-emit.
    content_dirty: bool,

    /// Whether the live surface currently holds input focus.
    live_focused: bool,

    /// External update that arrived while focused, replayed on blur.
    deferred: Option<String>,
}

impl SyncEngine {
    /// First-mount materialization: parse the host's content once.
    pub fn from_content(content: &str) -> Result<Self, EditError> {
        let tree = parse_fragment(content)?;
        let canonical = emit_document(&tree);
        Ok(Self {
            tree,
            content: canonical,
            content_dirty: false,
            live_focused: false,
            deferred: None,
        })
    }

    /// Create an engine over an empty document.
    pub fn new() -> Self {
        let tree = BlockTree::new();
        let content = emit_document(&tree);
        Self {
            tree,
            content,
            content_dirty: false,
            live_focused: false,
            deferred: None,
        }
    }

    pub fn tree(&self) -> &BlockTree {
        &self.tree
    }

    // ─── Focus tracking ──────────────────────────────────────────────────

    pub fn is_focused(&self) -> bool {
        self.live_focused
    }

    /// Track surface focus. Losing focus replays a deferred external
    /// update, if one is parked.
    pub fn set_focus(&mut self, focused: bool) {
        self.live_focused = focused;
        if !focused
            && let Some(pending) = self.deferred.take()
        {
            // The deferral has already been accepted; a parse failure at
            // this point keeps the current document (recoverable).
            if let Err(e) = self.replace_content(&pending) {
                log::warn!("deferred external update dropped: {e}");
            }
        }
    }

    // ─── External → live ─────────────────────────────────────────────────

    /// Apply an external content change. Skipped while the surface holds
    /// focus — an active edit is never clobbered.
    pub fn set_content(&mut self, new_content: &str) -> Result<SyncOutcome, EditError> {
        if self.live_focused {
            self.deferred = Some(new_content.to_string());
            return Ok(SyncOutcome::DeferredFocusHeld);
        }
        self.replace_content(new_content)?;
        Ok(SyncOutcome::Applied)
    }

    /// Replace the document unconditionally — template loads and undo/redo
    /// use this path, where the overwrite *is* the user's intent.
    pub fn replace_content(&mut self, new_content: &str) -> Result<(), EditError> {
        let tree = parse_fragment(new_content)?;
        self.content = emit_document(&tree);
        self.tree = tree;
        self.content_dirty = false;
        self.deferred = None;
        Ok(())
    }

    // ─── Live → external ─────────────────────────────────────────────────

    /// Mirror a live-surface input event: the surface's current markup
    /// becomes the new tree and external content.
    ///
    /// A malformed fragment is a recoverable `SerializationFailure`: the
    /// last known-good content is retained and the edit is neither lost on
    /// the surface nor propagated — a tolerated inconsistency window.
    pub fn live_input(&mut self, live_markup: &str) -> Result<(), EditError> {
        match parse_fragment(live_markup) {
            Ok(tree) => {
                self.content = emit_document(&tree);
                self.tree = tree;
                self.content_dirty = false;
                Ok(())
            }
            Err(e) => {
                log::warn!("live surface not serializable, keeping last known-good: {e}");
                Err(e)
            }
        }
    }

    /// Apply a structural mutation from a drag/resize controller.
    /// The external push is deferred to `flush_to_content` — this is the
    /// hot path during a gesture.
    pub fn apply_mutation(&mut self, mutation: TreeMutation) -> Result<(), EditError> {
        match mutation {
            TreeMutation::MoveBlock {
                id,
                new_parent,
                index,
            } => {
                self.tree.move_block(id, new_parent, index)?;
            }
            TreeMutation::InsertBlock {
                parent,
                index,
                subtree,
            } => {
                let parent_idx = self.tree.index_of(parent).ok_or(EditError::InvalidTarget)?;
                self.tree.insert_subtree(parent_idx, index, *subtree)?;
            }
            TreeMutation::AppendBlock { parent, subtree } => {
                let parent_idx = self.tree.index_of(parent).ok_or(EditError::InvalidTarget)?;
                let len = self.tree.children(parent_idx).len();
                self.tree.insert_subtree(parent_idx, len, *subtree)?;
            }
            TreeMutation::RemoveBlock { id } => {
                if self.tree.remove(id).is_none() {
                    return Err(EditError::InvalidTarget);
                }
            }
            TreeMutation::ResizeBlock { id, width, height } => {
                let block = self.tree.get_mut(id).ok_or(EditError::InvalidTarget)?;
                if let Some(w) = width {
                    block.dimensions.width = Some(w);
                }
                if let Some(h) = height {
                    block.dimensions.height = Some(h);
                }
            }
            TreeMutation::SetStyle { id, attr } => {
                let block = self.tree.get_mut(id).ok_or(EditError::InvalidTarget)?;
                block.set_attr(attr);
            }
            TreeMutation::SetLeafContent { id, content } => {
                let block = self.tree.get_mut(id).ok_or(EditError::InvalidTarget)?;
                match &mut block.kind {
                    BlockKind::Leaf { content: c } => *c = content,
                    _ => return Err(EditError::InvalidTarget),
                }
            }
            TreeMutation::DuplicateBlock { id } => {
                let (parent, pos) = self.tree.position_of(id).ok_or(EditError::InvalidTarget)?;
                let idx = self.tree.index_of(id).ok_or(EditError::InvalidTarget)?;
                let mut clone = self.tree.clone_subtree(idx);
                clone.refresh_ids();
                self.tree.insert_subtree(parent, pos + 1, clone)?;
            }
        }

        self.content_dirty = true;
        Ok(())
    }

    /// Push: re-emit external content from the current tree.
    /// Drag/resize commits must call this — structural mutations are not
    /// input events and would otherwise never reach the host.
    pub fn flush_to_content(&mut self) {
        if self.content_dirty {
            self.content = emit_document(&self.tree);
            self.content_dirty = false;
        }
    }

    /// Current external content (flushes pending tree changes first).
    pub fn content(&mut self) -> &str {
        self.flush_to_content();
        &self.content
    }

    /// Peek the last pushed content without flushing.
    pub fn last_pushed_content(&self) -> &str {
        &self.content
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A structural mutation applied to the block tree by the drag/resize
/// controllers and the media dispatcher.
#[derive(Debug, Clone)]
pub enum TreeMutation {
    MoveBlock {
        id: BlockId,
        new_parent: BlockId,
        /// Position in the new parent's child list, interpreted after the
        /// moved block is unlinked.
        index: usize,
    },
    InsertBlock {
        parent: BlockId,
        index: usize,
        subtree: Box<Subtree>,
    },
    AppendBlock {
        parent: BlockId,
        subtree: Box<Subtree>,
    },
    RemoveBlock {
        id: BlockId,
    },
    /// Write explicit dimensions; `None` leaves that axis untouched.
    ResizeBlock {
        id: BlockId,
        width: Option<f32>,
        height: Option<f32>,
    },
    SetStyle {
        id: BlockId,
        attr: StyleAttr,
    },
    SetLeafContent {
        id: BlockId,
        content: String,
    },
    /// Clone a block subtree (fresh IDs) directly after the original.
    DuplicateBlock {
        id: BlockId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<div class="draggable-row" data-block-id="a"><p>one</p></div>
<div class="draggable-row" data-block-id="b"><p>two</p></div>"#;

    #[test]
    fn first_mount_materializes_once() {
        let engine = SyncEngine::from_content(DOC).unwrap();
        assert_eq!(engine.tree().rows().len(), 2);
    }

    #[test]
    fn external_change_applies_when_unfocused() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let outcome = engine
            .set_content(r#"<div class="draggable-row" data-block-id="c"><p>new</p></div>"#)
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Applied);
        assert_eq!(engine.tree().rows().len(), 1);
        assert!(engine.tree().contains(BlockId::intern("c")));
    }

    #[test]
    fn external_change_deferred_while_focused() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        engine.set_focus(true);

        let outcome = engine
            .set_content(r#"<div class="draggable-row" data-block-id="c"><p>new</p></div>"#)
            .unwrap();
        assert_eq!(outcome, SyncOutcome::DeferredFocusHeld);
        // Live tree untouched while focused.
        assert_eq!(engine.tree().rows().len(), 2);
        assert!(engine.tree().contains(BlockId::intern("a")));

        // Blur replays the parked update.
        engine.set_focus(false);
        assert_eq!(engine.tree().rows().len(), 1);
        assert!(engine.tree().contains(BlockId::intern("c")));
    }

    #[test]
    fn live_input_updates_external() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        engine
            .live_input(r#"<div class="draggable-row" data-block-id="a"><p>edited</p></div>"#)
            .unwrap();
        assert!(engine.content().contains("edited"));
        assert_eq!(engine.tree().rows().len(), 1);
    }

    #[test]
    fn malformed_live_input_keeps_last_known_good() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let before = engine.content().to_string();

        let err = engine.live_input(r#"<div class="draggable-row"><p>broken</div>"#);
        assert!(matches!(err, Err(EditError::SerializationFailure(_))));
        assert_eq!(engine.content(), before);
        assert_eq!(engine.tree().rows().len(), 2);
    }

    #[test]
    fn mutation_needs_explicit_flush() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        engine
            .apply_mutation(TreeMutation::ResizeBlock {
                id: BlockId::intern("a"),
                width: None,
                height: Some(140.0),
            })
            .unwrap();

        // Not yet pushed.
        assert!(!engine.last_pushed_content().contains("140"));
        engine.flush_to_content();
        assert!(engine.last_pushed_content().contains("height: 140px"));
    }

    #[test]
    fn duplicate_inserts_fresh_ids_after_original() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        engine
            .apply_mutation(TreeMutation::DuplicateBlock {
                id: BlockId::intern("a"),
            })
            .unwrap();

        let rows = engine.tree().rows().to_vec();
        assert_eq!(rows.len(), 3);
        assert_eq!(engine.tree().graph[rows[0]].id, BlockId::intern("a"));
        assert_ne!(engine.tree().graph[rows[1]].id, BlockId::intern("a"));
        assert_eq!(engine.tree().graph[rows[2]].id, BlockId::intern("b"));
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let emitted = engine.content().to_string();
        let engine2 = SyncEngine::from_content(&emitted).unwrap();
        assert_eq!(
            engine.tree().count_blocks(),
            engine2.tree().count_blocks()
        );
    }
}
