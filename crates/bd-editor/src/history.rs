//! Undo/redo over serialized document snapshots.
//!
//! Snapshots, not diffs: each undo step is the full serialized content
//! from before a change. A drag or resize gesture produces many tree
//! mutations but exactly one step — `begin_gesture` captures the baseline
//! and `end_gesture` commits it only if the gesture changed anything.

use bd_core::error::EditError;

use crate::sync::SyncEngine;

const MAX_DEPTH: usize = 100;

/// Snapshot-batched undo/redo stack.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<String>,
    redo: Vec<String>,
    /// Baseline captured at gesture start, pending commit.
    gesture_base: Option<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record the current document before a discrete change (template
    /// insert, style drop, delete). New actions invalidate the redo arm.
    pub fn record(&mut self, engine: &mut SyncEngine) {
        let snapshot = engine.content().to_string();
        self.push_undo(snapshot);
        self.redo.clear();
    }

    /// Start batching: everything until `end_gesture` becomes one step.
    /// A second begin while one is open is ignored — the outermost
    /// baseline wins.
    pub fn begin_gesture(&mut self, engine: &mut SyncEngine) {
        if self.gesture_base.is_none() {
            self.gesture_base = Some(engine.content().to_string());
        }
    }

    /// Commit the open gesture. A gesture that changed nothing (a drag
    /// that was cancelled, a zero-delta resize) leaves no step behind.
    pub fn end_gesture(&mut self, engine: &mut SyncEngine) {
        if let Some(base) = self.gesture_base.take()
            && base != engine.content()
        {
            self.push_undo(base);
            self.redo.clear();
        }
    }

    /// Step back. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, engine: &mut SyncEngine) -> Result<bool, EditError> {
        let Some(snapshot) = self.undo.pop() else {
            return Ok(false);
        };
        self.redo.push(engine.content().to_string());
        engine.replace_content(&snapshot)?;
        Ok(true)
    }

    /// Step forward again. Returns `false` when the redo arm is empty.
    pub fn redo(&mut self, engine: &mut SyncEngine) -> Result<bool, EditError> {
        let Some(snapshot) = self.redo.pop() else {
            return Ok(false);
        };
        self.undo.push(engine.content().to_string());
        engine.replace_content(&snapshot)?;
        Ok(true)
    }

    fn push_undo(&mut self, snapshot: String) {
        if self.undo.len() == MAX_DEPTH {
            self.undo.remove(0);
        }
        self.undo.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::TreeMutation;
    use bd_core::id::BlockId;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<div class="draggable-row" data-block-id="h1x"><p>one</p></div>
<div class="draggable-row" data-block-id="h2x"><p>two</p></div>"#;

    #[test]
    fn undo_restores_previous_content() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let mut history = History::new();
        let before = engine.content().to_string();

        history.record(&mut engine);
        engine
            .apply_mutation(TreeMutation::RemoveBlock {
                id: BlockId::intern("h1x"),
            })
            .unwrap();
        assert_eq!(engine.tree().rows().len(), 1);

        assert!(history.undo(&mut engine).unwrap());
        assert_eq!(engine.content(), before);
        assert_eq!(engine.tree().rows().len(), 2);
    }

    #[test]
    fn redo_replays_the_undone_change() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let mut history = History::new();

        history.record(&mut engine);
        engine
            .apply_mutation(TreeMutation::RemoveBlock {
                id: BlockId::intern("h1x"),
            })
            .unwrap();
        let after = engine.content().to_string();

        history.undo(&mut engine).unwrap();
        assert!(history.redo(&mut engine).unwrap());
        assert_eq!(engine.content(), after);
    }

    #[test]
    fn gesture_batches_many_mutations_into_one_step() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let mut history = History::new();

        history.begin_gesture(&mut engine);
        for w in [120.0, 160.0, 200.0] {
            engine
                .apply_mutation(TreeMutation::ResizeBlock {
                    id: BlockId::intern("h1x"),
                    width: Some(w),
                    height: None,
                })
                .unwrap();
        }
        history.end_gesture(&mut engine);

        assert!(history.undo(&mut engine).unwrap());
        assert!(!history.can_undo());
        assert!(
            engine
                .tree()
                .get(BlockId::intern("h1x"))
                .unwrap()
                .dimensions
                .width
                .is_none()
        );
    }

    #[test]
    fn unchanged_gesture_leaves_no_step() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let mut history = History::new();

        history.begin_gesture(&mut engine);
        history.end_gesture(&mut engine);
        assert!(!history.can_undo());
    }

    #[test]
    fn new_action_clears_redo() {
        let mut engine = SyncEngine::from_content(DOC).unwrap();
        let mut history = History::new();

        history.record(&mut engine);
        engine
            .apply_mutation(TreeMutation::RemoveBlock {
                id: BlockId::intern("h1x"),
            })
            .unwrap();
        history.undo(&mut engine).unwrap();
        assert!(history.can_redo());

        history.record(&mut engine);
        engine
            .apply_mutation(TreeMutation::RemoveBlock {
                id: BlockId::intern("h2x"),
            })
            .unwrap();
        assert!(!history.can_redo());
    }
}
