//! Integration tests: drag sessions committing against the sync engine.

use bd_core::error::EditError;
use bd_core::id::BlockId;
use bd_core::model::{BlockKind, BoundingBox};
use bd_editor::drag::{DragSession, DropEffect, Side};
use bd_editor::input::{DragEvent, DragSource};
use bd_editor::sync::SyncEngine;

const FIVE_ROWS: &str = include_str!("fixtures/five_rows.html");

/// Rows are stacked 60px tall starting at y = 0 in these tests.
fn row_bounds(position: usize) -> BoundingBox {
    BoundingBox {
        x: 0.0,
        y: position as f32 * 60.0,
        width: 650.0,
        height: 60.0,
    }
}

fn row_ids(engine: &SyncEngine) -> Vec<&str> {
    engine
        .tree()
        .rows()
        .iter()
        .map(|&i| engine.tree().graph[i].id.as_str())
        .collect()
}

// ─── Internal moves ─────────────────────────────────────────────────────

#[test]
fn row_drag_to_front_reorders() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let before = engine.tree().count_blocks();
    let mut session = DragSession::new();

    session.start_internal(BlockId::intern("r2")).unwrap();
    // Hover the top quarter of row 0: resolves to Before.
    let indicator = session
        .drag_over(BlockId::intern("r0"), row_bounds(0), 10.0)
        .unwrap();
    assert_eq!(indicator.side, Side::Before);
    assert_eq!(indicator.indicator_y, 0.0);

    let effect = session.drop(&mut engine).unwrap();
    assert_eq!(
        effect,
        DropEffect::Moved {
            id: BlockId::intern("r2")
        }
    );

    assert_eq!(row_ids(&engine), vec!["r2", "r0", "r1", "r3", "r4"]);
    assert_eq!(engine.tree().count_blocks(), before);

    // The commit pushed the new order to the external content.
    let content = engine.content().to_string();
    let mut cursor = 0;
    for id in ["r2", "r0", "r1", "r3", "r4"] {
        let marker = format!("data-block-id=\"{id}\"");
        match content[cursor..].find(&marker) {
            Some(at) => cursor += at,
            None => panic!("row {id} out of order in content"),
        }
    }
}

#[test]
fn row_drag_downward_accounts_for_removal_shift() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_internal(BlockId::intern("r0")).unwrap();
    // Bottom half of row 2: After.
    session.drag_over(BlockId::intern("r2"), row_bounds(2), 170.0);
    session.drop(&mut engine).unwrap();

    assert_eq!(row_ids(&engine), vec!["r1", "r2", "r0", "r3", "r4"]);
}

#[test]
fn self_drop_is_a_no_op() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let before = row_ids(&engine)
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    let mut session = DragSession::new();

    session.start_internal(BlockId::intern("r1")).unwrap();
    session.drag_over(BlockId::intern("r1"), row_bounds(1), 70.0);
    let err = session.drop(&mut engine);
    assert_eq!(err, Err(EditError::InvalidTarget));

    assert_eq!(row_ids(&engine), before);
    assert!(!session.is_active());
}

#[test]
fn column_stays_inside_rows() {
    let doc = r#"<div class="draggable-row" data-block-id="a"><div class="column" data-column-id="a1"><p>1</p></div><div class="column" data-column-id="a2"><p>2</p></div></div>
<div class="draggable-row" data-block-id="b"><div class="column" data-column-id="b1"><p>3</p></div></div>"#;
    let mut engine = SyncEngine::from_content(doc).unwrap();
    let mut session = DragSession::new();

    // Reorder within the same row.
    session.start_internal(BlockId::intern("a2")).unwrap();
    session.drag_over(BlockId::intern("a1"), row_bounds(0), 10.0);
    session.drop(&mut engine).unwrap();
    let a_idx = engine.tree().index_of(BlockId::intern("a")).unwrap();
    let a_children: Vec<&str> = engine
        .tree()
        .children(a_idx)
        .iter()
        .map(|&i| engine.tree().graph[i].id.as_str())
        .collect();
    assert_eq!(a_children, vec!["a2", "a1"]);

    // Relocate into the other row's column list.
    session.start_internal(BlockId::intern("a1")).unwrap();
    session.drag_over(BlockId::intern("b1"), row_bounds(1), 110.0);
    session.drop(&mut engine).unwrap();
    assert_eq!(
        engine.tree().row_of(BlockId::intern("a1")),
        Some(BlockId::intern("b"))
    );
}

#[test]
fn dragged_row_cannot_enter_its_own_subtree() {
    let doc = r#"<div class="draggable-row" data-block-id="outer"><div class="column" data-column-id="inner"><p>x</p></div></div>"#;
    let mut engine = SyncEngine::from_content(doc).unwrap();
    let before = engine.tree().count_blocks();
    let mut session = DragSession::new();

    session.start_internal(BlockId::intern("outer")).unwrap();
    session.drag_over(BlockId::intern("inner"), row_bounds(0), 10.0);
    assert!(session.drop(&mut engine).is_err());
    assert_eq!(engine.tree().count_blocks(), before);
}

#[test]
fn untargeted_internal_drop_moves_to_end() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_internal(BlockId::intern("r1")).unwrap();
    session.drag_over(BlockId::intern("r3"), row_bounds(3), 190.0);
    session.drag_leave();
    session.drop(&mut engine).unwrap();

    assert_eq!(row_ids(&engine), vec!["r0", "r2", "r3", "r4", "r1"]);
}

// ─── External payloads ──────────────────────────────────────────────────

#[test]
fn two_column_layout_into_empty_document() {
    let mut engine = SyncEngine::new();
    let mut session = DragSession::new();

    session.start_external("layout-two-column-equal").unwrap();
    let effect = session.drop(&mut engine).unwrap();
    assert_eq!(effect, DropEffect::Inserted { rows: 1 });

    let tree = engine.tree();
    assert_eq!(tree.rows().len(), 1);
    let columns = tree.children(tree.rows()[0]);
    assert_eq!(columns.len(), 2);
    for &col in columns {
        match tree.graph[col].kind {
            BlockKind::Column { width_pct } => assert_eq!(width_pct, Some(0.5)),
            _ => panic!("layout child should be a column"),
        }
        // Each fresh column starts with a placeholder leaf.
        assert_eq!(tree.children(col).len(), 1);
        assert!(tree.graph[tree.children(col)[0]].kind.is_leaf());
    }
}

#[test]
fn two_row_layout_inserts_two_rows() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_external("layout-two-row").unwrap();
    session.drag_over(BlockId::intern("r0"), row_bounds(0), 50.0);
    let effect = session.drop(&mut engine).unwrap();

    assert_eq!(effect, DropEffect::Inserted { rows: 2 });
    assert_eq!(engine.tree().rows().len(), 7);
    // Both land directly after r0.
    assert_eq!(row_ids(&engine)[0], "r0");
    assert_eq!(row_ids(&engine)[3], "r1");
}

#[test]
fn content_template_inserts_at_resolved_side() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_external("button").unwrap();
    // Pointer above r1's midpoint: the button lands before it.
    session.drag_over(BlockId::intern("r1"), row_bounds(1), 65.0);
    session.drop(&mut engine).unwrap();

    let ids = row_ids(&engine);
    assert_eq!(ids.len(), 6);
    assert_eq!(ids[0], "r0");
    assert_eq!(ids[2], "r1");
    assert!(engine.content().contains("Click Me"));
}

#[test]
fn color_swatch_styles_the_hovered_row() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_external("color-#16a34a").unwrap();
    session.drag_over(BlockId::intern("r3"), row_bounds(3), 200.0);
    let effect = session.drop(&mut engine).unwrap();

    assert_eq!(
        effect,
        DropEffect::Styled {
            id: BlockId::intern("r3")
        }
    );
    assert_eq!(engine.tree().rows().len(), 5);
    assert_eq!(
        engine
            .tree()
            .get(BlockId::intern("r3"))
            .unwrap()
            .background()
            .unwrap()
            .to_hex(),
        "#16a34a"
    );
}

#[test]
fn color_swatch_over_nothing_cancels() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let before = engine.content().to_string();
    let mut session = DragSession::new();

    session.start_external("color-#16a34a").unwrap();
    let effect = session.drop(&mut engine).unwrap();
    assert_eq!(effect, DropEffect::Cancelled);
    assert_eq!(engine.content(), before);
}

#[test]
fn untargeted_payload_appends_at_end() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_external("divider").unwrap();
    session.drop(&mut engine).unwrap();

    let ids = row_ids(&engine);
    assert_eq!(ids.len(), 6);
    assert_eq!(&ids[..5], &["r0", "r1", "r2", "r3", "r4"]);
}

#[test]
fn image_payload_requests_an_upload() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    session.start_external("image").unwrap();
    session.drag_over(BlockId::intern("r2"), row_bounds(2), 130.0);
    let effect = session.drop(&mut engine).unwrap();

    match effect {
        DropEffect::UploadRequested(ticket) => {
            assert_eq!(ticket.target, Some(BlockId::intern("r2")));
        }
        other => panic!("expected an upload request, got {other:?}"),
    }
    // No structural change until the upload completes.
    assert_eq!(engine.tree().rows().len(), 5);
}

// ─── Event-stream adapter ───────────────────────────────────────────────

#[test]
fn event_stream_drives_a_full_gesture() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let mut session = DragSession::new();

    let events = [
        DragEvent::Start(DragSource::Block(BlockId::intern("r4"))),
        DragEvent::Over {
            target: BlockId::intern("r0"),
            bounds: row_bounds(0),
            pointer_y: 5.0,
        },
        DragEvent::Drop,
    ];
    let mut effects = Vec::new();
    for event in events {
        if let Some(effect) = session.handle(&mut engine, event).unwrap() {
            effects.push(effect);
        }
    }

    assert_eq!(
        effects,
        vec![DropEffect::Moved {
            id: BlockId::intern("r4")
        }]
    );
    assert_eq!(row_ids(&engine), vec!["r4", "r0", "r1", "r2", "r3"]);
}

#[test]
fn end_event_cancels_without_touching_the_tree() {
    let mut engine = SyncEngine::from_content(FIVE_ROWS).unwrap();
    let before = engine.content().to_string();
    let mut session = DragSession::new();

    session
        .handle(
            &mut engine,
            DragEvent::Start(DragSource::Payload("title".into())),
        )
        .unwrap();
    session.handle(&mut engine, DragEvent::End).unwrap();

    assert!(!session.is_active());
    assert_eq!(engine.content(), before);
}
