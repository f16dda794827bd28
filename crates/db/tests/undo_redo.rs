//! Integration tests for change-set history replay.
//!
//! - Round trip: n edits followed by n undos restore the starting rows
//! - Undo/redo are inverses of each other
//! - A new edit after undo discards the redo branch
//! - Undo of a delete resurrects nodes under their original ids
//! - Corrupted trails fail in both directions without moving the pointer

use assert_matches::assert_matches;
use partlist_core::composition::InsertPosition;
use partlist_core::error::CoreError;
use partlist_db::EditError;
use partlist_db::editor::CompositionEditor;
use partlist_db::history::{self, ChangeSetRecorder};
use partlist_db::models::part::CreatePart;
use partlist_db::repositories::{ChangeSetRepo, PartRepo, UndoRedoPointerRepo};
use partlist_db::tree_reader::read_product_tree;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type NodeRow = (i64, Option<i64>, i32, i64, Option<i32>);

async fn seed_parts(pool: &PgPool, codes: &[&str]) -> Vec<i64> {
    let mut ids = Vec::new();
    for code in codes {
        let part = PartRepo::create(
            pool,
            &CreatePart {
                code: code.to_string(),
                name: format!("Part {code}"),
            },
        )
        .await
        .unwrap();
        ids.push(part.id);
    }
    ids
}

async fn all_nodes(pool: &PgPool) -> Vec<NodeRow> {
    sqlx::query_as("SELECT id, parent_id, sort_key, part_id, quantity FROM composition_nodes ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

async fn pointer(pool: &PgPool, product_id: i64) -> Option<i64> {
    let mut conn = pool.acquire().await.unwrap();
    UndoRedoPointerRepo::find_by_product(&mut conn, product_id)
        .await
        .unwrap()
        .map(|p| p.change_set_id)
}

/// Product `A` with `B(3)` under the root and `C(2)` under `B`.
/// Returns `(root, b, c)`.
async fn small_product(pool: &PgPool) -> (i64, i64, i64) {
    let root = CompositionEditor::create_product(pool, "A")
        .await
        .unwrap()
        .product_id;
    let b = CompositionEditor::insert_child(pool, root, root, "B", 3)
        .await
        .unwrap()
        .node_id;
    let c = CompositionEditor::insert_child(pool, root, b, "C", 2)
        .await
        .unwrap()
        .node_id;
    (root, b, c)
}

// ---------------------------------------------------------------------------
// Test: round trip
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undoing_every_edit_restores_starting_rows(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D", "E"]).await;
    let (root, b, c) = small_product(&pool).await;
    let start = all_nodes(&pool).await;

    let d = CompositionEditor::insert_sibling(&pool, root, b, "D", 4)
        .await
        .unwrap()
        .node_id;
    CompositionEditor::insert_child(&pool, root, c, "E", 5)
        .await
        .unwrap();
    CompositionEditor::modify_quantity(&pool, root, c, "C", 9)
        .await
        .unwrap();
    CompositionEditor::move_node(&pool, root, d, c, InsertPosition::After)
        .await
        .unwrap();
    CompositionEditor::delete_node(&pool, root, b).await.unwrap();
    assert_ne!(all_nodes(&pool).await, start);

    for _ in 0..5 {
        history::undo(&pool, root).await.unwrap();
    }

    assert_eq!(all_nodes(&pool).await, start);
    let status = history::status(&pool, root).await.unwrap();
    assert!(status.can_undo);
    assert!(status.can_redo);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_to_start_removes_pointer(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C"]).await;
    let (root, _, _) = small_product(&pool).await;

    history::undo(&pool, root).await.unwrap();
    let tree = history::undo(&pool, root).await.unwrap();

    assert!(!tree.can_undo);
    assert!(tree.can_redo);
    assert!(tree.nodes[0].children.is_empty());
    assert_eq!(pointer(&pool, root).await, None);
}

// ---------------------------------------------------------------------------
// Test: undo/redo inverse
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redo_after_undo_restores_tree(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, b, _) = small_product(&pool).await;
    CompositionEditor::insert_sibling(&pool, root, b, "D", 1)
        .await
        .unwrap();
    let edited = read_product_tree(&pool, root).await.unwrap();

    history::undo(&pool, root).await.unwrap();
    let redone = history::redo(&pool, root).await.unwrap();

    assert_eq!(redone.nodes, edited.nodes);
    assert!(redone.can_undo);
    assert!(!redone.can_redo);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_after_redo_restores_tree(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C"]).await;
    let (root, _, c) = small_product(&pool).await;
    CompositionEditor::modify_quantity(&pool, root, c, "C", 4)
        .await
        .unwrap();
    history::undo(&pool, root).await.unwrap();
    history::undo(&pool, root).await.unwrap();
    let middle = read_product_tree(&pool, root).await.unwrap();
    assert!(middle.can_undo && middle.can_redo);

    history::redo(&pool, root).await.unwrap();
    let back = history::undo(&pool, root).await.unwrap();

    assert_eq!(back.nodes, middle.nodes);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redo_from_start_replays_first_change_set(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C"]).await;
    let (root, b, _) = small_product(&pool).await;
    history::undo(&pool, root).await.unwrap();
    history::undo(&pool, root).await.unwrap();
    assert_eq!(pointer(&pool, root).await, None);

    let tree = history::redo(&pool, root).await.unwrap();
    let first = ChangeSetRepo::list_by_product(&pool, root).await.unwrap()[0].id;

    assert_eq!(pointer(&pool, root).await, Some(first));
    assert_eq!(tree.nodes[0].children[0].node_id, b);
    assert!(tree.nodes[0].children[0].children.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_and_redo_at_extremes_are_noops(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C"]).await;
    let root = CompositionEditor::create_product(&pool, "A")
        .await
        .unwrap()
        .product_id;

    let tree = history::undo(&pool, root).await.unwrap();
    assert!(!tree.can_undo && !tree.can_redo);
    let tree = history::redo(&pool, root).await.unwrap();
    assert!(!tree.can_undo && !tree.can_redo);

    CompositionEditor::insert_child(&pool, root, root, "B", 1)
        .await
        .unwrap();
    let before = all_nodes(&pool).await;
    let tree = history::redo(&pool, root).await.unwrap();
    assert!(tree.can_undo && !tree.can_redo);
    assert_eq!(all_nodes(&pool).await, before);
}

// ---------------------------------------------------------------------------
// Test: branch discard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_edit_after_undo_discards_redo(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, b, _) = small_product(&pool).await;

    let tree = history::undo(&pool, root).await.unwrap();
    assert!(tree.can_redo);

    let inserted = CompositionEditor::insert_child(&pool, root, b, "D", 1)
        .await
        .unwrap();
    assert!(inserted.status.can_undo);
    assert!(!inserted.status.can_redo);
    assert_eq!(ChangeSetRepo::list_by_product(&pool, root).await.unwrap().len(), 2);

    let before = all_nodes(&pool).await;
    history::redo(&pool, root).await.unwrap();
    assert_eq!(all_nodes(&pool).await, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_from_start_discards_every_change_set(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, _, _) = small_product(&pool).await;
    history::undo(&pool, root).await.unwrap();
    history::undo(&pool, root).await.unwrap();

    CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap();

    let sets = ChangeSetRepo::list_by_product(&pool, root).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(pointer(&pool, root).await, Some(sets[0].id));
}

// ---------------------------------------------------------------------------
// Test: identity preservation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_delete_resurrects_original_rows(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, b, _) = small_product(&pool).await;
    CompositionEditor::insert_child(&pool, root, root, "D", 8)
        .await
        .unwrap();
    let before = all_nodes(&pool).await;

    CompositionEditor::delete_node(&pool, root, b).await.unwrap();
    assert_eq!(all_nodes(&pool).await.len(), 2);

    history::undo(&pool, root).await.unwrap();
    assert_eq!(all_nodes(&pool).await, before);

    // Redo deletes the very same rows again.
    history::redo(&pool, root).await.unwrap();
    let ids: Vec<i64> = all_nodes(&pool).await.into_iter().map(|n| n.0).collect();
    assert!(!ids.contains(&b));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_move_restores_positions(pool: PgPool) {
    seed_parts(&pool, &["A", "B", "C", "D", "E"]).await;
    let (root, b, c) = small_product(&pool).await;
    let d = CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap()
        .node_id;
    CompositionEditor::insert_child(&pool, root, root, "E", 1)
        .await
        .unwrap();
    let before = all_nodes(&pool).await;

    CompositionEditor::move_node(&pool, root, d, b, InsertPosition::Before)
        .await
        .unwrap();
    CompositionEditor::move_node(&pool, root, b, c, InsertPosition::After)
        .await
        .unwrap_err();
    history::undo(&pool, root).await.unwrap();

    assert_eq!(all_nodes(&pool).await, before);
}

// ---------------------------------------------------------------------------
// Test: corrupted history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_delete_of_removed_part_is_corruption(pool: PgPool) {
    let parts = seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, _, _) = small_product(&pool).await;
    let d = CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap()
        .node_id;
    CompositionEditor::delete_node(&pool, root, d).await.unwrap();
    let head = pointer(&pool, root).await;

    // Removing the part clears the snapshot's part reference.
    assert!(PartRepo::delete(&pool, parts[3]).await.unwrap());

    let result = history::undo(&pool, root).await;
    assert_matches!(result, Err(EditError::Core(CoreError::HistoryCorrupted(msg))) if msg.contains("part reference"));
    assert_eq!(pointer(&pool, root).await, head);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_create_of_vanished_node_is_corruption(pool: PgPool) {
    let parts = seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, _, _) = small_product(&pool).await;
    CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap();
    let head = pointer(&pool, root).await;
    let rows_before_undo = {
        // Deleting the part cascades to the node created above.
        assert!(PartRepo::delete(&pool, parts[3]).await.unwrap());
        all_nodes(&pool).await
    };

    let result = history::undo(&pool, root).await;
    assert_matches!(result, Err(EditError::Core(CoreError::HistoryCorrupted(_))));
    assert_eq!(pointer(&pool, root).await, head);
    assert_eq!(all_nodes(&pool).await, rows_before_undo);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redo_create_over_existing_node_is_corruption(pool: PgPool) {
    let parts = seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, _, _) = small_product(&pool).await;
    let d = CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap()
        .node_id;
    history::undo(&pool, root).await.unwrap();
    let head = pointer(&pool, root).await;

    // A row written outside the editor takes the id redo wants to bring back.
    sqlx::query(
        "INSERT INTO composition_nodes (id, parent_id, sort_key, part_id, quantity)
         VALUES ($1, $2, 5, $3, 2)",
    )
    .bind(d)
    .bind(root)
    .bind(parts[3])
    .execute(&pool)
    .await
    .unwrap();
    let rows_before_redo = all_nodes(&pool).await;

    let result = history::redo(&pool, root).await;
    assert_matches!(
        result,
        Err(EditError::Core(CoreError::HistoryCorrupted(msg))) if msg.contains("redo") && msg.contains("already exists")
    );
    assert_eq!(pointer(&pool, root).await, head);
    assert_eq!(all_nodes(&pool).await, rows_before_redo);
    assert!(history::status(&pool, root).await.unwrap().can_redo);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redo_delete_of_vanished_node_is_corruption(pool: PgPool) {
    let parts = seed_parts(&pool, &["A", "B", "C", "D"]).await;
    let (root, _, _) = small_product(&pool).await;
    let d = CompositionEditor::insert_child(&pool, root, root, "D", 1)
        .await
        .unwrap()
        .node_id;
    CompositionEditor::delete_node(&pool, root, d).await.unwrap();
    history::undo(&pool, root).await.unwrap();
    let head = pointer(&pool, root).await;

    // Deleting the part cascades to the node the redo would delete.
    assert!(PartRepo::delete(&pool, parts[3]).await.unwrap());
    let rows_before_redo = all_nodes(&pool).await;

    let result = history::redo(&pool, root).await;
    assert_matches!(result, Err(EditError::Core(CoreError::HistoryCorrupted(msg))) if msg.contains("missing"));
    assert_eq!(pointer(&pool, root).await, head);
    assert_eq!(all_nodes(&pool).await, rows_before_redo);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_of_unknown_product_not_found(pool: PgPool) {
    assert_matches!(
        history::undo(&pool, 4242).await,
        Err(EditError::Core(CoreError::NotFound { entity: "Product", .. }))
    );
    assert_matches!(
        history::status(&pool, 4242).await,
        Err(EditError::Core(CoreError::NotFound { .. }))
    );
}

// ---------------------------------------------------------------------------
// Test: recorder
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recorder_without_entries_refuses_to_finish(pool: PgPool) {
    seed_parts(&pool, &["A"]).await;
    let root = CompositionEditor::create_product(&pool, "A")
        .await
        .unwrap()
        .product_id;

    let mut tx = pool.begin().await.unwrap();
    let recorder = ChangeSetRecorder::begin(&mut tx, root).await.unwrap();
    assert_matches!(
        recorder.finish(&mut tx).await,
        Err(EditError::Core(CoreError::Internal(_)))
    );
}
