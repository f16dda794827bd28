//! Composition editing operations.
//!
//! Each operation runs in one transaction:
//! lock product root → validate → open change set (discarding redo history)
//! → mutate with snapshots → tree check → advance pointer → commit.
//! Returning early with an error drops the transaction, which rolls it back,
//! so a failed edit leaves neither rows nor history behind.

use partlist_core::composition::{
    unknown_part_code, validate_move, validate_part_code, validate_quantity,
    validate_sibling_reference, InsertPosition, FIRST_SORT_KEY,
};
use partlist_core::cycle::ensure_acyclic;
use partlist_core::error::CoreError;
use partlist_core::history::UndoRedoStatus;
use partlist_core::tree::{materialize, ChildIndex};
use partlist_core::types::DbId;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::history::{self, ChangeSetRecorder};
use crate::models::composition::{CompositionNode, NewNode};
use crate::models::part::Part;
use crate::repositories::{CompositionRepo, PartRepo};
use crate::tree_reader::load_index;
use crate::{EditError, EditResult};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Result of creating a product root.
#[derive(Debug, Serialize)]
pub struct ProductCreated {
    pub product_id: DbId,
    pub part_name: String,
    #[serde(flatten)]
    pub status: UndoRedoStatus,
}

/// Result of inserting a node into a product.
#[derive(Debug, Serialize)]
pub struct NodeInserted {
    pub node_id: DbId,
    pub part_name: String,
    #[serde(flatten)]
    pub status: UndoRedoStatus,
}

/// Result of deleting a node and its subtree.
#[derive(Debug, Serialize)]
pub struct NodeDeleted {
    /// Number of composition rows removed, the target included.
    pub deleted: u64,
    /// `true` when the target was the product root and the whole product,
    /// history included, is gone.
    pub product_deleted: bool,
    #[serde(flatten)]
    pub status: UndoRedoStatus,
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Entry points for every edit of a product tree.
pub struct CompositionEditor;

impl CompositionEditor {
    /// Create a new product root for the part with `part_code`.
    ///
    /// Records no history: the root anchors its own change sets.
    pub async fn create_product(pool: &PgPool, part_code: &str) -> EditResult<ProductCreated> {
        validate_part_code(part_code)?;

        let mut tx = pool.begin().await?;
        let part = find_part(&mut tx, part_code).await?;
        let root = CompositionRepo::create(
            &mut tx,
            &NewNode {
                parent_id: None,
                sort_key: FIRST_SORT_KEY,
                part_id: part.id,
                quantity: None,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(product_id = root.id, part_code, "Product created");
        Ok(ProductCreated {
            product_id: root.id,
            part_name: part.name,
            status: UndoRedoStatus::default(),
        })
    }

    /// Delete whole products with all their nodes, change sets and pointers.
    ///
    /// All-or-nothing: an unknown id fails the call and nothing is deleted.
    /// Returns the number of composition rows removed.
    pub async fn delete_products(pool: &PgPool, product_ids: &[DbId]) -> EditResult<u64> {
        let mut ids = product_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(CoreError::Validation("No products selected".to_string()).into());
        }

        let mut tx = pool.begin().await?;
        let mut removed = 0;
        for &product_id in &ids {
            removed += delete_whole_product(&mut tx, product_id).await?;
        }
        tx.commit().await?;

        tracing::info!(products = ids.len(), nodes = removed, "Products deleted");
        Ok(removed)
    }

    /// Insert a new node directly before `reference_id`, shifting the
    /// reference and every later sibling one position down.
    pub async fn insert_sibling(
        pool: &PgPool,
        product_id: DbId,
        reference_id: DbId,
        part_code: &str,
        quantity: i32,
    ) -> EditResult<NodeInserted> {
        validate_sibling_reference(product_id, reference_id)?;
        validate_part_code(part_code)?;
        validate_quantity(quantity)?;

        let mut tx = pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        let part = find_part(&mut tx, part_code).await?;
        let index = load_index(&mut tx, product_id).await?;
        let reference = member_node(&mut tx, &index, product_id, reference_id).await?;

        let mut recorder = ChangeSetRecorder::begin(&mut tx, product_id).await?;
        shift_siblings(&mut tx, &mut recorder, reference.parent_id, reference.sort_key, None).await?;
        let node = recorder
            .create_node(
                &mut tx,
                &NewNode {
                    parent_id: reference.parent_id,
                    sort_key: reference.sort_key,
                    part_id: part.id,
                    quantity: Some(quantity),
                },
            )
            .await?;

        check_tree(&mut tx, product_id).await?;
        recorder.finish(&mut tx).await?;
        let status = history::status_in(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(product_id, node_id = node.id, reference_id, "Sibling inserted");
        Ok(NodeInserted {
            node_id: node.id,
            part_name: part.name,
            status,
        })
    }

    /// Append a new node as the last child of `parent_id`.
    pub async fn insert_child(
        pool: &PgPool,
        product_id: DbId,
        parent_id: DbId,
        part_code: &str,
        quantity: i32,
    ) -> EditResult<NodeInserted> {
        validate_part_code(part_code)?;
        validate_quantity(quantity)?;

        let mut tx = pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        let part = find_part(&mut tx, part_code).await?;
        let index = load_index(&mut tx, product_id).await?;
        let parent = member_node(&mut tx, &index, product_id, parent_id).await?;

        let sort_key = CompositionRepo::max_child_sort_key(&mut tx, parent.id)
            .await?
            .map_or(FIRST_SORT_KEY, |max| max + 1);

        let mut recorder = ChangeSetRecorder::begin(&mut tx, product_id).await?;
        let node = recorder
            .create_node(
                &mut tx,
                &NewNode {
                    parent_id: Some(parent.id),
                    sort_key,
                    part_id: part.id,
                    quantity: Some(quantity),
                },
            )
            .await?;

        check_tree(&mut tx, product_id).await?;
        recorder.finish(&mut tx).await?;
        let status = history::status_in(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(product_id, node_id = node.id, parent_id, "Child inserted");
        Ok(NodeInserted {
            node_id: node.id,
            part_name: part.name,
            status,
        })
    }

    /// Change the quantity of a non-root node.
    ///
    /// `part_code` must still name a catalog part; the node keeps its part.
    pub async fn modify_quantity(
        pool: &PgPool,
        product_id: DbId,
        node_id: DbId,
        part_code: &str,
        quantity: i32,
    ) -> EditResult<UndoRedoStatus> {
        if node_id == product_id {
            return Err(CoreError::Validation(
                "The product root has no quantity".to_string(),
            )
            .into());
        }
        validate_part_code(part_code)?;
        validate_quantity(quantity)?;

        let mut tx = pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        find_part(&mut tx, part_code).await?;
        let index = load_index(&mut tx, product_id).await?;
        let node = member_node(&mut tx, &index, product_id, node_id).await?;

        let mut recorder = ChangeSetRecorder::begin(&mut tx, product_id).await?;
        let mut values = node.values();
        values.quantity = Some(quantity);
        recorder.update_node(&mut tx, &node, &values).await?;
        check_tree(&mut tx, product_id).await?;

        recorder.finish(&mut tx).await?;
        let status = history::status_in(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(product_id, node_id, quantity, "Quantity modified");
        Ok(status)
    }

    /// Delete a node with its whole subtree.
    ///
    /// Deleting the product root removes the product outright and records no
    /// history. Any other node is deleted descendants first in depth-first
    /// pre-order, each row logged just before it is removed, the target last.
    pub async fn delete_node(
        pool: &PgPool,
        product_id: DbId,
        node_id: DbId,
    ) -> EditResult<NodeDeleted> {
        let mut tx = pool.begin().await?;

        if node_id == product_id {
            let deleted = delete_whole_product(&mut tx, product_id).await?;
            tx.commit().await?;
            tracing::info!(product_id, nodes = deleted, "Product deleted");
            return Ok(NodeDeleted {
                deleted,
                product_deleted: true,
                status: UndoRedoStatus::default(),
            });
        }

        lock_product(&mut tx, product_id).await?;
        let index = load_index(&mut tx, product_id).await?;
        let target = member_node(&mut tx, &index, product_id, node_id).await?;

        let mut recorder = ChangeSetRecorder::begin(&mut tx, product_id).await?;
        let mut deleted = 0;
        for descendant_id in index.descendants_preorder(node_id) {
            let node = fetch_node(&mut tx, descendant_id).await?;
            recorder.delete_node(&mut tx, &node).await?;
            deleted += 1;
        }
        recorder.delete_node(&mut tx, &target).await?;
        deleted += 1;

        recorder.finish(&mut tx).await?;
        let status = history::status_in(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(product_id, node_id, nodes = deleted, "Subtree deleted");
        Ok(NodeDeleted {
            deleted,
            product_deleted: false,
            status,
        })
    }

    /// Move `dragged_id` (with its subtree) next to `target_id`, making it a
    /// sibling of the target on the given side.
    pub async fn move_node(
        pool: &PgPool,
        product_id: DbId,
        dragged_id: DbId,
        target_id: DbId,
        position: InsertPosition,
    ) -> EditResult<UndoRedoStatus> {
        validate_move(product_id, dragged_id, target_id)?;

        let mut tx = pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        let index = load_index(&mut tx, product_id).await?;
        let dragged = member_node(&mut tx, &index, product_id, dragged_id).await?;
        let target = member_node(&mut tx, &index, product_id, target_id).await?;

        if index.descendants_preorder(dragged_id).contains(&target_id) {
            tracing::warn!(product_id, dragged_id, target_id, "Move into own subtree rejected");
            return Err(CoreError::CycleDetected(format!(
                "Node {dragged_id} cannot be moved into its own subtree"
            ))
            .into());
        }

        let mut recorder = ChangeSetRecorder::begin(&mut tx, product_id).await?;
        shift_siblings(
            &mut tx,
            &mut recorder,
            target.parent_id,
            position.first_shifted_sort_key(target.sort_key),
            Some(dragged_id),
        )
        .await?;

        let mut values = dragged.values();
        values.parent_id = target.parent_id;
        values.sort_key = position.landing_sort_key(target.sort_key);
        recorder.update_node(&mut tx, &dragged, &values).await?;

        check_tree(&mut tx, product_id).await?;
        recorder.finish(&mut tx).await?;
        let status = history::status_in(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::debug!(
            product_id,
            dragged_id,
            target_id,
            position = position.as_str(),
            "Node moved"
        );
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn lock_product(conn: &mut PgConnection, product_id: DbId) -> EditResult<CompositionNode> {
    CompositionRepo::lock_product(conn, product_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Product",
                id: product_id,
            }
            .into()
        })
}

async fn find_part(conn: &mut PgConnection, code: &str) -> EditResult<Part> {
    PartRepo::find_by_code(conn, code)
        .await?
        .ok_or_else(|| unknown_part_code(code).into())
}

async fn fetch_node(conn: &mut PgConnection, node_id: DbId) -> EditResult<CompositionNode> {
    CompositionRepo::find_by_id(conn, node_id)
        .await?
        .ok_or_else(|| node_not_found(node_id))
}

/// Fetch `node_id`, which must belong to the product indexed in `index`.
async fn member_node(
    conn: &mut PgConnection,
    index: &ChildIndex,
    product_id: DbId,
    node_id: DbId,
) -> EditResult<CompositionNode> {
    if index.get(node_id).is_none() {
        tracing::debug!(product_id, node_id, "Node is not part of product");
        return Err(node_not_found(node_id));
    }
    fetch_node(conn, node_id).await
}

fn node_not_found(node_id: DbId) -> EditError {
    CoreError::NotFound {
        entity: "CompositionNode",
        id: node_id,
    }
    .into()
}

/// Push every sibling under `parent_id` with `sort_key >= from` one position
/// down, logging each as an update. The unique sort constraint is deferred to
/// commit, so rows may collide while shifting.
async fn shift_siblings(
    conn: &mut PgConnection,
    recorder: &mut ChangeSetRecorder,
    parent_id: Option<DbId>,
    from: i32,
    exclude_id: Option<DbId>,
) -> EditResult<()> {
    let siblings = CompositionRepo::list_siblings_from(conn, parent_id, from, exclude_id).await?;
    for sibling in siblings.iter().rev() {
        let mut values = sibling.values();
        values.sort_key += 1;
        recorder.update_node(conn, sibling, &values).await?;
    }
    Ok(())
}

/// Reject the edit if it left a part-containment cycle or a used quantity
/// too large to report.
async fn check_tree(conn: &mut PgConnection, product_id: DbId) -> EditResult<()> {
    let index = load_index(conn, product_id).await?;
    if let Err(err) = ensure_acyclic(product_id, &index) {
        tracing::warn!(product_id, error = %err, "Edit rejected, cycle detected");
        return Err(err.into());
    }
    if let Err(err) = materialize(product_id, &index) {
        tracing::warn!(product_id, error = %err, "Edit rejected, used quantity out of range");
        return Err(err.into());
    }
    Ok(())
}

/// Remove a product root and every node under it without recording history.
/// Change sets and the pointer go with the root through FK cascades.
async fn delete_whole_product(conn: &mut PgConnection, product_id: DbId) -> EditResult<u64> {
    lock_product(conn, product_id).await?;
    let index = load_index(conn, product_id).await?;
    let mut ids = index.descendants_preorder(product_id);
    ids.push(product_id);
    Ok(CompositionRepo::delete_many(conn, &ids).await?)
}
