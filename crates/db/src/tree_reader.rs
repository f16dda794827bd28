//! Tree Reader: loads a product tree and materializes it with used quantities.

use partlist_core::error::CoreError;
use partlist_core::tree::{materialize, ChildIndex, MaterializedNode};
use partlist_core::types::DbId;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::EditResult;
use crate::history;
use crate::repositories::CompositionRepo;

/// A product's materialized tree plus its undo/redo availability.
#[derive(Debug, Serialize)]
pub struct ProductTree {
    pub product_id: DbId,
    /// Always exactly one element: the product root.
    pub nodes: Vec<MaterializedNode>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Load every node of the product rooted at `product_id` into a [`ChildIndex`].
///
/// Fails with `NotFound` when `product_id` is not a product root.
pub async fn load_index(conn: &mut PgConnection, product_id: DbId) -> EditResult<ChildIndex> {
    let rows = CompositionRepo::load_tree(conn, product_id).await?;
    let is_root = rows
        .iter()
        .any(|r| r.id == product_id && r.parent_id.is_none());
    if !is_root {
        return Err(CoreError::NotFound {
            entity: "Product",
            id: product_id,
        }
        .into());
    }
    Ok(ChildIndex::new(rows.into_iter().map(Into::into).collect()))
}

/// Read a product tree on the caller's connection, typically inside the
/// transaction that just modified it.
pub async fn read_in(conn: &mut PgConnection, product_id: DbId) -> EditResult<ProductTree> {
    let index = load_index(conn, product_id).await?;
    let root = materialize(product_id, &index)?;
    let status = history::status_in(conn, product_id).await?;
    Ok(ProductTree {
        product_id,
        nodes: vec![root],
        can_undo: status.can_undo,
        can_redo: status.can_redo,
    })
}

/// Read a product tree and its undo/redo status in one transaction.
pub async fn read_product_tree(pool: &PgPool, product_id: DbId) -> EditResult<ProductTree> {
    let mut tx = pool.begin().await?;
    let tree = read_in(&mut tx, product_id).await?;
    tx.commit().await?;
    Ok(tree)
}
