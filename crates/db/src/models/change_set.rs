//! Change set model.

use partlist_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `change_sets` table: one logical edit of a product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeSet {
    pub id: DbId,
    pub product_id: DbId,
    pub created_at: Timestamp,
}
