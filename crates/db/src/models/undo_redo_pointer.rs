//! Undo/redo cursor model.

use partlist_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `undo_redo_pointers` table. At most one per product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UndoRedoPointer {
    pub id: DbId,
    pub product_id: DbId,
    /// The most recently applied change set.
    pub change_set_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
