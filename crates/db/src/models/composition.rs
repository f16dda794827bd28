//! Composition node models and DTOs.

use partlist_core::history::NodeValues;
use partlist_core::tree::TreeNode;
use partlist_core::types::{DbId, SortKey, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `composition_nodes` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CompositionNode {
    pub id: DbId,
    /// `None` for a product root.
    pub parent_id: Option<DbId>,
    pub sort_key: SortKey,
    pub part_id: DbId,
    pub quantity: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CompositionNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The row's editable fields.
    pub fn values(&self) -> NodeValues {
        NodeValues {
            node_id: self.id,
            parent_id: self.parent_id,
            sort_key: self.sort_key,
            part_id: self.part_id,
            quantity: self.quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Fields of a node about to be inserted with a store-assigned id.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub parent_id: Option<DbId>,
    pub sort_key: SortKey,
    pub part_id: DbId,
    pub quantity: Option<i32>,
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// A node joined with its part, as loaded for a whole product tree.
#[derive(Debug, Clone, FromRow)]
pub struct CompositionTreeRow {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub sort_key: SortKey,
    pub part_id: DbId,
    pub part_code: String,
    pub part_name: String,
    pub quantity: Option<i32>,
}

impl From<CompositionTreeRow> for TreeNode {
    fn from(row: CompositionTreeRow) -> Self {
        TreeNode {
            id: row.id,
            parent_id: row.parent_id,
            sort_key: row.sort_key,
            part_id: row.part_id,
            part_code: row.part_code,
            part_name: row.part_name,
            quantity: row.quantity,
        }
    }
}

/// A product root as shown in the product list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductSummary {
    pub id: DbId,
    pub part_id: DbId,
    pub part_code: String,
    pub part_name: String,
    pub created_at: Timestamp,
}

/// One page of product roots.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductSummary>,
    pub total_count: i64,
}
