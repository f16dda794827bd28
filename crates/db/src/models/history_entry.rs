//! History entry model.

use partlist_core::error::CoreError;
use partlist_core::history::{HistoryRecord, NodeSnapshot};
use partlist_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `history_entries` table.
///
/// `action` is one of `create | update | delete` and `phase` one of
/// `before | after`; see [`partlist_core::history`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HistoryEntry {
    pub id: DbId,
    pub change_set_id: DbId,
    pub original_node_id: DbId,
    pub original_parent_id: Option<DbId>,
    pub sort_key: Option<i32>,
    pub part_id: Option<DbId>,
    pub quantity: Option<i32>,
    pub action: String,
    pub phase: String,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    /// Decode into the typed form used for replay planning.
    pub fn to_record(&self) -> Result<HistoryRecord, CoreError> {
        HistoryRecord::decode(
            self.id,
            &self.action,
            &self.phase,
            NodeSnapshot {
                node_id: self.original_node_id,
                parent_id: self.original_parent_id,
                sort_key: self.sort_key,
                part_id: self.part_id,
                quantity: self.quantity,
            },
        )
    }
}
