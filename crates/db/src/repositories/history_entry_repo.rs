//! Repository for the `history_entries` table.

use partlist_core::history::{HistoryAction, HistoryPhase};
use partlist_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::composition::CompositionNode;
use crate::models::history_entry::HistoryEntry;

/// Column list for `history_entries` queries.
const COLUMNS: &str = "id, change_set_id, original_node_id, original_parent_id, \
    sort_key, part_id, quantity, action, phase, created_at";

/// Provides append and replay reads for row-level history snapshots.
pub struct HistoryEntryRepo;

impl HistoryEntryRepo {
    /// Snapshot `node` into the change set.
    pub async fn record(
        conn: &mut PgConnection,
        change_set_id: DbId,
        node: &CompositionNode,
        action: HistoryAction,
        phase: HistoryPhase,
    ) -> Result<HistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO history_entries
                (change_set_id, original_node_id, original_parent_id,
                 sort_key, part_id, quantity, action, phase)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(change_set_id)
            .bind(node.id)
            .bind(node.parent_id)
            .bind(node.sort_key)
            .bind(node.part_id)
            .bind(node.quantity)
            .bind(action.as_str())
            .bind(phase.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    /// Entries of one change set in write order.
    pub async fn list_by_change_set(
        conn: &mut PgConnection,
        change_set_id: DbId,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history_entries WHERE change_set_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(change_set_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Count every entry recorded for a product.
    pub async fn count_by_product(pool: &PgPool, product_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM history_entries h
             JOIN change_sets c ON c.id = h.change_set_id
             WHERE c.product_id = $1",
        )
        .bind(product_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
