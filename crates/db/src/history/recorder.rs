use partlist_core::error::CoreError;
use partlist_core::history::{HistoryAction, HistoryPhase, NodeValues};
use partlist_core::types::DbId;
use sqlx::PgConnection;

use crate::EditResult;
use crate::models::change_set::ChangeSet;
use crate::models::composition::{CompositionNode, NewNode};
use crate::repositories::{ChangeSetRepo, CompositionRepo, HistoryEntryRepo, UndoRedoPointerRepo};

/// Discard the product's redo-able future.
///
/// Deletes every change set newer than the pointer, or every change set of
/// the product when no pointer exists (the cursor sits before the first one).
/// Returns the number of change sets removed.
pub async fn truncate_future(conn: &mut PgConnection, product_id: DbId) -> Result<u64, sqlx::Error> {
    let pointer = UndoRedoPointerRepo::find_by_product(conn, product_id).await?;
    let removed =
        ChangeSetRepo::delete_after(conn, product_id, pointer.map(|p| p.change_set_id)).await?;
    if removed > 0 {
        tracing::debug!(product_id, removed, "Discarded redo history");
    }
    Ok(removed)
}

/// Records the row mutations of one logical edit into a fresh change set.
///
/// Every mutation goes through the recorder so its snapshot is written in
/// program order next to the store write: `delete` snapshots before the row
/// disappears, `create` snapshots after the id is assigned. All methods run
/// on the caller's transaction; nothing is visible until it commits.
#[derive(Debug)]
pub struct ChangeSetRecorder {
    change_set: ChangeSet,
    entries: usize,
}

impl ChangeSetRecorder {
    /// Discard the product's future history and open a new change set,
    /// which becomes the unambiguous head.
    pub async fn begin(conn: &mut PgConnection, product_id: DbId) -> EditResult<Self> {
        truncate_future(conn, product_id).await?;
        let change_set = ChangeSetRepo::create(conn, product_id).await?;
        Ok(Self {
            change_set,
            entries: 0,
        })
    }

    /// Insert a node and log its `create`/`after` snapshot.
    pub async fn create_node(
        &mut self,
        conn: &mut PgConnection,
        input: &NewNode,
    ) -> EditResult<CompositionNode> {
        let node = CompositionRepo::create(conn, input).await?;
        self.log(conn, &node, HistoryAction::Create, HistoryPhase::After)
            .await?;
        Ok(node)
    }

    /// Overwrite a node's fields, logging `update` snapshots on both sides.
    pub async fn update_node(
        &mut self,
        conn: &mut PgConnection,
        before: &CompositionNode,
        after: &NodeValues,
    ) -> EditResult<CompositionNode> {
        self.log(conn, before, HistoryAction::Update, HistoryPhase::Before)
            .await?;
        let updated = CompositionRepo::update(conn, after)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CompositionNode",
                id: after.node_id,
            })?;
        self.log(conn, &updated, HistoryAction::Update, HistoryPhase::After)
            .await?;
        Ok(updated)
    }

    /// Log a node's `delete`/`before` snapshot, then delete it.
    pub async fn delete_node(
        &mut self,
        conn: &mut PgConnection,
        node: &CompositionNode,
    ) -> EditResult<()> {
        self.log(conn, node, HistoryAction::Delete, HistoryPhase::Before)
            .await?;
        if !CompositionRepo::delete(conn, node.id).await? {
            return Err(CoreError::NotFound {
                entity: "CompositionNode",
                id: node.id,
            }
            .into());
        }
        Ok(())
    }

    /// Advance the product's pointer to this change set.
    ///
    /// Consumes the recorder; call it last, after validation has passed.
    pub async fn finish(self, conn: &mut PgConnection) -> EditResult<DbId> {
        if self.entries == 0 {
            return Err(CoreError::Internal(format!(
                "Change set {} recorded no rows",
                self.change_set.id
            ))
            .into());
        }
        UndoRedoPointerRepo::upsert(conn, self.change_set.product_id, self.change_set.id).await?;
        tracing::debug!(
            product_id = self.change_set.product_id,
            change_set_id = self.change_set.id,
            entries = self.entries,
            "Change set recorded"
        );
        Ok(self.change_set.id)
    }

    async fn log(
        &mut self,
        conn: &mut PgConnection,
        node: &CompositionNode,
        action: HistoryAction,
        phase: HistoryPhase,
    ) -> EditResult<()> {
        HistoryEntryRepo::record(conn, self.change_set.id, node, action, phase).await?;
        self.entries += 1;
        Ok(())
    }
}
