use partlist_core::error::CoreError;
use partlist_core::history::{plan_redo, plan_undo, Direction, HistoryRecord, ReplayStep, UndoRedoStatus};
use partlist_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::change_set::ChangeSet;
use crate::repositories::{ChangeSetRepo, CompositionRepo, HistoryEntryRepo, UndoRedoPointerRepo};
use crate::tree_reader::{self, ProductTree};
use crate::{EditError, EditResult};

/// Undo/redo availability for a product, read on the caller's connection.
pub async fn status_in(conn: &mut PgConnection, product_id: DbId) -> Result<UndoRedoStatus, sqlx::Error> {
    let pointer = UndoRedoPointerRepo::find_by_product(conn, product_id).await?;
    let latest = ChangeSetRepo::latest_id(conn, product_id).await?;
    Ok(UndoRedoStatus::from_positions(
        pointer.map(|p| p.change_set_id),
        latest,
    ))
}

/// Undo/redo availability for a product.
pub async fn status(pool: &PgPool, product_id: DbId) -> EditResult<UndoRedoStatus> {
    let mut conn = pool.acquire().await?;
    if CompositionRepo::find_by_id(&mut conn, product_id)
        .await?
        .filter(|n| n.is_root())
        .is_none()
    {
        return Err(product_not_found(product_id));
    }
    Ok(status_in(&mut conn, product_id).await?)
}

/// Reverse the change set under the product's pointer and move the pointer
/// one change set back (or remove it when none is older).
///
/// Without a pointer there is nothing to undo and the call is a no-op.
/// Returns the refreshed tree.
pub async fn undo(pool: &PgPool, product_id: DbId) -> EditResult<ProductTree> {
    let mut tx = pool.begin().await?;
    lock(&mut tx, product_id).await?;

    let Some(pointer) = UndoRedoPointerRepo::find_by_product(&mut tx, product_id).await? else {
        let tree = tree_reader::read_in(&mut tx, product_id).await?;
        tx.commit().await?;
        return Ok(tree);
    };

    let records = load_records(&mut tx, pointer.change_set_id).await?;
    let steps = plan_undo(pointer.change_set_id, records)?;
    apply(&mut tx, pointer.change_set_id, Direction::Undo, &steps).await?;

    match ChangeSetRepo::find_previous(&mut tx, product_id, pointer.change_set_id).await? {
        Some(previous) => {
            UndoRedoPointerRepo::upsert(&mut tx, product_id, previous.id).await?;
        }
        None => {
            UndoRedoPointerRepo::delete_by_product(&mut tx, product_id).await?;
        }
    }

    let tree = tree_reader::read_in(&mut tx, product_id).await?;
    tx.commit().await?;

    tracing::debug!(
        product_id,
        change_set_id = pointer.change_set_id,
        steps = steps.len(),
        "Change set undone"
    );
    Ok(tree)
}

/// Re-apply the change set after the product's pointer (or the first change
/// set when there is no pointer) and advance the pointer to it.
///
/// With nothing after the pointer the call is a no-op. Returns the
/// refreshed tree.
pub async fn redo(pool: &PgPool, product_id: DbId) -> EditResult<ProductTree> {
    let mut tx = pool.begin().await?;
    lock(&mut tx, product_id).await?;

    let pointer = UndoRedoPointerRepo::find_by_product(&mut tx, product_id).await?;
    let next: Option<ChangeSet> =
        ChangeSetRepo::find_next(&mut tx, product_id, pointer.map(|p| p.change_set_id)).await?;
    let Some(next) = next else {
        let tree = tree_reader::read_in(&mut tx, product_id).await?;
        tx.commit().await?;
        return Ok(tree);
    };

    let records = load_records(&mut tx, next.id).await?;
    let steps = plan_redo(next.id, records)?;
    apply(&mut tx, next.id, Direction::Redo, &steps).await?;

    UndoRedoPointerRepo::upsert(&mut tx, product_id, next.id).await?;

    let tree = tree_reader::read_in(&mut tx, product_id).await?;
    tx.commit().await?;

    tracing::debug!(
        product_id,
        change_set_id = next.id,
        steps = steps.len(),
        "Change set redone"
    );
    Ok(tree)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product_not_found(product_id: DbId) -> EditError {
    CoreError::NotFound {
        entity: "Product",
        id: product_id,
    }
    .into()
}

async fn lock(conn: &mut PgConnection, product_id: DbId) -> EditResult<()> {
    CompositionRepo::lock_product(conn, product_id)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;
    Ok(())
}

async fn load_records(conn: &mut PgConnection, change_set_id: DbId) -> EditResult<Vec<HistoryRecord>> {
    let entries = HistoryEntryRepo::list_by_change_set(conn, change_set_id).await?;
    let records = entries
        .iter()
        .map(|e| e.to_record())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Execute replay steps in order. Any step that does not match the current
/// tree means the trail is inconsistent; the caller's transaction is then
/// dropped and rolled back so the pointer never moves on a partial replay.
async fn apply(
    conn: &mut PgConnection,
    change_set_id: DbId,
    direction: Direction,
    steps: &[ReplayStep],
) -> EditResult<()> {
    for step in steps {
        let outcome = match step {
            ReplayStep::Delete { node_id } => {
                if CompositionRepo::delete(conn, *node_id).await? {
                    Ok(())
                } else {
                    Err(format!("node {node_id} to delete is missing"))
                }
            }
            ReplayStep::Restore(values) => match CompositionRepo::update(conn, values).await? {
                Some(_) => Ok(()),
                None => Err(format!("node {} to update is missing", values.node_id)),
            },
            ReplayStep::Recreate(values) => {
                if CompositionRepo::find_by_id(conn, values.node_id).await?.is_some() {
                    Err(format!("node {} to recreate already exists", values.node_id))
                } else {
                    CompositionRepo::create_with_id(conn, values).await?;
                    Ok(())
                }
            }
        };

        if let Err(reason) = outcome {
            tracing::error!(
                change_set_id,
                direction = direction.as_str(),
                reason = reason.as_str(),
                "History replay failed"
            );
            return Err(CoreError::HistoryCorrupted(format!(
                "Cannot {} change set {change_set_id}: {reason}",
                direction.as_str()
            ))
            .into());
        }
    }
    Ok(())
}
