//! Repository for the `undo_redo_pointers` table.

use partlist_core::types::DbId;
use sqlx::PgConnection;

use crate::models::undo_redo_pointer::UndoRedoPointer;

/// Column list for `undo_redo_pointers` queries.
const COLUMNS: &str = "id, product_id, change_set_id, created_at, updated_at";

/// Provides access to the single per-product undo/redo cursor.
pub struct UndoRedoPointerRepo;

impl UndoRedoPointerRepo {
    /// Get the pointer of a product. `None` means the cursor sits before the
    /// first change set.
    pub async fn find_by_product(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Option<UndoRedoPointer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM undo_redo_pointers WHERE product_id = $1");
        sqlx::query_as::<_, UndoRedoPointer>(&query)
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Point the product's cursor at `change_set_id`, creating the row if absent.
    pub async fn upsert(
        conn: &mut PgConnection,
        product_id: DbId,
        change_set_id: DbId,
    ) -> Result<UndoRedoPointer, sqlx::Error> {
        let query = format!(
            "INSERT INTO undo_redo_pointers (product_id, change_set_id)
             VALUES ($1, $2)
             ON CONFLICT (product_id) DO UPDATE
             SET change_set_id = EXCLUDED.change_set_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UndoRedoPointer>(&query)
            .bind(product_id)
            .bind(change_set_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Remove the product's pointer. Returns `true` if a row was deleted.
    pub async fn delete_by_product(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM undo_redo_pointers WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
