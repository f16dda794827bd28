//! Repository for the `change_sets` table.

use partlist_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::change_set::ChangeSet;

/// Column list for `change_sets` queries.
const COLUMNS: &str = "id, product_id, created_at";

/// Provides append, navigation and truncation of a product's change sets.
pub struct ChangeSetRepo;

impl ChangeSetRepo {
    /// Open a new change set for a product.
    pub async fn create(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<ChangeSet, sqlx::Error> {
        let query = format!(
            "INSERT INTO change_sets (product_id) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeSet>(&query)
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Delete every change set of the product newer than `after`, or all of
    /// them when `after` is `None`. History entries cascade.
    ///
    /// Returns the number of change sets removed.
    pub async fn delete_after(
        conn: &mut PgConnection,
        product_id: DbId,
        after: Option<DbId>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM change_sets
             WHERE product_id = $1 AND ($2::BIGINT IS NULL OR id > $2)",
        )
        .bind(product_id)
        .bind(after)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// The newest change set of the product older than `before`.
    pub async fn find_previous(
        conn: &mut PgConnection,
        product_id: DbId,
        before: DbId,
    ) -> Result<Option<ChangeSet>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_sets
             WHERE product_id = $1 AND id < $2
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ChangeSet>(&query)
            .bind(product_id)
            .bind(before)
            .fetch_optional(&mut *conn)
            .await
    }

    /// The oldest change set of the product newer than `after`, or the
    /// product's first change set when `after` is `None`.
    pub async fn find_next(
        conn: &mut PgConnection,
        product_id: DbId,
        after: Option<DbId>,
    ) -> Result<Option<ChangeSet>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_sets
             WHERE product_id = $1 AND ($2::BIGINT IS NULL OR id > $2)
             ORDER BY id ASC
             LIMIT 1"
        );
        sqlx::query_as::<_, ChangeSet>(&query)
            .bind(product_id)
            .bind(after)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Id of the product's newest change set, if any.
    pub async fn latest_id(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: (Option<DbId>,) =
            sqlx::query_as("SELECT MAX(id) FROM change_sets WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(row.0)
    }

    /// All change sets of a product, oldest first.
    pub async fn list_by_product(
        pool: &PgPool,
        product_id: DbId,
    ) -> Result<Vec<ChangeSet>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_sets WHERE product_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ChangeSet>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }
}
