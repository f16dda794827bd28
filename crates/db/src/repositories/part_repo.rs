//! Repository for the `parts` table.

use partlist_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::part::{CreatePart, Part};

/// Column list for `parts` queries.
const COLUMNS: &str = "id, code, name, created_at, updated_at";

/// Provides catalog lookups and registration for parts.
pub struct PartRepo;

impl PartRepo {
    /// Insert a new part, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreatePart) -> Result<Part, sqlx::Error> {
        let query = format!(
            "INSERT INTO parts (code, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Part>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a part by its business code.
    pub async fn find_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<Part>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parts WHERE code = $1");
        sqlx::query_as::<_, Part>(&query)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List parts ordered by code, optionally filtered by an `ILIKE`
    /// pattern matched against code or name.
    pub async fn list(pool: &PgPool, pattern: Option<&str>) -> Result<Vec<Part>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parts
             WHERE $1::TEXT IS NULL OR code ILIKE $1 OR name ILIKE $1
             ORDER BY code"
        );
        sqlx::query_as::<_, Part>(&query)
            .bind(pattern)
            .fetch_all(pool)
            .await
    }

    /// Delete a part. Compositions using it go with it; history entries
    /// keep their rows with the part reference cleared.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
