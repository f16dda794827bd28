//! Repository for the `composition_nodes` table (the tree store).
//!
//! Deletion never cascades: callers enumerate descendants and delete them
//! one by one so each row can be logged before it disappears.

use partlist_core::history::NodeValues;
use partlist_core::types::{DbId, SortKey};
use sqlx::{PgConnection, PgPool};

use crate::models::composition::{CompositionNode, CompositionTreeRow, NewNode, ProductSummary};

/// Column list for `composition_nodes` queries.
const COLUMNS: &str = "id, parent_id, sort_key, part_id, quantity, created_at, updated_at";

/// Provides node-level reads and writes for product trees.
pub struct CompositionRepo;

impl CompositionRepo {
    // ── Single nodes ─────────────────────────────────────────────────

    /// Find a node by its primary key.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<CompositionNode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM composition_nodes WHERE id = $1");
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock a product root row for the rest of the transaction.
    ///
    /// Every writer of a product takes this lock first, so concurrent edits,
    /// undos and redos of the same product run one after another. Returns
    /// `None` if `id` is not a product root.
    pub async fn lock_product(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<CompositionNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM composition_nodes
             WHERE id = $1 AND parent_id IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a node with a store-assigned id.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewNode,
    ) -> Result<CompositionNode, sqlx::Error> {
        let query = format!(
            "INSERT INTO composition_nodes (parent_id, sort_key, part_id, quantity)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(input.parent_id)
            .bind(input.sort_key)
            .bind(input.part_id)
            .bind(input.quantity)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert a node under an explicit id. Used only by undo/redo replay to
    /// bring a node back with its original identity.
    pub async fn create_with_id(
        conn: &mut PgConnection,
        values: &NodeValues,
    ) -> Result<CompositionNode, sqlx::Error> {
        let query = format!(
            "INSERT INTO composition_nodes (id, parent_id, sort_key, part_id, quantity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(values.node_id)
            .bind(values.parent_id)
            .bind(values.sort_key)
            .bind(values.part_id)
            .bind(values.quantity)
            .fetch_one(&mut *conn)
            .await
    }

    /// Overwrite every editable field of a node.
    ///
    /// Returns `None` if no row with `values.node_id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        values: &NodeValues,
    ) -> Result<Option<CompositionNode>, sqlx::Error> {
        let query = format!(
            "UPDATE composition_nodes SET
                parent_id = $2,
                sort_key = $3,
                part_id = $4,
                quantity = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(values.node_id)
            .bind(values.parent_id)
            .bind(values.sort_key)
            .bind(values.part_id)
            .bind(values.quantity)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Delete one node. Its children are left untouched.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM composition_nodes WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a set of nodes without logging. Returns the number removed.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM composition_nodes WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    // ── Siblings and children ────────────────────────────────────────

    /// Children of a node ordered by sort key.
    pub async fn list_children(
        conn: &mut PgConnection,
        parent_id: DbId,
    ) -> Result<Vec<CompositionNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM composition_nodes
             WHERE parent_id = $1
             ORDER BY sort_key"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(parent_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Highest sort key among the children of `parent_id`.
    pub async fn max_child_sort_key(
        conn: &mut PgConnection,
        parent_id: DbId,
    ) -> Result<Option<SortKey>, sqlx::Error> {
        let row: (Option<SortKey>,) =
            sqlx::query_as("SELECT MAX(sort_key) FROM composition_nodes WHERE parent_id = $1")
                .bind(parent_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(row.0)
    }

    /// Siblings under `parent_id` with `sort_key >= min_sort_key`, ordered
    /// by sort key, optionally excluding one node.
    pub async fn list_siblings_from(
        conn: &mut PgConnection,
        parent_id: Option<DbId>,
        min_sort_key: SortKey,
        exclude_id: Option<DbId>,
    ) -> Result<Vec<CompositionNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM composition_nodes
             WHERE parent_id IS NOT DISTINCT FROM $1
               AND sort_key >= $2
               AND ($3::BIGINT IS NULL OR id <> $3)
             ORDER BY sort_key"
        );
        sqlx::query_as::<_, CompositionNode>(&query)
            .bind(parent_id)
            .bind(min_sort_key)
            .bind(exclude_id)
            .fetch_all(&mut *conn)
            .await
    }

    // ── Whole trees ──────────────────────────────────────────────────

    /// Load every node reachable from `root_id` (inclusive) joined with its part.
    ///
    /// `UNION` (not `UNION ALL`) keeps the walk finite even if parent links
    /// ever form a loop.
    pub async fn load_tree(
        conn: &mut PgConnection,
        root_id: DbId,
    ) -> Result<Vec<CompositionTreeRow>, sqlx::Error> {
        sqlx::query_as::<_, CompositionTreeRow>(
            "WITH RECURSIVE tree AS (
                SELECT id FROM composition_nodes WHERE id = $1
                UNION
                SELECT c.id FROM composition_nodes c JOIN tree t ON c.parent_id = t.id
             )
             SELECT n.id, n.parent_id, n.sort_key, n.part_id,
                    p.code AS part_code, p.name AS part_name, n.quantity
             FROM tree t
             JOIN composition_nodes n ON n.id = t.id
             JOIN parts p ON p.id = n.part_id
             ORDER BY n.parent_id NULLS FIRST, n.sort_key",
        )
        .bind(root_id)
        .fetch_all(&mut *conn)
        .await
    }

    // ── Product roots ────────────────────────────────────────────────

    /// List product roots ordered by id, optionally filtered by an `ILIKE`
    /// pattern matched against the part code or name.
    pub async fn list_products(
        pool: &PgPool,
        pattern: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProductSummary>(
            "SELECT n.id, n.part_id, p.code AS part_code, p.name AS part_name, n.created_at
             FROM composition_nodes n
             JOIN parts p ON p.id = n.part_id
             WHERE n.parent_id IS NULL
               AND ($1::TEXT IS NULL OR p.code ILIKE $1 OR p.name ILIKE $1)
             ORDER BY n.id
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Count product roots matching the same filter as [`Self::list_products`].
    pub async fn count_products(pool: &PgPool, pattern: Option<&str>) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
             FROM composition_nodes n
             JOIN parts p ON p.id = n.part_id
             WHERE n.parent_id IS NULL
               AND ($1::TEXT IS NULL OR p.code ILIKE $1 OR p.name ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
