//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Search and pagination parameters (`?q=&limit=&offset=`).
///
/// `q` is matched case-insensitively as a substring. `limit` and `offset`
/// are clamped via `clamp_limit` / `clamp_offset` before they reach SQL.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
