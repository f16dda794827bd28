//! Part catalog model and DTOs.

use partlist_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `parts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Part {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for registering a new part.
#[derive(Debug, Deserialize)]
pub struct CreatePart {
    pub code: String,
    pub name: String,
}
