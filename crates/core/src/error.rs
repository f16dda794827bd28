use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A part would become its own ancestor.
    #[error("Cycle detected: {0}")]
    CycleDetected(String),

    /// Undo/redo found a trail that cannot be replayed against the current tree.
    #[error("History corrupted: {0}")]
    HistoryCorrupted(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
