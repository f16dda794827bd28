//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Input DTOs where the table accepts user-supplied rows

pub mod change_set;
pub mod composition;
pub mod history_entry;
pub mod part;
pub mod undo_redo_pointer;
