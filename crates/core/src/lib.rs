//! Domain logic for product compositions (bills of materials).
//!
//! Everything here is pure: no database access, no async. The `partlist-db`
//! crate loads rows, hands them to these functions, and persists the outcome.

pub mod composition;
pub mod cycle;
pub mod error;
pub mod history;
pub mod pagination;
pub mod tree;
pub mod types;
