//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that take part in an edit accept `&mut PgConnection` so they run
//! on the caller's open transaction; list endpoints take `&PgPool`.

pub mod change_set_repo;
pub mod composition_repo;
pub mod history_entry_repo;
pub mod part_repo;
pub mod undo_redo_pointer_repo;

pub use change_set_repo::ChangeSetRepo;
pub use composition_repo::CompositionRepo;
pub use history_entry_repo::HistoryEntryRepo;
pub use part_repo::PartRepo;
pub use undo_redo_pointer_repo::UndoRedoPointerRepo;
