//! Change-set recording and the undo/redo cursor.
//!
//! History is linear per product. Each logical edit writes one change set
//! of before/after row snapshots; the product's pointer names the most
//! recently applied change set. Editing from a non-head position first
//! discards every change set after the pointer.

mod recorder;
mod undo_redo;

pub use recorder::{truncate_future, ChangeSetRecorder};
pub use undo_redo::{redo, status, status_in, undo};
