//! Change-set history vocabulary and replay planning.
//!
//! A change-set groups every row-level snapshot written by one logical edit.
//! Undo walks a change-set's entries newest-first applying inverse effects;
//! redo walks them oldest-first applying forward effects. The planning is
//! pure so it can be verified without a database; `partlist-db` executes the
//! resulting [`ReplayStep`]s inside one transaction.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, SortKey};

// ---------------------------------------------------------------------------
// Action / phase
// ---------------------------------------------------------------------------

/// Row-level operation recorded in a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a snapshot captures the row before or after the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPhase {
    Before,
    After,
}

impl HistoryPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Field values of one composition node at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub node_id: DbId,
    pub parent_id: Option<DbId>,
    pub sort_key: Option<SortKey>,
    /// `None` once the part has been removed from the catalog.
    pub part_id: Option<DbId>,
    pub quantity: Option<i32>,
}

/// One decoded history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: DbId,
    pub action: HistoryAction,
    pub phase: HistoryPhase,
    pub snapshot: NodeSnapshot,
}

impl HistoryRecord {
    /// Decode the textual action/phase columns of a stored entry.
    pub fn decode(
        id: DbId,
        action: &str,
        phase: &str,
        snapshot: NodeSnapshot,
    ) -> Result<Self, CoreError> {
        let action = HistoryAction::from_str(action).ok_or_else(|| {
            CoreError::HistoryCorrupted(format!(
                "History entry {id} has unknown action '{action}'"
            ))
        })?;
        let phase = HistoryPhase::from_str(phase).ok_or_else(|| {
            CoreError::HistoryCorrupted(format!(
                "History entry {id} has unknown phase '{phase}'"
            ))
        })?;
        Ok(Self {
            id,
            action,
            phase,
            snapshot,
        })
    }
}

/// Node field values complete enough to write a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeValues {
    pub node_id: DbId,
    pub parent_id: Option<DbId>,
    pub sort_key: SortKey,
    pub part_id: DbId,
    pub quantity: Option<i32>,
}

/// One storage effect produced by replaying a change-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// Remove an existing node.
    Delete { node_id: DbId },
    /// Overwrite every field of an existing node.
    Restore(NodeValues),
    /// Insert a node under its original id.
    Recreate(NodeValues),
}

impl ReplayStep {
    pub fn node_id(&self) -> DbId {
        match self {
            Self::Delete { node_id } => *node_id,
            Self::Restore(v) | Self::Recreate(v) => v.node_id,
        }
    }
}

/// Replay direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Plan the inverse effects of a change-set, newest entry first.
///
/// - `create` entries delete the node they created.
/// - `update`/`before` entries restore the pre-edit fields.
/// - `delete` entries recreate the node under its original id.
pub fn plan_undo(
    change_set_id: DbId,
    mut entries: Vec<HistoryRecord>,
) -> Result<Vec<ReplayStep>, CoreError> {
    check_shape(change_set_id, &entries)?;
    entries.sort_by(|a, b| b.id.cmp(&a.id));

    let mut steps = Vec::with_capacity(entries.len());
    for entry in entries {
        match (entry.action, entry.phase) {
            (HistoryAction::Create, _) => steps.push(ReplayStep::Delete {
                node_id: entry.snapshot.node_id,
            }),
            (HistoryAction::Update, HistoryPhase::Before) => {
                steps.push(ReplayStep::Restore(complete(&entry)?));
            }
            (HistoryAction::Update, HistoryPhase::After) => {}
            (HistoryAction::Delete, _) => {
                steps.push(ReplayStep::Recreate(complete(&entry)?));
            }
        }
    }
    Ok(steps)
}

/// Plan the forward effects of a change-set, oldest entry first.
///
/// - `create` entries recreate the node under its original id.
/// - `update`/`after` entries apply the post-edit fields.
/// - `delete` entries delete the node again.
pub fn plan_redo(
    change_set_id: DbId,
    mut entries: Vec<HistoryRecord>,
) -> Result<Vec<ReplayStep>, CoreError> {
    check_shape(change_set_id, &entries)?;
    entries.sort_by_key(|e| e.id);

    let mut steps = Vec::with_capacity(entries.len());
    for entry in entries {
        match (entry.action, entry.phase) {
            (HistoryAction::Create, _) => {
                steps.push(ReplayStep::Recreate(complete(&entry)?));
            }
            (HistoryAction::Update, HistoryPhase::After) => {
                steps.push(ReplayStep::Restore(complete(&entry)?));
            }
            (HistoryAction::Update, HistoryPhase::Before) => {}
            (HistoryAction::Delete, _) => steps.push(ReplayStep::Delete {
                node_id: entry.snapshot.node_id,
            }),
        }
    }
    Ok(steps)
}

/// A change-set must be non-empty, `create` entries must be `after`
/// snapshots and `delete` entries must be `before` snapshots.
fn check_shape(change_set_id: DbId, entries: &[HistoryRecord]) -> Result<(), CoreError> {
    if entries.is_empty() {
        return Err(CoreError::HistoryCorrupted(format!(
            "Change set {change_set_id} has no history entries"
        )));
    }
    for entry in entries {
        let ok = match entry.action {
            HistoryAction::Create => entry.phase == HistoryPhase::After,
            HistoryAction::Delete => entry.phase == HistoryPhase::Before,
            HistoryAction::Update => true,
        };
        if !ok {
            return Err(CoreError::HistoryCorrupted(format!(
                "History entry {} records '{}' with phase '{}'",
                entry.id, entry.action, entry.phase
            )));
        }
    }
    Ok(())
}

fn complete(entry: &HistoryRecord) -> Result<NodeValues, CoreError> {
    let s = &entry.snapshot;
    let part_id = s.part_id.ok_or_else(|| {
        CoreError::HistoryCorrupted(format!(
            "History entry {} lost its part reference (node {})",
            entry.id, s.node_id
        ))
    })?;
    let sort_key = s.sort_key.ok_or_else(|| {
        CoreError::HistoryCorrupted(format!(
            "History entry {} has no sort key (node {})",
            entry.id, s.node_id
        ))
    })?;
    Ok(NodeValues {
        node_id: s.node_id,
        parent_id: s.parent_id,
        sort_key,
        part_id,
        quantity: s.quantity,
    })
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Availability of undo and redo for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UndoRedoStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

impl UndoRedoStatus {
    /// Derive availability from the pointed-to change-set and the newest
    /// change-set of the product.
    ///
    /// No pointer means the cursor sits before the first change-set: undo is
    /// unavailable and redo is available whenever any change-set exists.
    pub fn from_positions(pointer: Option<DbId>, latest_change_set: Option<DbId>) -> Self {
        let can_redo = match (pointer, latest_change_set) {
            (Some(p), Some(latest)) => latest > p,
            (None, Some(_)) => true,
            (_, None) => false,
        };
        Self {
            can_undo: pointer.is_some(),
            can_redo,
        }
    }
}
