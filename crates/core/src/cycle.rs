//! Part-containment cycle detection.
//!
//! A part may appear in several disjoint branches of a product, but never as
//! its own ancestor. The walk keeps the set of parts on the current
//! root-to-node path only; a part is added on entry and removed on exit.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::tree::ChildIndex;
use crate::types::DbId;

/// A node whose part already occurs among its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleHit {
    pub node_id: DbId,
    pub part_id: DbId,
}

/// Locate the first node (in sort order) whose part repeats along its path.
pub fn find_cycle(root_id: DbId, index: &ChildIndex) -> Option<CycleHit> {
    let root = index.get(root_id)?;
    let mut path_parts = HashSet::new();
    visit(root.id, root.part_id, index, &mut path_parts)
}

fn visit(
    node_id: DbId,
    part_id: DbId,
    index: &ChildIndex,
    path_parts: &mut HashSet<DbId>,
) -> Option<CycleHit> {
    if !path_parts.insert(part_id) {
        return Some(CycleHit { node_id, part_id });
    }

    for child in index.children_of(node_id) {
        if let Some(hit) = visit(child.id, child.part_id, index, path_parts) {
            return Some(hit);
        }
    }

    path_parts.remove(&part_id);
    None
}

/// Fail with [`CoreError::CycleDetected`] if the tree under `root_id` contains
/// a part-containment cycle.
pub fn ensure_acyclic(root_id: DbId, index: &ChildIndex) -> Result<(), CoreError> {
    match find_cycle(root_id, index) {
        None => Ok(()),
        Some(hit) => {
            let code = index
                .get(hit.node_id)
                .map(|n| n.part_code.as_str())
                .unwrap_or("?");
            Err(CoreError::CycleDetected(format!(
                "Part '{code}' would contain itself (node {})",
                hit.node_id
            )))
        }
    }
}
