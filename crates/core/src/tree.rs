//! In-memory view of one product tree and its materialization.
//!
//! The persistence layer loads every node reachable from a product root in
//! one query; [`ChildIndex`] groups them by parent so the cycle detector and
//! [`materialize`] can walk the tree without further round trips.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, SortKey};

/// Multiplier applied at the product root.
pub const ROOT_MULTIPLIER: i64 = 1;

/// One composition node joined with its part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub sort_key: SortKey,
    pub part_id: DbId,
    pub part_code: String,
    pub part_name: String,
    pub quantity: Option<i32>,
}

/// Nodes of one tree indexed by id and grouped by parent, children ordered
/// by sort key ascending.
#[derive(Debug, Default)]
pub struct ChildIndex {
    nodes: HashMap<DbId, TreeNode>,
    children: HashMap<DbId, Vec<DbId>>,
}

impl ChildIndex {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        let mut children: HashMap<DbId, Vec<(SortKey, DbId)>> = HashMap::new();
        for node in &nodes {
            if let Some(parent_id) = node.parent_id {
                children
                    .entry(parent_id)
                    .or_default()
                    .push((node.sort_key, node.id));
            }
        }

        let children = children
            .into_iter()
            .map(|(parent_id, mut kids)| {
                kids.sort_unstable();
                (parent_id, kids.into_iter().map(|(_, id)| id).collect())
            })
            .collect();

        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            children,
        }
    }

    pub fn get(&self, id: DbId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Children of `id` in sort order. Empty for leaves and unknown ids.
    pub fn children_of(&self, id: DbId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| self.nodes.get(child_id))
    }

    /// Ids of every descendant of `id` in depth-first pre-order
    /// (each node listed before its own children), excluding `id` itself.
    pub fn descendants_preorder(&self, id: DbId) -> Vec<DbId> {
        let mut out = Vec::new();
        let mut on_path = HashSet::from([id]);
        self.collect_descendants(id, &mut on_path, &mut out);
        out
    }

    fn collect_descendants(&self, id: DbId, on_path: &mut HashSet<DbId>, out: &mut Vec<DbId>) {
        for child in self.children_of(id) {
            if !on_path.insert(child.id) {
                continue;
            }
            out.push(child.id);
            self.collect_descendants(child.id, on_path, out);
            on_path.remove(&child.id);
        }
    }
}

// ---------------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------------

/// A read-only snapshot of one node with its computed used quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedNode {
    pub node_id: DbId,
    pub part_code: String,
    pub part_name: String,
    pub quantity: Option<i32>,
    pub used_quantity: i64,
    pub children: Vec<MaterializedNode>,
}

/// Build the nested view of the tree rooted at `root_id`.
///
/// The root shows quantity 1 and used quantity [`ROOT_MULTIPLIER`]; every
/// descendant's used quantity is its parent's used quantity times its own
/// quantity. A node without a quantity contributes zero. A used quantity
/// that does not fit in an `i64` is a [`CoreError::Validation`].
pub fn materialize(root_id: DbId, index: &ChildIndex) -> Result<MaterializedNode, CoreError> {
    let root = index.get(root_id).ok_or(CoreError::NotFound {
        entity: "Product",
        id: root_id,
    })?;

    let mut on_path = HashSet::from([root_id]);
    let children = materialize_children(root_id, ROOT_MULTIPLIER, index, &mut on_path)?;

    Ok(MaterializedNode {
        node_id: root.id,
        part_code: root.part_code.clone(),
        part_name: root.part_name.clone(),
        quantity: Some(ROOT_MULTIPLIER as i32),
        used_quantity: ROOT_MULTIPLIER,
        children,
    })
}

fn materialize_children(
    parent_id: DbId,
    parent_used: i64,
    index: &ChildIndex,
    on_path: &mut HashSet<DbId>,
) -> Result<Vec<MaterializedNode>, CoreError> {
    let mut out = Vec::new();
    for child in index.children_of(parent_id) {
        if !on_path.insert(child.id) {
            return Err(CoreError::Internal(format!(
                "Composition node {} is its own ancestor",
                child.id
            )));
        }
        let used_quantity = parent_used
            .checked_mul(i64::from(child.quantity.unwrap_or(0)))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Used quantity of part '{}' (node {}) is too large",
                    child.part_code, child.id
                ))
            })?;
        let children = materialize_children(child.id, used_quantity, index, on_path)?;
        on_path.remove(&child.id);

        out.push(MaterializedNode {
            node_id: child.id,
            part_code: child.part_code.clone(),
            part_name: child.part_name.clone(),
            quantity: child.quantity,
            used_quantity,
            children,
        });
    }
    Ok(out)
}
