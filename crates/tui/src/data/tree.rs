// CircInspect - Quantum Circuit Debugger
// Copyright (C) 2025 UBC Quantum Software and Algorithms Research Lab
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Call-tree state with lazy expansion
//!
//! The forest of call and transform nodes mirrors backend-reported
//! structure. Nodes live in an arena addressed by backend id; expansion is
//! a separate id set so the same node cannot be aliased from two renders.
//! Trees are discarded and rebuilt wholesale on every backend round-trip,
//! while the expansion set persists within a mode so previously expanded
//! methods are re-fetched and re-opened after a rebuild.

use std::collections::{HashMap, HashSet};

use circinspect_common::types::{CircuitNode, NodeId};
use tracing::warn;

/// One arena entry: the node plus its child links.
#[derive(Debug, Clone)]
struct Entry {
    node: CircuitNode,
    children: Vec<NodeId>,
    /// Whether children have been fetched at least once. Collapsing keeps
    /// fetched children for instant re-expansion.
    children_fetched: bool,
}

/// One visible row of the rendered tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    /// Node at this row.
    pub id: NodeId,
    /// Indentation depth (roots are 0).
    pub depth: usize,
}

/// Arena-backed forest of circuit nodes.
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    nodes: HashMap<NodeId, Entry>,
    roots: Vec<NodeId>,
    expanded: HashSet<NodeId>,
    /// At most one node across the whole forest is selected for display.
    selected: Option<NodeId>,
}

impl TreeState {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the forest and replace it with a fresh ordered root list.
    ///
    /// The expansion set survives so previously expanded nodes re-open
    /// (their children are re-fetched lazily); the selection survives only
    /// if the selected id reappears.
    pub fn rebuild(&mut self, roots: Vec<CircuitNode>) {
        self.nodes.clear();
        self.roots.clear();
        for node in roots {
            let id = self.insert(node);
            self.roots.push(id);
        }
        if let Some(sel) = self.selected {
            if !self.nodes.contains_key(&sel) {
                self.selected = None;
            }
        }
    }

    /// Reset everything, including expansion and selection. Used on mode
    /// switch and debugger restart.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.expanded.clear();
        self.selected = None;
    }

    fn insert(&mut self, node: CircuitNode) -> NodeId {
        let id = node.id;
        let entry = Entry { node, children: Vec::new(), children_fetched: false };
        if self.nodes.insert(id, entry).is_some() {
            // Backend ids are assumed unique within a snapshot; a repeat
            // means the stale entry is replaced so the arena cannot alias.
            warn!(id, "duplicate node id in trace snapshot, replacing stale entry");
        }
        id
    }

    /// Replace a node's children with a freshly fetched level.
    ///
    /// Idempotent: re-expanding with unchanged backend data yields the
    /// same child list, never duplicates. Transform pseudo-nodes never
    /// hold children. A child id that collides with a node elsewhere in
    /// the forest is dropped: linking it would alias two positions (the
    /// parent itself included, turning the node into its own child and
    /// making every traversal cyclic).
    pub fn set_children(&mut self, parent: NodeId, children: Vec<CircuitNode>) {
        let Some(entry) = self.nodes.get_mut(&parent) else {
            warn!(parent, "expansion response for a node no longer in the tree");
            return;
        };
        if entry.node.is_transform {
            return;
        }
        let old_children = std::mem::take(&mut entry.children);
        entry.children_fetched = true;
        for id in old_children {
            self.remove_subtree(id);
        }
        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            if self.nodes.contains_key(&child.id) {
                warn!(parent, id = child.id, "child id collides with an existing node, dropping");
                continue;
            }
            ids.push(self.insert(child));
        }
        if let Some(entry) = self.nodes.get_mut(&parent) {
            entry.children = ids;
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(entry) = self.nodes.remove(&id) {
            for child in entry.children {
                self.remove_subtree(child);
            }
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Mark a node expanded. Returns `true` when its children must be
    /// fetched from the backend (first expansion, or re-expansion after a
    /// rebuild discarded them).
    pub fn expand(&mut self, id: NodeId) -> bool {
        let Some(entry) = self.nodes.get(&id) else { return false };
        if entry.node.is_transform || !entry.node.has_children {
            return false;
        }
        self.expanded.insert(id);
        !entry.children_fetched
    }

    /// Collapse a node. Already-fetched children are kept for instant
    /// re-expansion; only visibility changes.
    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    /// Whether the node is currently marked expanded.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Ids that are marked expanded but whose children are not fetched in
    /// the current forest. After a rebuild these need `/expandMethod`
    /// round-trips to restore their open subtrees.
    pub fn pending_expansions(&self) -> Vec<NodeId> {
        self.roots_preorder()
            .into_iter()
            .filter(|id| {
                self.expanded.contains(id)
                    && self.nodes.get(id).is_some_and(|e| {
                        !e.children_fetched && e.node.has_children && !e.node.is_transform
                    })
            })
            .collect()
    }

    /// Select a node for display. Any previous selection is replaced, so
    /// at most one node in the forest is ever selected.
    pub fn select(&mut self, id: NodeId) {
        if self.nodes.contains_key(&id) {
            self.selected = Some(id);
        }
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected node id, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Whether the given node is the selected one.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&CircuitNode> {
        self.nodes.get(&id).map(|e| &e.node)
    }

    /// Whether the node exists in the current forest.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Root ids in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible rows: pre-order over roots, descending only into expanded
    /// nodes. Recomputed from the expansion set on every state change.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for &root in &self.roots {
            self.push_visible(root, 0, &mut rows);
        }
        rows
    }

    fn push_visible(&self, id: NodeId, depth: usize, rows: &mut Vec<TreeRow>) {
        let Some(entry) = self.nodes.get(&id) else { return };
        rows.push(TreeRow { id, depth });
        if self.expanded.contains(&id) {
            for &child in &entry.children {
                self.push_visible(child, depth + 1, rows);
            }
        }
    }

    /// Full pre-order id walk, ignoring expansion.
    pub fn roots_preorder(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.push_preorder(root, &mut ids);
        }
        ids
    }

    fn push_preorder(&self, id: NodeId, ids: &mut Vec<NodeId>) {
        let Some(entry) = self.nodes.get(&id) else { return };
        ids.push(id);
        for &child in &entry.children {
            self.push_preorder(child, ids);
        }
    }
}
