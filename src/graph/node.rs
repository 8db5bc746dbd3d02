//! Cmd graph data model
//!
//! The graph owns all nodes in one arena; nodes reference each other through
//! `NodeId` handles so that shared dependencies appear exactly once. A node
//! is identified by its normalized absolute path.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use itertools::chain;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cmd::CmdFile;

/// Handle of a node inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An edge discovered through an `.incbin` directive, keeping the original
/// statement for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncbinDependency {
    pub node: NodeId,
    pub full_statement: String,
}

/// A single file and the dependencies needed to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdGraphNode {
    /// Normalized absolute path; the node's identity.
    pub absolute_path: PathBuf,
    /// Parsed `.cmd` sidecar describing how the file was built, if present.
    pub cmd_file: Option<CmdFile>,
    /// Children discovered from the `.cmd` command and dependency list.
    pub cmd_file_dependencies: Vec<NodeId>,
    /// Children discovered by `.incbin` scanning of `.S` sources.
    pub incbin_dependencies: Vec<IncbinDependency>,
    /// Children from the built-in dependency table.
    pub hardcoded_dependencies: Vec<NodeId>,
}

impl CmdGraphNode {
    pub(crate) fn new(absolute_path: PathBuf, cmd_file: Option<CmdFile>) -> Self {
        Self {
            absolute_path,
            cmd_file,
            cmd_file_dependencies: Vec::new(),
            incbin_dependencies: Vec::new(),
            hardcoded_dependencies: Vec::new(),
        }
    }

    /// All child ids in category order (cmd-file, incbin, hardcoded),
    /// including duplicates across categories.
    fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        chain!(
            self.cmd_file_dependencies.iter().copied(),
            self.incbin_dependencies.iter().map(|dep| dep.node),
            self.hardcoded_dependencies.iter().copied(),
        )
    }
}

/// Directed acyclic graph of build dependencies, primarily inferred from the
/// `.cmd` files a kernel build leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdGraph {
    pub(crate) nodes: Vec<CmdGraphNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl CmdGraph {
    pub fn node(&self, id: NodeId) -> &CmdGraphNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root artifacts the graph was built from, in input order.
    pub fn roots(&self) -> impl Iterator<Item = &CmdGraphNode> {
        self.roots.iter().map(|&id| self.node(id))
    }

    /// The distinct children of `node`, each yielded at most once even when
    /// the same file appears in several dependency categories, preserving
    /// first-seen order.
    pub fn children<'a>(&'a self, node: &'a CmdGraphNode) -> impl Iterator<Item = &'a CmdGraphNode> {
        self.child_ids(node).map(|id| self.node(id))
    }

    fn child_ids<'a>(&'a self, node: &'a CmdGraphNode) -> impl Iterator<Item = NodeId> + 'a {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        node.child_ids().filter(move |&id| seen.insert(id))
    }

    /// Breadth-first traversal from the roots, yielding each reachable node
    /// exactly once.
    pub fn iter(&self) -> Bfs<'_> {
        Bfs {
            graph: self,
            queue: self.roots.iter().copied().collect(),
            visited: FxHashSet::default(),
        }
    }

    /// Look up a node by its absolute path.
    pub fn find(&self, absolute_path: &Path) -> Option<&CmdGraphNode> {
        self.nodes.iter().find(|node| node.absolute_path == absolute_path)
    }
}

impl<'a> IntoIterator for &'a CmdGraph {
    type Item = &'a CmdGraphNode;
    type IntoIter = Bfs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Bfs<'a> {
    graph: &'a CmdGraph,
    queue: VecDeque<NodeId>,
    visited: FxHashSet<NodeId>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = &'a CmdGraphNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.queue.pop_front() {
            if !self.visited.insert(id) {
                continue;
            }
            let node = self.graph.node(id);
            self.queue.extend(self.graph.child_ids(node));
            return Some(node);
        }
        None
    }
}
