//! Control-flow graph over Swift statement trees.
//!
//! Each graph has exactly one `entry` and one `exit` node. Statement nodes
//! reference the AST by a stable statement path (the index chain from the
//! body root), which serves as reference identity within one body. Nested
//! control constructs may be represented as subgraph nodes embedding a
//! complete inner graph; [`ControlFlowGraph::expand_subgraphs`] flattens
//! them before analyses that need a flat graph.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Identifier of a node within one graph. Ids are never reused, so pruning
/// keeps the identity of surviving nodes stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index chain addressing a statement inside a compound body.
///
/// `[2, 1]` is the second child of the third top-level statement. Child
/// slots are assigned by the CFG builder in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementPath(pub Vec<usize>);

impl StatementPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl fmt::Display for StatementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{idx}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CfgNodeKind {
    Entry,
    Exit,
    /// A statement of the analysed body, addressed by path.
    Statement {
        path: StatementPath,
        description: String,
    },
    /// A complete inner graph standing in for a nested construct.
    Subgraph(Box<ControlFlowGraph>),
    /// Marks the scope boundary a variable leaves.
    EndOfScope { variable: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgNode {
    pub id: NodeId,
    pub kind: CfgNodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub back_edge: bool,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    nodes: Vec<CfgNode>,
    edges: Vec<CfgEdge>,
    entry: NodeId,
    exit: NodeId,
    next_id: usize,
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlFlowGraph {
    pub fn new() -> Self {
        let entry = NodeId(0);
        let exit = NodeId(1);
        Self {
            nodes: vec![
                CfgNode {
                    id: entry,
                    kind: CfgNodeKind::Entry,
                },
                CfgNode {
                    id: exit,
                    kind: CfgNodeKind::Exit,
                },
            ],
            edges: Vec::new(),
            entry,
            exit,
            next_id: 2,
        }
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn exit(&self) -> NodeId {
        self.exit
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CfgNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &CfgEdge> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&CfgNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_node(&mut self, kind: CfgNodeKind) -> NodeId {
        debug_assert!(
            !matches!(kind, CfgNodeKind::Entry | CfgNodeKind::Exit),
            "graphs have exactly one entry and one exit"
        );
        let id = self.fresh_id();
        self.nodes.push(CfgNode { id, kind });
        id
    }

    pub fn add_statement_node(
        &mut self,
        path: StatementPath,
        description: impl Into<String>,
    ) -> NodeId {
        self.add_node(CfgNodeKind::Statement {
            path,
            description: description.into(),
        })
    }

    pub fn add_subgraph_node(&mut self, inner: ControlFlowGraph) -> NodeId {
        self.add_node(CfgNodeKind::Subgraph(Box::new(inner)))
    }

    pub fn add_end_of_scope(&mut self, variable: impl Into<String>) -> NodeId {
        self.add_node(CfgNodeKind::EndOfScope {
            variable: variable.into(),
        })
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId) {
        self.add_edge_labeled(source, target, None);
    }

    pub fn add_edge_labeled(&mut self, source: NodeId, target: NodeId, label: Option<String>) {
        debug_assert!(
            self.contains(source) && self.contains(target),
            "edge endpoints must belong to this graph"
        );
        debug_assert!(source != self.exit, "exit has no outgoing edges");
        debug_assert!(target != self.entry, "entry has no incoming edges");
        self.edges.push(CfgEdge {
            source,
            target,
            back_edge: false,
            label,
        });
    }

    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target)
            .collect()
    }

    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.source)
            .collect()
    }

    /// All nodes reachable from `entry`, including `entry` itself.
    pub fn reachable_nodes(&self) -> HashSet<NodeId> {
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for e in &self.edges {
            adjacency.entry(e.source).or_default().push(e.target);
        }
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::from([self.entry]);
        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(next) = adjacency.get(&id) {
                queue.extend(next.iter().copied());
            }
        }
        reachable
    }

    /// Statement paths of every node reachable from `entry`, descending into
    /// unexpanded subgraphs.
    pub fn reachable_statement_paths(&self) -> HashSet<StatementPath> {
        let reachable = self.reachable_nodes();
        let mut paths = HashSet::new();
        for node in &self.nodes {
            if !reachable.contains(&node.id) {
                continue;
            }
            match &node.kind {
                CfgNodeKind::Statement { path, .. } => {
                    paths.insert(path.clone());
                }
                CfgNodeKind::Subgraph(inner) => {
                    paths.extend(inner.reachable_statement_paths());
                }
                _ => {}
            }
        }
        paths
    }

    /// Removes every node unreachable from `entry`, along with its edges.
    /// `entry` and `exit` are always retained.
    pub fn prune(&mut self) {
        let mut keep = self.reachable_nodes();
        keep.insert(self.exit);
        self.nodes.retain(|n| keep.contains(&n.id));
        self.edges
            .retain(|e| keep.contains(&e.source) && keep.contains(&e.target));
    }

    /// Flags edges whose target is on the current depth-first visit path
    /// from `entry`; those are the loop back edges.
    pub fn mark_back_edges(&mut self) {
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for e in &self.edges {
            adjacency.entry(e.source).or_default().push(e.target);
        }

        let mut back_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut on_path: HashSet<NodeId> = HashSet::new();
        // Iterative DFS; each frame tracks which successor to try next.
        let mut stack: Vec<(NodeId, usize)> = vec![(self.entry, 0)];
        visited.insert(self.entry);
        on_path.insert(self.entry);
        while let Some((node, cursor)) = stack.last_mut() {
            let succs = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if *cursor >= succs.len() {
                on_path.remove(node);
                stack.pop();
                continue;
            }
            let next = succs[*cursor];
            *cursor += 1;
            if on_path.contains(&next) {
                back_pairs.insert((*node, next));
            } else if visited.insert(next) {
                on_path.insert(next);
                stack.push((next, 0));
            }
        }

        for e in &mut self.edges {
            if back_pairs.contains(&(e.source, e.target)) {
                e.back_edge = true;
            }
        }
    }

    /// Replaces every subgraph node by its inner graph. Predecessors of the
    /// subgraph node are wired to the successors of the inner entry, and the
    /// predecessors of the inner exit to the subgraph node's successors; the
    /// outer edges' back-edge flags carry over to the synthesised edges.
    pub fn expand_subgraphs(&mut self) {
        while let Some(pos) = self
            .nodes
            .iter()
            .position(|n| matches!(n.kind, CfgNodeKind::Subgraph(_)))
        {
            let node = self.nodes.remove(pos);
            let inner = match node.kind {
                CfgNodeKind::Subgraph(inner) => *inner,
                _ => unreachable!(),
            };
            let outer_id = node.id;

            let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
            for inner_node in inner.nodes {
                if inner_node.id == inner.entry || inner_node.id == inner.exit {
                    continue;
                }
                let fresh = self.fresh_id();
                remap.insert(inner_node.id, fresh);
                self.nodes.push(CfgNode {
                    id: fresh,
                    kind: inner_node.kind,
                });
            }

            // Successors of the inner entry and predecessors of the inner
            // exit, in remapped ids. `true` alongside means the edge linked
            // entry straight to exit (an empty subgraph).
            let mut entry_successors: Vec<NodeId> = Vec::new();
            let mut exit_predecessors: Vec<NodeId> = Vec::new();
            let mut passes_through = false;
            for e in &inner.edges {
                let from_entry = e.source == inner.entry;
                let to_exit = e.target == inner.exit;
                match (from_entry, to_exit) {
                    (true, true) => passes_through = true,
                    (true, false) => entry_successors.push(remap[&e.target]),
                    (false, true) => exit_predecessors.push(remap[&e.source]),
                    (false, false) => self.edges.push(CfgEdge {
                        source: remap[&e.source],
                        target: remap[&e.target],
                        back_edge: e.back_edge,
                        label: e.label.clone(),
                    }),
                }
            }

            let incoming: Vec<CfgEdge> = self
                .edges
                .iter()
                .filter(|e| e.target == outer_id)
                .cloned()
                .collect();
            let outgoing: Vec<CfgEdge> = self
                .edges
                .iter()
                .filter(|e| e.source == outer_id)
                .cloned()
                .collect();
            self.edges
                .retain(|e| e.source != outer_id && e.target != outer_id);

            for edge_in in &incoming {
                for &target in &entry_successors {
                    self.edges.push(CfgEdge {
                        source: edge_in.source,
                        target,
                        back_edge: edge_in.back_edge,
                        label: edge_in.label.clone(),
                    });
                }
            }
            for &source in &exit_predecessors {
                for edge_out in &outgoing {
                    self.edges.push(CfgEdge {
                        source,
                        target: edge_out.target,
                        back_edge: edge_out.back_edge,
                        label: edge_out.label.clone(),
                    });
                }
            }
            if passes_through {
                for edge_in in &incoming {
                    for edge_out in &outgoing {
                        self.edges.push(CfgEdge {
                            source: edge_in.source,
                            target: edge_out.target,
                            back_edge: edge_in.back_edge || edge_out.back_edge,
                            label: edge_in.label.clone(),
                        });
                    }
                }
            }
        }
    }

    /// Cheap copy preserving node identity: ids, kinds and edges carry over
    /// unchanged.
    pub fn copy(&self) -> ControlFlowGraph {
        self.clone()
    }

    /// Re-materialises every node and edge record while preserving the
    /// identity of the original entry and exit references.
    pub fn deep_copy(&self) -> ControlFlowGraph {
        let nodes = self
            .nodes
            .iter()
            .map(|n| CfgNode {
                id: n.id,
                kind: match &n.kind {
                    CfgNodeKind::Subgraph(inner) => {
                        CfgNodeKind::Subgraph(Box::new(inner.deep_copy()))
                    }
                    other => other.clone(),
                },
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|e| CfgEdge {
                source: e.source,
                target: e.target,
                back_edge: e.back_edge,
                label: e.label.clone(),
            })
            .collect();
        ControlFlowGraph {
            nodes,
            edges,
            entry: self.entry,
            exit: self.exit,
            next_id: self.next_id,
        }
    }

    /// Exports the graph to DOT format.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph CFG {\n");
        for node in &self.nodes {
            let label = match &node.kind {
                CfgNodeKind::Entry => "entry".to_string(),
                CfgNodeKind::Exit => "exit".to_string(),
                CfgNodeKind::Statement { path, description } => {
                    format!("{description} @{path}")
                }
                CfgNodeKind::Subgraph(_) => "subgraph".to_string(),
                CfgNodeKind::EndOfScope { variable } => format!("end of scope: {variable}"),
            };
            out.push_str(&format!("    {} [label=\"{}\"];\n", node.id.0, label));
        }
        for e in &self.edges {
            let style = if e.back_edge { " [style=dashed]" } else { "" };
            out.push_str(&format!("    {} -> {}{};\n", e.source.0, e.target.0, style));
        }
        out.push('}');
        out
    }
}
