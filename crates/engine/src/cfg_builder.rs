//! Control-flow graph construction over Swift statement trees.
//!
//! Every statement contributes exactly one anchor node addressed by its
//! statement path, so downstream analyses can map reachability back onto
//! the body. Deferred blocks become subgraph nodes that every exit edge of
//! their scope is routed through, matching the run-on-every-exit semantics
//! of `defer`.

use ir::cfg::{ControlFlowGraph, NodeId, StatementPath};
use ir::{CompoundStatement, Statement, StatementKind};

/// Builds the CFG of a method body.
pub fn build_cfg(body: &CompoundStatement) -> ControlFlowGraph {
    build_cfg_rooted(body, StatementPath::root())
}

/// Builds a CFG whose statement paths hang under `base`; used for the inner
/// graphs of subgraph nodes.
pub fn build_cfg_rooted(body: &CompoundStatement, base: StatementPath) -> ControlFlowGraph {
    let mut builder = Builder {
        graph: ControlFlowGraph::new(),
        frames: Vec::new(),
        scopes: Vec::new(),
        catches: Vec::new(),
    };
    let entry = builder.graph.entry();
    let frontier = builder.block(body, &base, vec![entry]);
    let exit = builder.graph.exit();
    builder.connect(&frontier, exit);
    builder.graph
}

/// A `break`/`continue`/`fallthrough` routing frame; one per enclosing
/// loop or switch.
struct Frame {
    is_loop: bool,
    continue_target: Option<NodeId>,
    breaks: Vec<NodeId>,
    fallthroughs: Vec<NodeId>,
    scope_depth: usize,
}

struct Builder {
    graph: ControlFlowGraph,
    frames: Vec<Frame>,
    /// Defer subgraph nodes, one list per open scope.
    scopes: Vec<Vec<NodeId>>,
    /// Nearest enclosing catch anchors, with the scope depth they guard.
    catches: Vec<(NodeId, usize)>,
}

impl Builder {
    fn connect(&mut self, sources: &[NodeId], target: NodeId) {
        for &source in sources {
            // A frontier can mention the same node twice (empty branches);
            // keep the edge list simple.
            if !self.graph.successors(source).contains(&target) {
                self.graph.add_edge(source, target);
            }
        }
    }

    /// Chains a frontier through defer nodes in reverse declaration order.
    fn route_defers(&mut self, mut frontier: Vec<NodeId>, defers: &[NodeId]) -> Vec<NodeId> {
        for &deferred in defers.iter().rev() {
            if frontier.is_empty() {
                break;
            }
            self.connect(&frontier, deferred);
            frontier = vec![deferred];
        }
        frontier
    }

    /// Routes a frontier through every defer of the scopes at or above
    /// `scope_depth`, innermost first.
    fn defers_from(&mut self, scope_depth: usize, frontier: Vec<NodeId>) -> Vec<NodeId> {
        let defers: Vec<NodeId> = self.scopes[scope_depth..]
            .iter()
            .flatten()
            .copied()
            .collect();
        self.route_defers(frontier, &defers)
    }

    fn block(
        &mut self,
        block: &CompoundStatement,
        base: &StatementPath,
        mut frontier: Vec<NodeId>,
    ) -> Vec<NodeId> {
        self.scopes.push(Vec::new());
        let mut declared: Vec<String> = Vec::new();
        for (i, stmt) in block.statements.iter().enumerate() {
            if let StatementKind::VariableDeclarations(decls) = &stmt.kind {
                declared.extend(decls.iter().map(|d| d.name.clone()));
            }
            frontier = self.statement(stmt, base.child(i), frontier);
        }
        if !frontier.is_empty() {
            for name in declared.iter().rev() {
                let marker = self.graph.add_end_of_scope(name.clone());
                self.connect(&frontier, marker);
                frontier = vec![marker];
            }
        }
        let defers = self.scopes.pop().expect("scope stack underflow");
        self.route_defers(frontier, &defers)
    }

    fn statement(
        &mut self,
        stmt: &Statement,
        path: StatementPath,
        frontier: Vec<NodeId>,
    ) -> Vec<NodeId> {
        match &stmt.kind {
            StatementKind::Expressions(_) => self.linear(path, "expressions", frontier),
            StatementKind::VariableDeclarations(_) => {
                self.linear(path, "variable declaration", frontier)
            }
            StatementKind::Unknown(_) => self.linear(path, "unknown", frontier),
            StatementKind::LocalFunction(_) => self.linear(path, "local function", frontier),
            StatementKind::Compound(inner) => {
                let anchor = self.graph.add_statement_node(path.clone(), "block");
                self.connect(&frontier, anchor);
                self.block(inner, &path, vec![anchor])
            }
            StatementKind::If(s) => {
                let condition = self.graph.add_statement_node(path.clone(), "if");
                self.connect(&frontier, condition);
                let mut result = self.block(&s.body, &path.child(0), vec![condition]);
                match &s.else_body {
                    Some(else_body) => {
                        result.extend(self.block(else_body, &path.child(1), vec![condition]));
                    }
                    // A missing branch is a direct edge to the join.
                    None => result.push(condition),
                }
                result
            }
            StatementKind::Switch(s) => {
                let subject = self.graph.add_statement_node(path.clone(), "switch");
                self.connect(&frontier, subject);
                self.frames.push(Frame {
                    is_loop: false,
                    continue_target: None,
                    breaks: Vec::new(),
                    fallthroughs: Vec::new(),
                    scope_depth: self.scopes.len(),
                });
                let mut result = Vec::new();
                let mut pending: Vec<NodeId> = Vec::new();
                for (k, case) in s.cases.iter().enumerate() {
                    let mut entry = vec![subject];
                    entry.append(&mut pending);
                    result.extend(self.block(&case.body, &path.child(k), entry));
                    let frame = self.frames.last_mut().expect("switch frame");
                    pending = std::mem::take(&mut frame.fallthroughs);
                }
                let mut entry = vec![subject];
                entry.append(&mut pending);
                result.extend(self.block(&s.default, &path.child(s.cases.len()), entry));
                let frame = self.frames.pop().expect("switch frame");
                result.extend(frame.breaks);
                result
            }
            StatementKind::While(s) => {
                let header = self.graph.add_statement_node(path.clone(), "while");
                self.connect(&frontier, header);
                self.loop_body(&s.body, &path.child(0), header, vec![header])
            }
            StatementKind::ForIn(s) => {
                let header = self.graph.add_statement_node(path.clone(), "for-in");
                self.connect(&frontier, header);
                self.loop_body(&s.body, &path.child(0), header, vec![header])
            }
            StatementKind::RepeatWhile(s) => {
                // The condition node anchors the statement; the body runs
                // first, so the incoming frontier enters the body and the
                // condition loops back to it.
                let condition = self.graph.add_statement_node(path.clone(), "repeat-while");
                let mut entry = frontier;
                entry.push(condition);
                let mut exits = self.loop_body_to(&s.body, &path.child(0), condition, entry);
                exits.push(condition);
                exits
            }
            StatementKind::Do(s) => {
                let anchor = self.graph.add_statement_node(path.clone(), "do");
                self.connect(&frontier, anchor);
                let anchors: Vec<NodeId> = s
                    .catch_blocks
                    .iter()
                    .enumerate()
                    .map(|(k, _)| self.graph.add_statement_node(path.child(k + 1), "catch"))
                    .collect();
                if let Some(&first) = anchors.first() {
                    self.catches.push((first, self.scopes.len()));
                }
                let mut result = self.block(&s.body, &path.child(0), vec![anchor]);
                if !anchors.is_empty() {
                    self.catches.pop();
                }
                for (k, catch) in s.catch_blocks.iter().enumerate() {
                    result.extend(self.block(&catch.body, &path.child(k + 1), vec![anchors[k]]));
                }
                result
            }
            StatementKind::Defer(body) => {
                let anchor = self.graph.add_statement_node(path.clone(), "defer");
                self.connect(&frontier, anchor);
                let inner = build_cfg_rooted(body, path.child(0));
                let subgraph = self.graph.add_subgraph_node(inner);
                self.scopes
                    .last_mut()
                    .expect("defer outside any scope")
                    .push(subgraph);
                vec![anchor]
            }
            StatementKind::Throw(_) => {
                let node = self.graph.add_statement_node(path, "throw");
                self.connect(&frontier, node);
                let (target, depth) = match self.catches.last() {
                    Some(&(anchor, depth)) => (anchor, depth),
                    None => (self.graph.exit(), 0),
                };
                let routed = self.defers_from(depth, vec![node]);
                self.connect(&routed, target);
                Vec::new()
            }
            StatementKind::Return(_) => {
                let node = self.graph.add_statement_node(path, "return");
                self.connect(&frontier, node);
                let routed = self.defers_from(0, vec![node]);
                let exit = self.graph.exit();
                self.connect(&routed, exit);
                Vec::new()
            }
            StatementKind::Break => {
                let node = self.graph.add_statement_node(path, "break");
                self.connect(&frontier, node);
                if let Some(depth) = self.frames.last().map(|f| f.scope_depth) {
                    let routed = self.defers_from(depth, vec![node]);
                    self.frames
                        .last_mut()
                        .expect("break frame")
                        .breaks
                        .extend(routed);
                }
                Vec::new()
            }
            StatementKind::Continue => {
                let node = self.graph.add_statement_node(path, "continue");
                self.connect(&frontier, node);
                let frame_info = self
                    .frames
                    .iter()
                    .rev()
                    .find(|f| f.is_loop)
                    .map(|f| (f.continue_target, f.scope_depth));
                if let Some((Some(target), depth)) = frame_info {
                    let routed = self.defers_from(depth, vec![node]);
                    self.connect(&routed, target);
                }
                Vec::new()
            }
            StatementKind::Fallthrough => {
                let node = self.graph.add_statement_node(path, "fallthrough");
                self.connect(&frontier, node);
                if let Some(frame) = self.frames.iter_mut().rev().find(|f| !f.is_loop) {
                    frame.fallthroughs.push(node);
                }
                Vec::new()
            }
        }
    }

    fn linear(&mut self, path: StatementPath, description: &str, frontier: Vec<NodeId>) -> Vec<NodeId> {
        let node = self.graph.add_statement_node(path, description);
        self.connect(&frontier, node);
        vec![node]
    }

    /// Loop body wiring shared by `while` and `for-in`: body exits loop back
    /// to the header, `break` joins the loop's frontier, `continue` targets
    /// the header.
    fn loop_body(
        &mut self,
        body: &CompoundStatement,
        base: &StatementPath,
        header: NodeId,
        entry: Vec<NodeId>,
    ) -> Vec<NodeId> {
        let mut exits = self.loop_body_to(body, base, header, entry);
        exits.push(header);
        exits
    }

    fn loop_body_to(
        &mut self,
        body: &CompoundStatement,
        base: &StatementPath,
        back_target: NodeId,
        entry: Vec<NodeId>,
    ) -> Vec<NodeId> {
        self.frames.push(Frame {
            is_loop: true,
            continue_target: Some(back_target),
            breaks: Vec::new(),
            fallthroughs: Vec::new(),
            scope_depth: self.scopes.len(),
        });
        let body_frontier = self.block(body, base, entry);
        self.connect(&body_frontier, back_target);
        let frame = self.frames.pop().expect("loop frame");
        frame.breaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::cfg::CfgNodeKind;
    use ir::{
        AssignmentOperator, CompoundStatement, Expression, IfStatement, Statement, StatementKind,
        WhileStatement,
    };

    fn assign(name: &str, value: i64) -> Statement {
        Statement::expression(Expression::assignment(
            Expression::identifier(name),
            AssignmentOperator::Assign,
            Expression::int(value),
        ))
    }

    fn statement_ids(cfg: &ControlFlowGraph) -> Vec<(String, NodeId)> {
        cfg.nodes()
            .filter_map(|n| match &n.kind {
                CfgNodeKind::Statement { path, .. } => Some((path.to_string(), n.id)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn if_else_then_sequence_builds_the_diamond() {
        // if (c) { A } else { B }; C
        let body = CompoundStatement::new(vec![
            Statement::new(StatementKind::If(IfStatement {
                condition: Expression::identifier("c"),
                body: CompoundStatement::new(vec![assign("a", 1)]),
                else_body: Some(CompoundStatement::new(vec![assign("b", 2)])),
            })),
            assign("c", 3),
        ]);
        let mut cfg = build_cfg(&body);
        cfg.prune();
        cfg.mark_back_edges();

        assert_eq!(cfg.node_count(), 6, "entry, if, A, B, C, exit");
        let ids = statement_ids(&cfg);
        let find = |p: &str| ids.iter().find(|(path, _)| path == p).map(|(_, id)| *id).unwrap();
        let cond = find("0");
        let a = find("0.0.0");
        let b = find("0.1.0");
        let c = find("1");

        assert_eq!(cfg.successors(cfg.entry()), vec![cond]);
        let mut cond_succ = cfg.successors(cond);
        cond_succ.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(cond_succ, expected);
        assert_eq!(cfg.successors(a), vec![c]);
        assert_eq!(cfg.successors(b), vec![c]);
        assert_eq!(cfg.successors(c), vec![cfg.exit()]);
        assert!(cfg.edges().all(|e| !e.back_edge));
    }

    #[test]
    fn while_loop_gets_back_edge_and_exit() {
        let body = CompoundStatement::new(vec![Statement::new(StatementKind::While(
            WhileStatement {
                condition: Expression::identifier("c"),
                body: CompoundStatement::new(vec![assign("x", 1)]),
            },
        ))]);
        let mut cfg = build_cfg(&body);
        cfg.mark_back_edges();

        let back: Vec<_> = cfg.edges().filter(|e| e.back_edge).collect();
        assert_eq!(back.len(), 1);
        let header = back[0].target;
        assert!(cfg.successors(header).contains(&cfg.exit()));
    }

    #[test]
    fn statements_after_return_are_unreachable() {
        let body = CompoundStatement::new(vec![
            Statement::return_stmt(None),
            assign("x", 1),
        ]);
        let cfg = build_cfg(&body);
        let reachable = cfg.reachable_statement_paths();
        assert!(reachable.contains(&StatementPath(vec![0])));
        assert!(!reachable.contains(&StatementPath(vec![1])));
    }

    #[test]
    fn defer_intercepts_scope_exits() {
        // { defer { d = 1 }; return; }
        let body = CompoundStatement::new(vec![
            Statement::new(StatementKind::Defer(CompoundStatement::new(vec![assign(
                "d", 1,
            )]))),
            Statement::return_stmt(None),
        ]);
        let mut cfg = build_cfg(&body);
        // The return must flow through the deferred subgraph before exit.
        let subgraph = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::Subgraph(_)))
            .expect("deferred body is a subgraph node")
            .id;
        let return_node = statement_ids(&cfg)
            .into_iter()
            .find(|(p, _)| p == "1")
            .map(|(_, id)| id)
            .unwrap();
        assert_eq!(cfg.successors(return_node), vec![subgraph]);
        assert_eq!(cfg.successors(subgraph), vec![cfg.exit()]);

        // Expansion keeps the deferred statement reachable.
        cfg.expand_subgraphs();
        cfg.prune();
        assert!(cfg
            .reachable_statement_paths()
            .contains(&StatementPath(vec![0, 0, 0])));
    }

    #[test]
    fn break_escapes_through_enclosing_defer() {
        // while (c) { defer { d = 1 }; break; } ; after
        let body = CompoundStatement::new(vec![
            Statement::new(StatementKind::While(WhileStatement {
                condition: Expression::identifier("c"),
                body: CompoundStatement::new(vec![
                    Statement::new(StatementKind::Defer(CompoundStatement::new(vec![assign(
                        "d", 1,
                    )]))),
                    Statement::break_stmt(),
                ]),
            })),
            assign("after", 2),
        ]);
        let cfg = build_cfg(&body);
        let after = statement_ids(&cfg)
            .into_iter()
            .find(|(p, _)| p == "1")
            .map(|(_, id)| id)
            .unwrap();
        let subgraph = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::Subgraph(_)))
            .expect("subgraph")
            .id;
        assert!(
            cfg.predecessors(after).contains(&subgraph),
            "break must route through the defer before reaching the join"
        );
    }
}
