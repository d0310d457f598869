//! Pass 6: control-flow-based dead code elimination.
//!
//! Builds a CFG per body on demand and removes every statement whose anchor
//! node is not reachable from `entry`. The CFG is dropped again once the
//! body is swept.

use super::{IntentionPass, PassContext};
use crate::cfg_builder::build_cfg;
use ir::cfg::StatementPath;
use ir::{CompoundStatement, IntentionGraph, PropertyMode, StatementKind};
use std::collections::HashSet;

pub struct UnreachableCodeElimination;

impl IntentionPass for UnreachableCodeElimination {
    fn name(&self) -> &'static str {
        "unreachable-code-elimination"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut changed = false;
        for type_id in graph.type_ids() {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            let (method_ids, property_ids) = match graph.type_intention(type_id) {
                Some(ty) => (ty.methods.clone(), ty.properties.clone()),
                None => continue,
            };
            for method_id in method_ids {
                if let Some(body) = graph.method_mut(method_id).and_then(|m| m.body.as_mut()) {
                    changed |= sweep_body(&mut body.statements);
                }
            }
            for property_id in property_ids {
                let Some(property) = graph.property_mut(property_id) else {
                    continue;
                };
                match &mut property.mode {
                    PropertyMode::Field => {}
                    PropertyMode::Computed { getter } => {
                        changed |= sweep_body(&mut getter.statements);
                    }
                    PropertyMode::Accessors { getter, setter } => {
                        changed |= sweep_body(&mut getter.statements);
                        changed |= sweep_body(&mut setter.body.statements);
                    }
                }
            }
        }
        let file_ids: Vec<_> = graph.files().to_vec();
        for file_id in file_ids {
            let global_ids = graph
                .file(file_id)
                .map(|f| f.globals.clone())
                .unwrap_or_default();
            for global_id in global_ids {
                if let Some(body) = graph.method_mut(global_id).and_then(|m| m.body.as_mut()) {
                    changed |= sweep_body(&mut body.statements);
                }
            }
        }
        changed
    }
}

fn sweep_body(body: &mut CompoundStatement) -> bool {
    if body.statements.is_empty() {
        return false;
    }
    let cfg = build_cfg(body);
    let reachable = cfg.reachable_statement_paths();
    sweep_block(body, &StatementPath::root(), &reachable)
}

fn sweep_block(
    block: &mut CompoundStatement,
    base: &StatementPath,
    reachable: &HashSet<StatementPath>,
) -> bool {
    let mut changed = false;
    let mut kept = Vec::with_capacity(block.statements.len());
    for (i, mut stmt) in block.statements.drain(..).enumerate() {
        let path = base.child(i);
        if !reachable.contains(&path) {
            changed = true;
            continue;
        }
        match &mut stmt.kind {
            StatementKind::If(s) => {
                changed |= sweep_block(&mut s.body, &path.child(0), reachable);
                if let Some(else_body) = &mut s.else_body {
                    changed |= sweep_block(else_body, &path.child(1), reachable);
                }
            }
            StatementKind::Switch(s) => {
                let case_count = s.cases.len();
                for (k, case) in s.cases.iter_mut().enumerate() {
                    changed |= sweep_block(&mut case.body, &path.child(k), reachable);
                }
                changed |= sweep_block(&mut s.default, &path.child(case_count), reachable);
            }
            StatementKind::While(s) => {
                changed |= sweep_block(&mut s.body, &path.child(0), reachable);
            }
            StatementKind::RepeatWhile(s) => {
                changed |= sweep_block(&mut s.body, &path.child(0), reachable);
            }
            StatementKind::ForIn(s) => {
                changed |= sweep_block(&mut s.body, &path.child(0), reachable);
            }
            StatementKind::Do(s) => {
                changed |= sweep_block(&mut s.body, &path.child(0), reachable);
                for (k, catch) in s.catch_blocks.iter_mut().enumerate() {
                    changed |= sweep_block(&mut catch.body, &path.child(k + 1), reachable);
                }
            }
            StatementKind::Defer(inner) => {
                changed |= sweep_block(inner, &path.child(0), reachable);
            }
            StatementKind::Compound(inner) => {
                changed |= sweep_block(inner, &path, reachable);
            }
            _ => {}
        }
        kept.push(stmt);
    }
    block.statements = kept;
    changed
}
