//! Pass 5: expression type inference.
//!
//! Bottom-up over each expression tree: leaves take their types from
//! constants and resolved identifier definitions, interior nodes combine
//! child types, member and call nodes consult the member tables collected
//! from the graph. Unresolved nodes keep `None`; a type once resolved is
//! never overwritten.

use super::{IntentionPass, PassContext};
use ir::{
    BinaryOperator, Constant, Expression, ExpressionKind, IntentionGraph, PropertyMode,
    SwiftType, UnaryOperator,
};
use std::collections::HashMap;

pub struct ExpressionTypeInference;

impl IntentionPass for ExpressionTypeInference {
    fn name(&self) -> &'static str {
        "expression-type-inference"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let tables = MemberTables::collect(graph);
        let mut changed = false;

        for type_id in graph.type_ids() {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            let Some(ty) = graph.type_intention(type_id) else {
                continue;
            };
            let type_name = ty.name.clone();
            let method_ids = ty.methods.clone();
            let property_ids = ty.properties.clone();

            for method_id in method_ids {
                let Some(method) = graph.method_mut(method_id) else {
                    continue;
                };
                if let Some(body) = &mut method.body {
                    let mut inferencer = Inferencer {
                        tables: &tables,
                        current_type: Some(&type_name),
                        changed: false,
                    };
                    body.statements
                        .for_each_expression_mut(&mut |e| {
                            inferencer.infer(e);
                        });
                    changed |= inferencer.changed;
                }
            }
            for property_id in property_ids {
                let Some(property) = graph.property_mut(property_id) else {
                    continue;
                };
                let mut inferencer = Inferencer {
                    tables: &tables,
                    current_type: Some(&type_name),
                    changed: false,
                };
                match &mut property.mode {
                    PropertyMode::Field => {}
                    PropertyMode::Computed { getter } => getter
                        .statements
                        .for_each_expression_mut(&mut |e| {
                            inferencer.infer(e);
                        }),
                    PropertyMode::Accessors { getter, setter } => {
                        getter.statements.for_each_expression_mut(&mut |e| {
                            inferencer.infer(e);
                        });
                        setter
                            .body
                            .statements
                            .for_each_expression_mut(&mut |e| {
                                inferencer.infer(e);
                            });
                    }
                }
                changed |= inferencer.changed;
            }
        }

        let file_ids: Vec<_> = graph.files().to_vec();
        for file_id in file_ids {
            let global_ids = graph
                .file(file_id)
                .map(|f| f.globals.clone())
                .unwrap_or_default();
            for global_id in global_ids {
                let Some(method) = graph.method_mut(global_id) else {
                    continue;
                };
                if let Some(body) = &mut method.body {
                    let mut inferencer = Inferencer {
                        tables: &tables,
                        current_type: None,
                        changed: false,
                    };
                    body.statements
                        .for_each_expression_mut(&mut |e| {
                            inferencer.infer(e);
                        });
                    changed |= inferencer.changed;
                }
            }
        }
        changed
    }
}

/// Property and method-return types per type name, collected once per run.
struct MemberTables {
    properties: HashMap<(String, String), SwiftType>,
    method_returns: HashMap<(String, String), SwiftType>,
}

impl MemberTables {
    fn collect(graph: &IntentionGraph) -> Self {
        let mut properties = HashMap::new();
        let mut method_returns = HashMap::new();
        for type_id in graph.type_ids() {
            let Some(ty) = graph.type_intention(type_id) else {
                continue;
            };
            for &prop in &ty.properties {
                if let Some(p) = graph.property(prop) {
                    properties
                        .insert((ty.name.clone(), p.name.clone()), p.storage.ty.clone());
                }
            }
            for &method in &ty.methods {
                if let Some(m) = graph.method(method) {
                    method_returns.insert(
                        (ty.name.clone(), m.signature.name.clone()),
                        m.signature.return_type.clone(),
                    );
                }
            }
        }
        Self {
            properties,
            method_returns,
        }
    }
}

struct Inferencer<'a> {
    tables: &'a MemberTables,
    current_type: Option<&'a str>,
    changed: bool,
}

impl Inferencer<'_> {
    /// Infers and records the type of one node, assuming children have been
    /// or will be visited; recursion makes the traversal order irrelevant.
    fn infer(&mut self, expr: &mut Expression) -> Option<SwiftType> {
        if let Some(existing) = &expr.resolved_type {
            return Some(existing.clone());
        }
        let inferred = self.compute(expr);
        if let Some(ty) = &inferred {
            expr.resolved_type = Some(ty.clone());
            self.changed = true;
        }
        inferred
    }

    fn compute(&mut self, expr: &mut Expression) -> Option<SwiftType> {
        match &mut expr.kind {
            ExpressionKind::Constant(c) => match c {
                Constant::Int(_) => Some(SwiftType::int()),
                Constant::Float(_) => Some(SwiftType::double()),
                Constant::Bool(_) => Some(SwiftType::bool()),
                Constant::String(_) => Some(SwiftType::string()),
                Constant::Nil => None,
            },
            ExpressionKind::Identifier(ident) => {
                if ident.name == "self" {
                    return self.current_type.map(SwiftType::nominal);
                }
                match ident.definition.as_ref()? {
                    ir::Definition::Local { ty } => ty.clone(),
                    ir::Definition::Parameter { ty, .. } => Some(ty.clone()),
                    ir::Definition::Member { ty, .. } => Some(ty.clone()),
                    ir::Definition::Global { ty } => ty.clone(),
                    ir::Definition::TypeName => None,
                }
            }
            ExpressionKind::Binary { lhs, op, rhs } => {
                let lhs_ty = self.infer(lhs);
                let rhs_ty = self.infer(rhs);
                if op.is_comparison() {
                    return Some(SwiftType::bool());
                }
                match op {
                    BinaryOperator::NilCoalesce => rhs_ty,
                    BinaryOperator::OpenRange => {
                        Some(SwiftType::Generic("Range".into(), vec![lhs_ty?]))
                    }
                    BinaryOperator::ClosedRange => {
                        Some(SwiftType::Generic("ClosedRange".into(), vec![lhs_ty?]))
                    }
                    _ => lhs_ty.or(rhs_ty),
                }
            }
            ExpressionKind::Assignment { target, value, .. } => {
                let target_ty = self.infer(target);
                let value_ty = self.infer(value);
                target_ty.or(value_ty)
            }
            ExpressionKind::Call { callee, arguments } => {
                for arg in arguments.iter_mut() {
                    self.infer(&mut arg.value);
                }
                // Resolve through the member tables when the receiver type
                // is known.
                if let ExpressionKind::Member { base, name } = &mut callee.kind {
                    let base_ty = self.infer(base);
                    let receiver = base_ty.as_ref().and_then(nominal_name);
                    if let Some(receiver) = receiver {
                        let key = (receiver, name.clone());
                        if let Some(ret) = self.tables.method_returns.get(&key) {
                            if *ret == SwiftType::Void {
                                return Some(SwiftType::Void);
                            }
                            return Some(ret.clone());
                        }
                    }
                    None
                } else {
                    self.infer(callee);
                    None
                }
            }
            ExpressionKind::Subscript { base, index } => {
                let base_ty = self.infer(base);
                self.infer(index);
                match base_ty.map(|t| t.dropping_nullability()) {
                    Some(SwiftType::Array(element)) => Some(*element),
                    Some(SwiftType::Dictionary(_, value)) => Some(SwiftType::Optional(value)),
                    _ => None,
                }
            }
            ExpressionKind::Member { base, name } => {
                let base_ty = self.infer(base);
                let receiver = base_ty.as_ref().and_then(nominal_name)?;
                self.tables.properties.get(&(receiver, name.clone())).cloned()
            }
            ExpressionKind::Unary { op, operand } => {
                let operand_ty = self.infer(operand);
                match op {
                    UnaryOperator::Not => Some(SwiftType::bool()),
                    UnaryOperator::Negate | UnaryOperator::BitwiseNot => operand_ty,
                }
            }
            ExpressionKind::Cast { operand, target } => {
                self.infer(operand);
                Some(target.clone())
            }
            ExpressionKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.infer(condition);
                let true_ty = self.infer(if_true);
                let false_ty = self.infer(if_false);
                match (&true_ty, &false_ty) {
                    (Some(a), Some(b)) if a == b => true_ty,
                    _ => true_ty.or(false_ty),
                }
            }
            ExpressionKind::Closure {
                parameters,
                return_type,
                body,
            } => {
                let mut visitor = |e: &mut Expression| {
                    self.infer(e);
                };
                body.for_each_expression_mut(&mut visitor);
                Some(SwiftType::Function {
                    parameters: parameters.iter().map(|p| p.ty.clone()).collect(),
                    returns: Box::new(return_type.clone()),
                })
            }
            ExpressionKind::Parens(inner) => self.infer(inner),
        }
    }
}

/// The nominal name behind a possibly nullability-wrapped type.
fn nominal_name(ty: &SwiftType) -> Option<String> {
    match ty.dropping_nullability() {
        SwiftType::Nominal(name) => Some(name),
        _ => None,
    }
}
