//! Pass 4: identifier resolution.
//!
//! Resolves bare identifiers inside bodies to the nearest declaration,
//! searching local scopes, then parameters, then instance members, then
//! the enclosing type and other known type names, then file globals.
//! Resolutions are written once; an identifier that already carries a
//! definition is left alone, which keeps the pass idempotent.

use super::{IntentionPass, PassContext};
use ir::{
    CompoundStatement, Definition, Expression, ExpressionKind, FunctionSignature, IntentionGraph,
    IntentionKind, PropertyMode, StatementKind, SwiftType,
};
use parsers::TypeMapperContext;
use std::collections::{HashMap, HashSet};

pub struct IdentifierResolution;

impl IntentionPass for IdentifierResolution {
    fn name(&self) -> &'static str {
        "identifier-resolution"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut globals: HashMap<String, Option<SwiftType>> = HashMap::new();
        for &file_id in graph.files() {
            let Some(file) = graph.file(file_id) else {
                continue;
            };
            for &global_id in &file.globals {
                match &graph.intention(global_id).kind {
                    IntentionKind::GlobalVariable(g) => {
                        globals.insert(g.name.clone(), Some(g.storage.ty.clone()));
                    }
                    IntentionKind::Method(m) => {
                        globals.insert(m.signature.name.clone(), None);
                    }
                    _ => {}
                }
            }
        }
        let declared_types: HashSet<String> = graph
            .type_ids()
            .into_iter()
            .filter_map(|id| graph.type_intention(id).map(|t| t.name.clone()))
            .collect();

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
            let mut members: HashMap<String, SwiftType> = HashMap::new();
            for &prop in &property_ids {
                if let Some(p) = graph.property(prop) {
                    members.insert(p.name.clone(), p.storage.ty.clone());
                }
            }

            for method_id in method_ids {
                let Some(method) = graph.method_mut(method_id) else {
                    continue;
                };
                let params = parameter_map(&method.signature);
                if let Some(body) = &mut method.body {
                    let mut resolver = Resolver {
                        members: &members,
                        type_name: Some(&type_name),
                        params,
                        globals: &globals,
                        declared_types: &declared_types,
                        mapper: ctx.mapper,
                        scopes: Vec::new(),
                        changed: false,
                    };
                    resolver.block(&mut body.statements);
                    changed |= resolver.changed;
                }
            }

            for property_id in property_ids {
                let Some(property) = graph.property_mut(property_id) else {
                    continue;
                };
                let mut bodies: Vec<(&mut CompoundStatement, HashMap<String, (usize, SwiftType)>)> =
                    Vec::new();
                let value_ty = property.storage.ty.clone();
                match &mut property.mode {
                    PropertyMode::Field => {}
                    PropertyMode::Computed { getter } => {
                        bodies.push((&mut getter.statements, HashMap::new()));
                    }
                    PropertyMode::Accessors { getter, setter } => {
                        bodies.push((&mut getter.statements, HashMap::new()));
                        let mut setter_params = HashMap::new();
                        setter_params.insert(setter.value_name.clone(), (0, value_ty.clone()));
                        bodies.push((&mut setter.body.statements, setter_params));
                    }
                }
                for (body, params) in bodies {
                    let mut resolver = Resolver {
                        members: &members,
                        type_name: Some(&type_name),
                        params,
                        globals: &globals,
                        declared_types: &declared_types,
                        mapper: ctx.mapper,
                        scopes: Vec::new(),
                        changed: false,
                    };
                    resolver.block(body);
                    changed |= resolver.changed;
                }
            }
        }

        // Free functions see globals and type names only.
        let empty_members = HashMap::new();
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
                let params = parameter_map(&method.signature);
                if let Some(body) = &mut method.body {
                    let mut resolver = Resolver {
                        members: &empty_members,
                        type_name: None,
                        params,
                        globals: &globals,
                        declared_types: &declared_types,
                        mapper: ctx.mapper,
                        scopes: Vec::new(),
                        changed: false,
                    };
                    resolver.block(&mut body.statements);
                    changed |= resolver.changed;
                }
            }
        }
        changed
    }
}

fn parameter_map(signature: &FunctionSignature) -> HashMap<String, (usize, SwiftType)> {
    signature
        .parameters
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.clone(), (i, p.ty.clone())))
        .collect()
}

struct Resolver<'a> {
    members: &'a HashMap<String, SwiftType>,
    type_name: Option<&'a str>,
    params: HashMap<String, (usize, SwiftType)>,
    globals: &'a HashMap<String, Option<SwiftType>>,
    declared_types: &'a HashSet<String>,
    mapper: &'a TypeMapperContext,
    scopes: Vec<HashMap<String, Option<SwiftType>>>,
    changed: bool,
}

impl Resolver<'_> {
    fn block(&mut self, block: &mut CompoundStatement) {
        self.scopes.push(HashMap::new());
        for stmt in &mut block.statements {
            self.statement(stmt);
        }
        self.scopes.pop();
    }

    fn statement(&mut self, stmt: &mut ir::Statement) {
        match &mut stmt.kind {
            StatementKind::Expressions(exprs) => {
                for e in exprs {
                    self.expression(e);
                }
            }
            StatementKind::VariableDeclarations(decls) => {
                // Initializers see the outer bindings, not the new ones.
                for decl in decls.iter_mut() {
                    if let Some(init) = &mut decl.initializer {
                        self.expression(init);
                    }
                }
                let scope = self.scopes.last_mut().expect("open scope");
                for decl in decls {
                    scope.insert(decl.name.clone(), decl.ty.clone());
                }
            }
            StatementKind::If(s) => {
                self.expression(&mut s.condition);
                self.block(&mut s.body);
                if let Some(else_body) = &mut s.else_body {
                    self.block(else_body);
                }
            }
            StatementKind::Switch(s) => {
                self.expression(&mut s.subject);
                for case in &mut s.cases {
                    for pattern in &mut case.patterns {
                        self.expression(pattern);
                    }
                    self.block(&mut case.body);
                }
                self.block(&mut s.default);
            }
            StatementKind::While(s) => {
                self.expression(&mut s.condition);
                self.block(&mut s.body);
            }
            StatementKind::RepeatWhile(s) => {
                self.block(&mut s.body);
                self.expression(&mut s.condition);
            }
            StatementKind::ForIn(s) => {
                self.expression(&mut s.sequence);
                self.scopes.push(HashMap::new());
                self.scopes
                    .last_mut()
                    .expect("open scope")
                    .insert(s.binding.clone(), None);
                self.block(&mut s.body);
                self.scopes.pop();
            }
            StatementKind::Do(s) => {
                self.block(&mut s.body);
                for catch in &mut s.catch_blocks {
                    self.scopes.push(HashMap::new());
                    if let Some(binding) = &catch.binding {
                        self.scopes
                            .last_mut()
                            .expect("open scope")
                            .insert(binding.clone(), None);
                    }
                    self.block(&mut catch.body);
                    self.scopes.pop();
                }
            }
            StatementKind::Defer(body) | StatementKind::Compound(body) => self.block(body),
            StatementKind::Throw(e) => self.expression(e),
            StatementKind::Return(Some(e)) => self.expression(e),
            StatementKind::LocalFunction(func) => {
                self.scopes.push(
                    func.parameters
                        .iter()
                        .map(|p| (p.name.clone(), Some(p.ty.clone())))
                        .collect(),
                );
                self.block(&mut func.body);
                self.scopes.pop();
            }
            StatementKind::Return(None)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Fallthrough
            | StatementKind::Unknown(_) => {}
        }
    }

    fn expression(&mut self, expr: &mut Expression) {
        match &mut expr.kind {
            ExpressionKind::Identifier(ident) => {
                if ident.definition.is_none() && ident.name != "self" && ident.name != "super" {
                    if let Some(definition) = self.lookup(&ident.name) {
                        ident.definition = Some(definition);
                        self.changed = true;
                    }
                }
            }
            ExpressionKind::Closure {
                parameters, body, ..
            } => {
                self.scopes.push(
                    parameters
                        .iter()
                        .map(|p| (p.name.clone(), Some(p.ty.clone())))
                        .collect(),
                );
                self.block(body);
                self.scopes.pop();
            }
            ExpressionKind::Constant(_) => {}
            ExpressionKind::Binary { lhs, rhs, .. } => {
                self.expression(lhs);
                self.expression(rhs);
            }
            ExpressionKind::Assignment { target, value, .. } => {
                self.expression(target);
                self.expression(value);
            }
            ExpressionKind::Call { callee, arguments } => {
                self.expression(callee);
                for arg in arguments {
                    self.expression(&mut arg.value);
                }
            }
            ExpressionKind::Subscript { base, index } => {
                self.expression(base);
                self.expression(index);
            }
            ExpressionKind::Member { base, .. } => self.expression(base),
            ExpressionKind::Unary { operand, .. } => self.expression(operand),
            ExpressionKind::Cast { operand, .. } => self.expression(operand),
            ExpressionKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.expression(condition);
                self.expression(if_true);
                self.expression(if_false);
            }
            ExpressionKind::Parens(inner) => self.expression(inner),
        }
    }

    fn lookup(&self, name: &str) -> Option<Definition> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Some(Definition::Local { ty: ty.clone() });
            }
        }
        if let Some((index, ty)) = self.params.get(name) {
            return Some(Definition::Parameter {
                index: *index,
                ty: ty.clone(),
            });
        }
        if let Some(ty) = self.members.get(name) {
            return Some(Definition::Member {
                type_name: self.type_name.unwrap_or_default().to_string(),
                ty: ty.clone(),
            });
        }
        if self.declared_types.contains(name)
            || self.mapper.is_class(name)
            || self.mapper.is_protocol(name)
        {
            return Some(Definition::TypeName);
        }
        if let Some(ty) = self.globals.get(name) {
            return Some(Definition::Global { ty: ty.clone() });
        }
        None
    }
}
