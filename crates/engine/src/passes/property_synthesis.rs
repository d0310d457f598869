//! Pass 2: property accessor synthesis.
//!
//! Folds explicit `name`/`setName:` method pairs into the property they
//! implement, collapses trivial backing-field accessors to plain stored
//! form, and fills in members a declared protocol conformance promises but
//! the type never spelled out (via the known-member descriptors).

use super::{IntentionPass, PassContext};
use ir::{
    Expression, ExpressionKind, FunctionBody, IntentionGraph, IntentionId, MethodDescriptor,
    PropertyAttribute, PropertyDescriptor, PropertyMode, PropertySetter, Selector,
    StatementKind, TypeKind,
};

pub struct PropertySynthesis;

impl IntentionPass for PropertySynthesis {
    fn name(&self) -> &'static str {
        "property-synthesis"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut changed = false;
        for type_id in graph.type_ids() {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            let Some(ty) = graph.type_intention(type_id) else {
                continue;
            };
            if ty.kind == TypeKind::Protocol {
                continue;
            }
            changed |= fold_accessor_methods(graph, type_id);
            changed |= synthesise_conformances(graph, type_id);
        }
        changed
    }
}

fn fold_accessor_methods(graph: &mut IntentionGraph, type_id: IntentionId) -> bool {
    let mut changed = false;
    let property_ids = graph
        .type_intention(type_id)
        .map(|t| t.properties.clone())
        .unwrap_or_default();
    for property_id in property_ids {
        let Some(property) = graph.property(property_id) else {
            continue;
        };
        if !matches!(property.mode, PropertyMode::Field) {
            continue;
        }
        let name = property.name.clone();
        let readonly = property.is_readonly();
        let getter_name = property
            .attributes
            .iter()
            .find_map(|a| match a {
                PropertyAttribute::Getter(g) => Some(g.clone()),
                _ => None,
            })
            .unwrap_or_else(|| name.clone());
        let setter_name = property
            .attributes
            .iter()
            .find_map(|a| match a {
                PropertyAttribute::Setter(s) => Some(s.trim_end_matches(':').to_string()),
                _ => None,
            })
            .unwrap_or_else(|| format!("set{}", capitalize(&name)));

        let getter_id = graph
            .method_matching_selector(type_id, &Selector::unary(getter_name))
            .filter(|&id| graph.method(id).is_some_and(|m| m.body.is_some()));
        let setter_id = graph
            .method_matching_selector(type_id, &Selector::with_arguments(vec![setter_name]))
            .filter(|&id| graph.method(id).is_some_and(|m| m.body.is_some()));

        if readonly {
            let Some(getter_id) = getter_id else {
                continue;
            };
            let body = graph.method(getter_id).and_then(|m| m.body.clone());
            let Some(body) = body else { continue };
            graph.remove_from_parent(getter_id);
            if !is_trivial_getter(&body, &name) {
                if let Some(property) = graph.property_mut(property_id) {
                    property.mode = PropertyMode::Computed { getter: body };
                }
            }
            changed = true;
            continue;
        }

        let (Some(getter_id), Some(setter_id)) = (getter_id, setter_id) else {
            continue;
        };
        let getter_body = graph.method(getter_id).and_then(|m| m.body.clone());
        let setter = graph.method(setter_id).cloned();
        let (Some(getter_body), Some(setter)) = (getter_body, setter) else {
            continue;
        };
        let value_name = setter
            .signature
            .parameters
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "newValue".to_string());
        let setter_body = setter.body.clone().unwrap_or_default();

        graph.remove_from_parent(getter_id);
        graph.remove_from_parent(setter_id);
        if !(is_trivial_getter(&getter_body, &name)
            && is_trivial_setter(&setter_body, &name, &value_name))
        {
            if let Some(property) = graph.property_mut(property_id) {
                property.mode = PropertyMode::Accessors {
                    getter: getter_body,
                    setter: PropertySetter {
                        value_name,
                        body: setter_body,
                    },
                };
            }
        }
        changed = true;
    }
    changed
}

/// `return name` or `return _name`, nothing else.
fn is_trivial_getter(body: &FunctionBody, property: &str) -> bool {
    let [stmt] = body.statements.statements.as_slice() else {
        return false;
    };
    let StatementKind::Return(Some(expr)) = &stmt.kind else {
        return false;
    };
    is_backing_field(expr, property)
}

/// `name = value` or `_name = value`, nothing else.
fn is_trivial_setter(body: &FunctionBody, property: &str, value_name: &str) -> bool {
    let [stmt] = body.statements.statements.as_slice() else {
        return false;
    };
    let StatementKind::Expressions(exprs) = &stmt.kind else {
        return false;
    };
    let [expr] = exprs.as_slice() else {
        return false;
    };
    let ExpressionKind::Assignment { target, op, value } = &expr.kind else {
        return false;
    };
    *op == ir::AssignmentOperator::Assign
        && is_backing_field(target, property)
        && value.as_identifier() == Some(value_name)
}

fn is_backing_field(expr: &Expression, property: &str) -> bool {
    match expr.as_identifier() {
        Some(name) => name == property || name.strip_prefix('_') == Some(property),
        None => false,
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Adds the members a conformed-to protocol declares but the type lacks,
/// generated from the protocol's known-member descriptors.
fn synthesise_conformances(graph: &mut IntentionGraph, type_id: IntentionId) -> bool {
    let mut changed = false;
    let conformance_ids = graph
        .type_intention(type_id)
        .map(|t| t.conformances.clone())
        .unwrap_or_default();
    for conformance_id in conformance_ids {
        let Some(protocol_name) = graph
            .conformance(conformance_id)
            .map(|c| c.protocol_name.clone())
        else {
            continue;
        };
        let Some(protocol_id) = graph.type_named(&protocol_name) else {
            continue;
        };
        if graph.type_intention(protocol_id).map(|t| t.kind) != Some(TypeKind::Protocol) {
            continue;
        }

        let mut property_descriptors: Vec<PropertyDescriptor> = Vec::new();
        let mut method_descriptors: Vec<MethodDescriptor> = Vec::new();
        if let Some(protocol) = graph.type_intention(protocol_id) {
            for &prop in &protocol.properties {
                if let Some(p) = graph.property(prop) {
                    property_descriptors.push(PropertyDescriptor {
                        name: p.name.clone(),
                        ty: p.storage.ty.clone(),
                        is_readonly: p.is_readonly(),
                    });
                }
            }
            for &method in &protocol.methods {
                if let Some(m) = graph.method(method) {
                    method_descriptors.push(MethodDescriptor {
                        signature: m.signature.clone(),
                    });
                }
            }
        }

        for descriptor in property_descriptors {
            if graph.property_named(type_id, &descriptor.name).is_none() {
                graph.generate_property(type_id, &descriptor);
                changed = true;
            }
        }
        for descriptor in method_descriptors {
            let selector = descriptor.signature.selector();
            if graph.method_matching_selector(type_id, &selector).is_none() {
                let id = graph.generate_method(type_id, &descriptor);
                // Conformance stubs get an empty body so the type stays
                // concrete.
                if let Some(method) = graph.method_mut(id) {
                    method.body = Some(FunctionBody::default());
                }
                changed = true;
            }
        }
    }
    changed
}
