//! Pass 1: merge duplicate type fragments.
//!
//! `@interface`/`@implementation` pairs, categories and class extensions
//! all lower to separate fragments sharing a type name. This pass folds the
//! later fragments into the first: members move over (interface
//! declarations gain their implementation bodies), conformances dedupe,
//! and the emptied fragment is unlinked from its file.

use super::{IntentionPass, PassContext};
use ir::{IntentionGraph, IntentionId, TypeKind};
use std::collections::HashMap;

pub struct TypeFragmentMerge;

impl IntentionPass for TypeFragmentMerge {
    fn name(&self) -> &'static str {
        "type-fragment-merge"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut changed = false;
        let mut primaries: HashMap<(String, bool), IntentionId> = HashMap::new();
        for id in graph.type_ids() {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            let Some(ty) = graph.type_intention(id) else {
                continue;
            };
            let key = (ty.name.clone(), ty.kind == TypeKind::Protocol);
            match primaries.get(&key) {
                None => {
                    primaries.insert(key, id);
                }
                Some(&primary) => {
                    merge_into(graph, primary, id);
                    graph.remove_from_parent(id);
                    changed = true;
                }
            }
        }
        changed
    }
}

fn merge_into(graph: &mut IntentionGraph, primary: IntentionId, fragment: IntentionId) {
    let Some(frag) = graph.type_intention(fragment) else {
        return;
    };
    let properties = frag.properties.clone();
    let methods = frag.methods.clone();
    let conformances = frag.conformances.clone();
    let supertype = frag.supertype.clone();

    if let Some(primary_ty) = graph.type_intention_mut(primary) {
        if primary_ty.supertype.is_none() {
            primary_ty.supertype = supertype;
        }
    }

    for prop in properties {
        let name = graph.property(prop).map(|p| p.name.clone());
        let duplicate =
            name.and_then(|n| graph.property_named(primary, &n));
        match duplicate {
            Some(_) => graph.remove_from_parent(prop),
            None => graph.reparent_member(prop, primary),
        }
    }

    for method in methods {
        let selector = graph.method(method).map(|m| m.signature.selector());
        let existing =
            selector.and_then(|sel| graph.method_matching_selector(primary, &sel));
        match existing {
            Some(existing_id) => {
                // A declaration meets its definition: adopt the body.
                let body = graph.method(method).and_then(|m| m.body.clone());
                if let (Some(body), Some(target)) = (body, graph.method_mut(existing_id)) {
                    if target.body.is_none() {
                        target.body = Some(body);
                    }
                }
                graph.remove_from_parent(method);
            }
            None => graph.reparent_member(method, primary),
        }
    }

    for conformance in conformances {
        let name = graph.conformance(conformance).map(|c| c.protocol_name.clone());
        let duplicate = name.and_then(|n| graph.conformance_named(primary, &n));
        match duplicate {
            Some(_) => graph.remove_from_parent(conformance),
            None => graph.reparent_member(conformance, primary),
        }
    }
}
