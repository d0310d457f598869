//! Pass 3: readonly promotion.
//!
//! Properties whose attribute scan finds `readonly` become get-only Swift:
//! protocol requirements turn into `{ get }` computed declarations, stored
//! class properties without a custom getter become `let` constants.

use super::{IntentionPass, PassContext};
use ir::{FunctionBody, IntentionGraph, PropertyMode, TypeKind};

pub struct ReadonlyPromotion;

impl IntentionPass for ReadonlyPromotion {
    fn name(&self) -> &'static str {
        "readonly-promotion"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut changed = false;
        for type_id in graph.type_ids() {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            let Some((is_protocol, property_ids)) = graph
                .type_intention(type_id)
                .map(|ty| (ty.kind == TypeKind::Protocol, ty.properties.clone()))
            else {
                continue;
            };
            for property_id in property_ids {
                let Some(property) = graph.property(property_id) else {
                    continue;
                };
                if !property.is_readonly() || !matches!(property.mode, PropertyMode::Field) {
                    continue;
                }
                let property = graph
                    .property_mut(property_id)
                    .expect("property id collected above");
                if is_protocol {
                    // A requirement carries no storage; an empty getter body
                    // renders as `{ get }`.
                    property.mode = PropertyMode::Computed {
                        getter: FunctionBody::default(),
                    };
                } else {
                    if property.storage.is_constant {
                        continue;
                    }
                    property.storage.is_constant = true;
                }
                changed = true;
            }
        }
        changed
    }
}
