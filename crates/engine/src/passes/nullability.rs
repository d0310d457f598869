//! Pass 7: nullability propagation.
//!
//! Intentions collected inside an `NS_ASSUME_NONNULL` span carry the
//! `in_nonnull_context` flag; this pass rewrites their implicitly
//! nullability-open types (the `Unspecified` wrapper) to plain non-optional
//! types. Declarations outside such a span keep the wrapper and surface as
//! implicitly unwrapped in Swift.

use super::{IntentionPass, PassContext};
use ir::{IntentionGraph, IntentionId, IntentionKind, SwiftType};

pub struct NullabilityPropagation;

impl IntentionPass for NullabilityPropagation {
    fn name(&self) -> &'static str {
        "nullability-propagation"
    }

    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool {
        let mut changed = false;
        let mut targets: Vec<IntentionId> = Vec::new();
        for type_id in graph.type_ids() {
            if let Some(ty) = graph.type_intention(type_id) {
                targets.extend(ty.properties.iter().copied());
                targets.extend(ty.methods.iter().copied());
            }
        }
        for &file_id in graph.files() {
            if let Some(file) = graph.file(file_id) {
                targets.extend(file.globals.iter().copied());
            }
        }

        for id in targets {
            if ctx.cancellation.is_cancelled() {
                return changed;
            }
            if !graph.intention(id).in_nonnull_context {
                continue;
            }
            match &mut graph.intention_mut(id).kind {
                IntentionKind::Property(p) => {
                    changed |= strip_unspecified(&mut p.storage.ty);
                }
                IntentionKind::GlobalVariable(g) => {
                    changed |= strip_unspecified(&mut g.storage.ty);
                }
                IntentionKind::Method(m) => {
                    changed |= strip_unspecified(&mut m.signature.return_type);
                    for param in &mut m.signature.parameters {
                        changed |= strip_unspecified(&mut param.ty);
                    }
                }
                _ => {}
            }
        }
        changed
    }
}

/// Removes `Unspecified` wrappers at every level; explicit `Optional`
/// wrappers stay.
fn strip_unspecified(ty: &mut SwiftType) -> bool {
    let mut changed = false;
    loop {
        if let SwiftType::Unspecified(inner) = ty {
            *ty = (**inner).clone();
            changed = true;
        } else {
            break;
        }
    }
    match ty {
        SwiftType::Optional(inner) => changed |= strip_unspecified(inner),
        SwiftType::Array(inner) => changed |= strip_unspecified(inner),
        SwiftType::Dictionary(key, value) => {
            changed |= strip_unspecified(key);
            changed |= strip_unspecified(value);
        }
        SwiftType::Generic(_, args) => {
            for arg in args {
                changed |= strip_unspecified(arg);
            }
        }
        SwiftType::Function {
            parameters,
            returns,
        } => {
            for p in parameters {
                changed |= strip_unspecified(p);
            }
            changed |= strip_unspecified(returns);
        }
        _ => {}
    }
    changed
}
