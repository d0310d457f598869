//! Intention passes and their fixed-point scheduler.
//!
//! A pass mutates the graph in place and reports whether it changed
//! anything. Passes run in declared order; the order is part of the
//! contract and the passes are not commutative. The schedule sweeps until
//! a full round reports no change or the iteration cap is hit.

mod dead_code;
mod identifier_resolution;
mod merge_fragments;
mod nullability;
mod property_synthesis;
mod readonly_promotion;
mod type_inference;

pub use dead_code::UnreachableCodeElimination;
pub use identifier_resolution::IdentifierResolution;
pub use merge_fragments::TypeFragmentMerge;
pub use nullability::NullabilityPropagation;
pub use property_synthesis::PropertySynthesis;
pub use readonly_promotion::ReadonlyPromotion;
pub use type_inference::ExpressionTypeInference;

use crate::debug::{emit, DebugEvent};
use ir::IntentionGraph;
use parsers::TypeMapperContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cooperative stop signal checked between siblings and body statements.
/// A cancelled pass returns early, leaving the graph structurally valid.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Shared per-run state handed to every pass.
pub struct PassContext<'a> {
    pub mapper: &'a TypeMapperContext,
    pub cancellation: &'a CancellationToken,
}

pub trait IntentionPass {
    fn name(&self) -> &'static str;

    /// Runs once over the whole graph; returns `true` if anything changed.
    fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> bool;
}

pub const DEFAULT_MAX_ITERATIONS: usize = 16;

pub struct PassSchedule {
    passes: Vec<Box<dyn IntentionPass>>,
    max_iterations: usize,
}

impl PassSchedule {
    pub fn new(passes: Vec<Box<dyn IntentionPass>>, max_iterations: usize) -> Self {
        Self {
            passes,
            max_iterations,
        }
    }

    /// The standard catalogue, in its specified order.
    pub fn standard(max_iterations: usize) -> Self {
        Self::new(
            vec![
                Box::new(TypeFragmentMerge),
                Box::new(PropertySynthesis),
                Box::new(ReadonlyPromotion),
                Box::new(IdentifierResolution),
                Box::new(ExpressionTypeInference),
                Box::new(UnreachableCodeElimination),
                Box::new(NullabilityPropagation),
            ],
            max_iterations,
        )
    }

    /// Sweeps the catalogue to fixed point. Returns the number of sweeps
    /// performed.
    pub fn run(&mut self, graph: &mut IntentionGraph, ctx: &PassContext<'_>) -> usize {
        for iteration in 1..=self.max_iterations {
            let mut changed = false;
            for pass in &mut self.passes {
                if ctx.cancellation.is_cancelled() {
                    debug!(pass = pass.name(), "schedule cancelled");
                    return iteration;
                }
                let pass_changed = pass.run(graph, ctx);
                debug!(pass = pass.name(), changed = pass_changed, "pass ran");
                changed |= pass_changed;
            }
            if !changed {
                emit(DebugEvent::PassConverged { iterations: iteration });
                return iteration;
            }
        }
        warn!(
            cap = self.max_iterations,
            "pass schedule hit the iteration cap before converging"
        );
        self.max_iterations
    }
}
