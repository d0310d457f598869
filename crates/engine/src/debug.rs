//! Structured diagnostic events.
//!
//! The engine emits events through a process-wide sink registration; it
//! never formats or prints them itself. Sinks are pure observers: they
//! receive no handle to the graph and must not mutate it.

use ir::SourceRange;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub enum DebugEvent {
    ParseStart {
        path: PathBuf,
    },
    ParseEnd {
        path: PathBuf,
    },
    /// A statement context had no translation rule and degraded to unknown.
    StatementNotRecognized {
        range: SourceRange,
        source_text: String,
    },
    /// A nominal type name the mapper could not place.
    UnknownType {
        name: String,
        file: String,
    },
    /// An input file references another via `#import`/`#include`.
    ImportReference {
        from: PathBuf,
        target: String,
    },
    /// Protocol inheritance loops back onto itself.
    ProtocolCycle {
        type_name: String,
        protocol_name: String,
    },
    /// The pass schedule reached a sweep with no changes.
    PassConverged {
        iterations: usize,
    },
}

pub trait DebugSink: Send + Sync {
    fn event(&self, event: DebugEvent);
}

static DEBUG_SINK: RwLock<Option<Box<dyn DebugSink>>> = RwLock::new(None);

pub fn set_debug_sink(sink: Option<Box<dyn DebugSink>>) {
    *DEBUG_SINK.write().expect("debug sink lock poisoned") = sink;
}

pub(crate) fn emit(event: DebugEvent) {
    if let Some(s) = DEBUG_SINK
        .read()
        .expect("debug sink lock poisoned")
        .as_ref()
    {
        s.event(event);
    }
}
