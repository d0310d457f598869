//! Translation driver: front-end fan-out, intention-graph assembly, the
//! pass schedule, and emission.
//!
//! Parsing runs per file on the rayon pool; lowering targets disjoint file
//! intentions but merges into the shared graph on the driver thread only.
//! Passes then run single-threaded to fixed point.

use anyhow::Result;
use ir::{IntentionGraph, IntentionKind, StatementKind, SwiftType};
use parsers::{FrontendMetrics, LoweringContext, ParseContext, TypeMapperContext};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

pub mod cfg_builder;
pub mod debug;
pub mod emit;
pub mod passes;

pub use cfg_builder::{build_cfg, build_cfg_rooted};
pub use debug::{set_debug_sink, DebugEvent, DebugSink};
pub use emit::{emit_graph, render, EmittedFile, SwiftSyntax};
pub use passes::{
    CancellationToken, IntentionPass, PassContext, PassSchedule, DEFAULT_MAX_ITERATIONS,
};

use debug::{emit, DebugEvent as Event};

/// One input to a translation run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub is_header: bool,
}

#[derive(Debug, Clone)]
pub struct TranslationOptions {
    pub max_iterations: usize,
    pub cancellation: CancellationToken,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cancellation: CancellationToken::new(),
        }
    }
}

/// The finalised product of a run: the graph plus the name tables it was
/// resolved against.
pub struct Translation {
    pub graph: IntentionGraph,
    pub mapper: TypeMapperContext,
    pub metrics: FrontendMetrics,
    pub sweeps: usize,
}

/// Runs the whole pipeline over a set of in-memory sources.
pub fn translate_sources(
    files: Vec<SourceFile>,
    options: &TranslationOptions,
) -> Result<Translation> {
    // Front-end fan-out; parse trees are independent per file.
    let units: Vec<(SourceFile, ParseContext)> = files
        .into_par_iter()
        .map(|file| {
            emit(Event::ParseStart {
                path: file.path.clone(),
            });
            let unit = parsers::parse_source(&file.source, &file.path.to_string_lossy());
            emit(Event::ParseEnd {
                path: file.path.clone(),
            });
            (file, unit)
        })
        .collect();

    // Name collection must see every file before any lowering resolves a
    // cross-file reference.
    let mut mapper = TypeMapperContext::new();
    for (_, unit) in &units {
        parsers::collect_known_names(unit, &mut mapper);
    }

    // Merge into the shared graph on the driver thread.
    let mut graph = IntentionGraph::new();
    let mut metrics = FrontendMetrics::default();
    for (file, unit) in &units {
        let lc = LoweringContext::new(file.path.to_string_lossy(), file.is_header, &mapper);
        parsers::lower_translation_unit(&mut graph, unit, &lc);
        metrics.files_parsed += 1;
        metrics.unknown_regions += parsers::count_unknown_regions(unit);
        debug!(file = %file.path.display(), "lowered");
    }
    metrics.types_lowered = graph.type_ids().len();

    report_imports(&graph);
    report_unknown_statements(&graph);
    report_unknown_types(&graph, &mapper);
    report_protocol_cycles(&graph);

    let mut schedule = PassSchedule::standard(options.max_iterations);
    let ctx = PassContext {
        mapper: &mapper,
        cancellation: &options.cancellation,
    };
    let sweeps = schedule.run(&mut graph, &ctx);
    info!(sweeps, "pass schedule finished");

    Ok(Translation {
        graph,
        mapper,
        metrics,
        sweeps,
    })
}

fn report_imports(graph: &IntentionGraph) {
    for &file_id in graph.files() {
        let Some(file) = graph.file(file_id) else {
            continue;
        };
        for import in &file.imports {
            emit(Event::ImportReference {
                from: PathBuf::from(&file.path),
                target: import.clone(),
            });
        }
    }
}

fn report_unknown_statements(graph: &IntentionGraph) {
    for intention in graph.intentions() {
        let body = match &intention.kind {
            IntentionKind::Method(m) => m.body.as_ref(),
            _ => None,
        };
        let Some(body) = body else { continue };
        for stmt in &body.statements.statements {
            report_unknowns_in(stmt);
        }
    }
}

fn report_unknowns_in(stmt: &ir::Statement) {
    if let StatementKind::Unknown(unknown) = &stmt.kind {
        emit(Event::StatementNotRecognized {
            range: unknown.range.clone(),
            source_text: unknown.source_text.clone(),
        });
    }
    // Nested statements carry their own unknowns.
    match &stmt.kind {
        StatementKind::If(s) => {
            s.body.statements.iter().for_each(report_unknowns_in);
            if let Some(e) = &s.else_body {
                e.statements.iter().for_each(report_unknowns_in);
            }
        }
        StatementKind::Switch(s) => {
            for case in &s.cases {
                case.body.statements.iter().for_each(report_unknowns_in);
            }
            s.default.statements.iter().for_each(report_unknowns_in);
        }
        StatementKind::While(s) => s.body.statements.iter().for_each(report_unknowns_in),
        StatementKind::RepeatWhile(s) => s.body.statements.iter().for_each(report_unknowns_in),
        StatementKind::ForIn(s) => s.body.statements.iter().for_each(report_unknowns_in),
        StatementKind::Do(s) => {
            s.body.statements.iter().for_each(report_unknowns_in);
            for catch in &s.catch_blocks {
                catch.body.statements.iter().for_each(report_unknowns_in);
            }
        }
        StatementKind::Defer(b) | StatementKind::Compound(b) => {
            b.statements.iter().for_each(report_unknowns_in)
        }
        StatementKind::LocalFunction(f) => {
            f.body.statements.iter().for_each(report_unknowns_in)
        }
        _ => {}
    }
}

fn report_unknown_types(graph: &IntentionGraph, mapper: &TypeMapperContext) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for intention in graph.intentions() {
        let file = intention
            .origin
            .as_ref()
            .map(|o| o.range.file.clone())
            .unwrap_or_default();
        let mut check = |ty: &SwiftType| {
            for name in nominal_names(ty) {
                if !mapper.is_known_name(&name)
                    && graph.type_named(&name).is_none()
                    && !is_swift_builtin(&name)
                    && seen.insert((name.clone(), file.clone()))
                {
                    emit(Event::UnknownType {
                        name,
                        file: file.clone(),
                    });
                }
            }
        };
        match &intention.kind {
            IntentionKind::Property(p) => check(&p.storage.ty),
            IntentionKind::GlobalVariable(g) => check(&g.storage.ty),
            IntentionKind::Method(m) => {
                check(&m.signature.return_type);
                for param in &m.signature.parameters {
                    check(&param.ty);
                }
            }
            _ => {}
        }
    }
}

fn nominal_names(ty: &SwiftType) -> Vec<String> {
    match ty {
        SwiftType::Nominal(name) => vec![name.clone()],
        SwiftType::Generic(name, args) => {
            let mut names = vec![name.clone()];
            names.extend(args.iter().flat_map(nominal_names));
            names
        }
        SwiftType::Optional(inner) | SwiftType::Unspecified(inner) | SwiftType::Array(inner) => {
            nominal_names(inner)
        }
        SwiftType::Dictionary(key, value) => {
            let mut names = nominal_names(key);
            names.extend(nominal_names(value));
            names
        }
        SwiftType::Function {
            parameters,
            returns,
        } => {
            let mut names: Vec<String> = parameters.iter().flat_map(nominal_names).collect();
            names.extend(nominal_names(returns));
            names
        }
        SwiftType::Void => Vec::new(),
    }
}

/// Names the mapper itself introduces; not worth an unknown-type event.
fn is_swift_builtin(name: &str) -> bool {
    matches!(
        name,
        "Int" | "UInt" | "Bool" | "Float" | "Double" | "String" | "CGFloat" | "CChar" | "UInt8"
            | "Data" | "Date" | "URL" | "AnyObject" | "AnyClass" | "Self" | "Selector" | "Set"
            | "TimeInterval" | "UnsafeMutablePointer" | "Range" | "ClosedRange" | "NSObject"
    )
}

/// Protocol conformance chains that loop back onto themselves.
fn report_protocol_cycles(graph: &IntentionGraph) {
    for type_id in graph.type_ids() {
        let Some(ty) = graph.type_intention(type_id) else {
            continue;
        };
        if ty.kind != ir::TypeKind::Protocol {
            continue;
        }
        let mut visited = HashSet::new();
        let mut stack: Vec<String> = ty
            .conformances
            .iter()
            .filter_map(|&c| graph.conformance(c).map(|c| c.protocol_name.clone()))
            .collect();
        while let Some(name) = stack.pop() {
            if name == ty.name {
                emit(Event::ProtocolCycle {
                    type_name: ty.name.clone(),
                    protocol_name: name,
                });
                break;
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(next_id) = graph.type_named(&name) {
                if let Some(next) = graph.type_intention(next_id) {
                    stack.extend(
                        next.conformances
                            .iter()
                            .filter_map(|&c| graph.conformance(c).map(|c| c.protocol_name.clone())),
                    );
                }
            }
        }
    }
}
