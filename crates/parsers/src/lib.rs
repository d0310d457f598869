//! Objective-C front-end and lowering for the uplift translator.
//!
//! The crate turns source text into rule-tagged parse contexts, then lowers
//! those contexts into the intention graph and its Swift-shaped bodies. The
//! front-end never fails: regions it cannot shape surface as unknown
//! contexts and, after lowering, as unknown statements that preserve the
//! original text.

use anyhow::Context as _;
use ir::{IntentionGraph, IntentionId};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

pub mod context;
pub mod grammar;
pub mod lowering;
pub mod typemap;

pub use context::{ParseContext, Rule};
pub use lowering::{
    collect_known_names, lower_translation_unit, read_compound, read_statement, LoweringContext,
};
pub use typemap::TypeMapperContext;

/// Counters reported by the driver after a front-end sweep.
#[derive(Debug, Default, Serialize)]
pub struct FrontendMetrics {
    pub files_parsed: usize,
    pub types_lowered: usize,
    pub unknown_regions: usize,
}

/// Determines whether a path is translatable input: `.h` headers and `.m`
/// implementations.
///
/// # Example
/// ```
/// use parsers::detect_kind;
/// use std::path::Path;
/// assert_eq!(detect_kind(Path::new("Person.h")), Some(true));
/// assert_eq!(detect_kind(Path::new("Person.m")), Some(false));
/// assert_eq!(detect_kind(Path::new("notes.txt")), None);
/// ```
pub fn detect_kind(path: &Path) -> Option<bool> {
    match path.extension()?.to_str()? {
        "h" => Some(true),
        "m" | "mm" => Some(false),
        _ => None,
    }
}

/// Parses source text into a translation-unit context. Never fails.
pub fn parse_source(source: &str, file: &str) -> ParseContext {
    grammar::parse_translation_unit(source, file)
}

/// Reads and parses a file, skipping paths that are not Objective-C input.
pub fn parse_file(path: &Path) -> anyhow::Result<Option<(ParseContext, bool)>> {
    let Some(is_header) = detect_kind(path) else {
        return Ok(None);
    };
    debug!(file = %path.display(), is_header, "parsing file");
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let unit = parse_source(&content, &path.to_string_lossy());
    Ok(Some((unit, is_header)))
}

/// Parses and lowers a source string straight into the graph; the
/// convenience entry used by tests and single-file tools.
pub fn lower_source(
    graph: &mut IntentionGraph,
    source: &str,
    file: &str,
    is_header: bool,
    mapper: &TypeMapperContext,
) -> IntentionId {
    let unit = parse_source(source, file);
    let lc = LoweringContext::new(file, is_header, mapper);
    lower_translation_unit(graph, &unit, &lc)
}

/// Counts unknown contexts in a parse tree, for metrics.
pub fn count_unknown_regions(ctx: &ParseContext) -> usize {
    let own = usize::from(ctx.rule == Rule::Unknown);
    own + ctx.children.iter().map(count_unknown_regions).sum::<usize>()
}
