//! The `translate` subcommand: discovery, pipeline run, output.

use crate::args::{Format, TranslateArgs};
use crate::collect_inputs;
use crate::output::{write_json, write_text};
use anyhow::{bail, Context};
use engine::{translate_sources, DebugEvent, DebugSink, SourceFile, TranslationOptions};
use std::fs;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;

/// Forwards structured engine events into the log stream.
struct TracingSink;

impl DebugSink for TracingSink {
    fn event(&self, event: DebugEvent) {
        debug!(?event, "engine event");
    }
}

pub fn run_translate(args: TranslateArgs) -> anyhow::Result<()> {
    let level = if args.quiet {
        LevelFilter::OFF
    } else if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    if args.debug {
        engine::set_debug_sink(Some(Box::new(TracingSink)));
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        error!("failed to build thread pool: {e}");
    }

    if !args.path.exists() {
        bail!("input path '{}' not found", args.path.display());
    }
    let inputs = collect_inputs(&args.path)?;
    if inputs.is_empty() {
        bail!(
            "no Objective-C sources (.h/.m) under '{}'",
            args.path.display()
        );
    }
    info!(files = inputs.len(), target = %args.path.display(), "translation started");

    let mut sources = Vec::with_capacity(inputs.len());
    for path in inputs {
        let is_header = parsers::detect_kind(&path).unwrap_or(false);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        sources.push(SourceFile {
            path,
            source,
            is_header,
        });
    }

    let options = TranslationOptions {
        max_iterations: args.max_iterations,
        ..Default::default()
    };
    let translation = translate_sources(sources, &options)?;
    info!(
        files = translation.metrics.files_parsed,
        types = translation.metrics.types_lowered,
        unknown_regions = translation.metrics.unknown_regions,
        sweeps = translation.sweeps,
        "translation finished"
    );

    match args.format {
        Format::Text => write_text(&translation.graph, args.output.as_deref()),
        Format::Json => write_json(&translation.graph, args.output.as_deref()),
    }
}
