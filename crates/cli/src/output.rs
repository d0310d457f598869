//! Output formatting: rendered Swift text or a JSON graph dump.

use anyhow::Context;
use engine::emit_graph;
use ir::IntentionGraph;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Renders every emitted file. With an output directory the files land on
/// disk; otherwise everything streams to stdout with per-file banners.
pub fn write_text(graph: &IntentionGraph, output: Option<&Path>) -> anyhow::Result<()> {
    let files = emit_graph(graph);
    match output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create '{}'", dir.display()))?;
            for file in &files {
                let name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "out.swift".to_string());
                let target = dir.join(name);
                fs::write(&target, engine::render(&file.syntax))
                    .with_context(|| format!("failed to write '{}'", target.display()))?;
            }
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            for file in &files {
                writeln!(stdout, "// {}", file.path.display())?;
                stdout.write_all(engine::render(&file.syntax).as_bytes())?;
                writeln!(stdout)?;
            }
            Ok(())
        }
    }
}

/// Serialises the finalised intention graph.
pub fn write_json(graph: &IntentionGraph, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(graph).context("failed to serialise graph")?;
    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}
