//! Common utilities for the uplift command line interface.

use std::fs;
use std::path::{Path, PathBuf};

pub mod args;
pub mod output;
pub mod translate;

/// Collects translatable inputs under a path: a single file, or every
/// `.h`/`.m` file in a directory tree. The list is sorted so runs are
/// deterministic regardless of directory iteration order.
///
/// # Example
/// ```
/// use uplift::collect_inputs;
/// let dir = std::env::temp_dir().join("uplift-doc-inputs");
/// std::fs::create_dir_all(&dir).unwrap();
/// std::fs::write(dir.join("A.m"), "// a").unwrap();
/// std::fs::write(dir.join("notes.txt"), "skip").unwrap();
/// let inputs = collect_inputs(&dir).unwrap();
/// assert_eq!(inputs.len(), 1);
/// ```
pub fn collect_inputs(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    if root.is_file() {
        if parsers::detect_kind(root).is_some() {
            inputs.push(root.to_path_buf());
        }
        return Ok(inputs);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if parsers::detect_kind(&path).is_some() {
                inputs.push(path);
            }
        }
    }
    inputs.sort();
    Ok(inputs)
}
