//! CLI subcommand implementations.

pub mod check;
pub mod convert;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect the TypeScript files under the given paths, skipping declaration
/// files, previously converted outputs, and `node_modules`.
pub fn collect_ts_files(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_input_ts(path) {
                files.push(path.clone());
            }
            continue;
        }

        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            // Skip node_modules
            if path.components().any(|c| c.as_os_str() == "node_modules") {
                continue;
            }

            if path.is_file() && is_input_ts(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_input_ts(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.ends_with(".ts") && !name.ends_with(".d.ts") && !name.ends_with(".delambda.ts")
}

/// Sibling output path for a converted document.
pub fn output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("converted");
    path.with_file_name(format!("{}.delambda.ts", stem))
}
