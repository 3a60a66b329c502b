//! Check command - reports closure sites and convertibility without
//! writing any output.

use anyhow::{anyhow, Result};
use clap::Args;
use console::style;
use delambda_diagnostics::{DiagnosticEmitter, JsonEmitter, SourceCache, TerminalEmitter};
use delambda_frontend::parse_document;
use delambda_transform::{self as transform, LiftError};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

use super::{collect_ts_files, output_path};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input TypeScript file or directory
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Show a unified diff of the would-be conversion
    #[arg(long)]
    pub diff: bool,
}

struct FileCheck {
    path: PathBuf,
    sites: usize,
    convertible: usize,
    skipped: usize,
    error: Option<LiftError>,
}

pub fn run(args: CheckArgs, format: OutputFormat, use_color: bool, _verbose: u8) -> Result<()> {
    let files = collect_ts_files(std::slice::from_ref(&args.input))?;

    if files.is_empty() {
        match format {
            OutputFormat::Text => println!("No TypeScript files found."),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "success": true, "files": 0, "errors": 0 })
            ),
        }
        return Ok(());
    }

    let mut cache = SourceCache::new();
    let mut checks = Vec::new();

    for file in &files {
        checks.push(check_file(file, &mut cache, args.diff, use_color));
    }

    let errors = checks.iter().filter(|c| c.error.is_some()).count();

    match format {
        OutputFormat::Text => {
            for check in &checks {
                match &check.error {
                    None => {
                        let line = format!(
                            "{}: {} closure site(s), {} convertible, {} skipped",
                            check.path.display(),
                            check.sites,
                            check.convertible,
                            check.skipped
                        );
                        if use_color {
                            println!("{} {}", style("ok").green().bold(), line);
                        } else {
                            println!("ok {}", line);
                        }
                    }
                    Some(err) => {
                        let stderr = std::io::stderr();
                        let mut emitter = TerminalEmitter::new(stderr.lock(), use_color);
                        emitter.emit(&err.to_diagnostic(), &cache)?;
                    }
                }
            }
            if errors == 0 {
                println!("{} file(s) checked, all convertible", checks.len());
            } else {
                println!("{} file(s) checked, {} with errors", checks.len(), errors);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "success": errors == 0,
                "files": checks.len(),
                "errors": errors,
                "results": checks.iter().map(|c| serde_json::json!({
                    "file": c.path.display().to_string(),
                    "sites": c.sites,
                    "convertible": c.convertible,
                    "skipped": c.skipped,
                    "error": c.error.as_ref().map(|e| serde_json::json!({
                        "code": e.code().as_str(),
                        "message": e.to_string(),
                    })),
                })).collect::<Vec<_>>(),
            });
            println!("{}", json);
            if errors > 0 {
                let stderr = std::io::stderr();
                let mut emitter = JsonEmitter::new(stderr.lock());
                for check in &checks {
                    if let Some(err) = &check.error {
                        emitter.emit(&err.to_diagnostic(), &cache)?;
                    }
                }
            }
        }
    }

    if errors > 0 {
        Err(anyhow!("{} file(s) cannot be converted", errors))
    } else {
        Ok(())
    }
}

fn check_file(path: &Path, cache: &mut SourceCache, show_diff: bool, use_color: bool) -> FileCheck {
    let mut check = FileCheck {
        path: path.to_path_buf(),
        sites: 0,
        convertible: 0,
        skipped: 0,
        error: None,
    };

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            check.error = Some(LiftError::Io(err));
            return check;
        }
    };

    let doc = match parse_document(&source, &path.to_string_lossy(), cache) {
        Ok(doc) => doc,
        Err(err) => {
            check.error = Some(err);
            return check;
        }
    };

    match transform::plan(&doc) {
        Ok(plan) => {
            check.convertible = plan.sites.len();
            check.skipped = plan.skipped.len();
            check.sites = check.convertible + check.skipped;
        }
        Err(err) => {
            check.error = Some(err);
            return check;
        }
    }

    if show_diff {
        if let Ok(outcome) = transform::run(&doc) {
            print_diff(path, &source, &outcome.text, use_color);
        }
    }

    check
}

fn print_diff(path: &Path, before: &str, after: &str, use_color: bool) {
    let diff = TextDiff::from_lines(before, after);
    let header = format!(
        "--- {}\n+++ {}",
        path.display(),
        output_path(path).display()
    );
    println!("{}", header);

    for change in diff.iter_all_changes() {
        let (sign, styled) = match change.tag() {
            similar::ChangeTag::Delete => ("-", style(change.to_string()).red()),
            similar::ChangeTag::Insert => ("+", style(change.to_string()).green()),
            similar::ChangeTag::Equal => (" ", style(change.to_string()).dim()),
        };
        if use_color {
            print!("{}{}", sign, styled);
        } else {
            print!("{}{}", sign, change);
        }
    }
}
