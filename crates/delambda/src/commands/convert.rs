//! Convert command - rewrites closures and writes converted siblings.

use anyhow::{anyhow, Result};
use clap::Args;
use console::style;
use delambda_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, JsonEmitter, SourceCache, TerminalEmitter,
};
use delambda_frontend::parse_document;
use delambda_transform::{self as transform, LiftError, SemanticDocument};
use std::fs;
use std::path::{Path, PathBuf};

use super::{collect_ts_files, output_path};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input TypeScript file(s) or directories
    #[arg(default_value = "input.ts")]
    pub inputs: Vec<PathBuf>,

    /// Continue with the remaining files after a failed conversion
    #[arg(long)]
    pub keep_going: bool,

    /// Print converted text to stdout instead of writing sibling files
    #[arg(long)]
    pub stdout: bool,
}

struct FileReport {
    input: PathBuf,
    output: Option<PathBuf>,
    converted: usize,
    skipped: usize,
}

pub fn run(args: ConvertArgs, format: OutputFormat, use_color: bool, verbose: u8) -> Result<()> {
    let files = collect_ts_files(&args.inputs)?;

    if files.is_empty() {
        match format {
            OutputFormat::Text => println!("No TypeScript files found."),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "success": true, "files": 0, "failed": 0 })
            ),
        }
        return Ok(());
    }

    let mut cache = SourceCache::new();
    let mut reports = Vec::new();
    let mut failed = 0usize;

    for file in &files {
        match convert_file(file, &mut cache, args.stdout, verbose) {
            Ok(report) => {
                if let OutputFormat::Text = format {
                    let target = report
                        .output
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<stdout>".to_string());
                    let line = format!(
                        "{} -> {} ({} converted, {} skipped)",
                        report.input.display(),
                        target,
                        report.converted,
                        report.skipped
                    );
                    if use_color {
                        println!("{} {}", style("ok").green().bold(), line);
                    } else {
                        println!("ok {}", line);
                    }
                }
                reports.push(report);
            }
            Err(err) => {
                failed += 1;
                emit_error(&err, &cache, format, use_color)?;
                // Outputs already written for earlier files stay in place.
                if !args.keep_going {
                    break;
                }
            }
        }
    }

    if let OutputFormat::Json = format {
        let json = serde_json::json!({
            "success": failed == 0,
            "files": files.len(),
            "failed": failed,
            "results": reports.iter().map(|r| serde_json::json!({
                "input": r.input.display().to_string(),
                "output": r.output.as_ref().map(|p| p.display().to_string()),
                "converted": r.converted,
                "skipped": r.skipped,
            })).collect::<Vec<_>>(),
        });
        println!("{}", json);
    }

    if failed > 0 {
        Err(anyhow!("{} file(s) failed to convert", failed))
    } else {
        Ok(())
    }
}

fn convert_file(
    path: &Path,
    cache: &mut SourceCache,
    to_stdout: bool,
    verbose: u8,
) -> Result<FileReport, LiftError> {
    log::info!("converting {}", path.display());

    let source = fs::read_to_string(path)?;
    let doc = parse_document(&source, &path.to_string_lossy(), cache)?;

    if verbose > 0 && !doc.diagnostics.is_empty() {
        let stderr = std::io::stderr();
        let mut emitter = TerminalEmitter::new(stderr.lock(), false);
        let _ = emitter.emit_all(&doc.diagnostics, cache);
    }

    let outcome = transform::run(&doc)?;

    if verbose > 0 && !outcome.skipped.is_empty() {
        let stderr = std::io::stderr();
        let mut emitter = TerminalEmitter::new(stderr.lock(), false);
        for node in &outcome.skipped {
            let diag = Diagnostic::warning(
                DiagnosticCode::SiteSkipped,
                "closure left unconverted: no enclosing statement to place the instantiation",
            )
            .with_span(doc.span_of(*node))
            .build();
            let _ = emitter.emit(&diag, cache);
        }
    }

    let output = if to_stdout {
        print!("{}", outcome.text);
        None
    } else {
        let out_path = output_path(path);
        fs::write(&out_path, &outcome.text)?;
        Some(out_path)
    };

    Ok(FileReport {
        input: path.to_path_buf(),
        output,
        converted: outcome.converted,
        skipped: outcome.skipped.len(),
    })
}

fn emit_error(
    err: &LiftError,
    cache: &SourceCache,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let diagnostic = err.to_diagnostic();
    let stderr = std::io::stderr();
    match format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(stderr.lock(), use_color);
            emitter.emit(&diagnostic, cache)?;
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(stderr.lock());
            emitter.emit(&diagnostic, cache)?;
        }
    }
    Ok(())
}
