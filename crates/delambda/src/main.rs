//! delambda - closure-to-class converter for TypeScript
//!
//! CLI driver for rewriting closure literals into named holder classes.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Closure-to-class converter for TypeScript
#[derive(Parser, Debug)]
#[command(name = "delambda")]
#[command(author, version, about = "Rewrite TypeScript closures into named holder classes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert closures in TypeScript file(s) into holder classes
    Convert(commands::convert::ConvertArgs),

    /// Report closure sites and convertibility without writing output
    Check(commands::check::CheckArgs),
}

/// Check if the first non-flag argument looks like a TypeScript file
fn is_legacy_invocation(args: &[String]) -> bool {
    for arg in args.iter().skip(1) {
        // Skip flags
        if arg.starts_with('-') {
            continue;
        }
        // Check if it looks like a .ts file (and not a subcommand)
        if arg.ends_with(".ts") {
            return true;
        }
        // If it's a known subcommand, not legacy
        if matches!(arg.as_str(), "convert" | "check" | "help") {
            return false;
        }
        // First non-flag, non-subcommand arg
        break;
    }
    false
}

/// Transform legacy args (delambda file.ts) to subcommand form
fn transform_legacy_args(args: Vec<String>) -> Vec<String> {
    let mut new_args = vec![args[0].clone(), "convert".to_string()];
    new_args.extend(args.into_iter().skip(1));
    new_args
}

fn main() -> Result<()> {
    env_logger::init();

    // Handle legacy invocation (delambda file.ts)
    let args: Vec<String> = std::env::args().collect();
    let effective_args = if is_legacy_invocation(&args) {
        transform_legacy_args(args)
    } else {
        args
    };

    let cli = Cli::parse_from(effective_args);

    // Determine if colors should be used
    let use_color = !cli.no_color && !cli.quiet && atty::is(atty::Stream::Stdout);

    match cli.command {
        Some(Commands::Convert(args)) => {
            commands::convert::run(args, cli.format, use_color, cli.verbose)
        }
        Some(Commands::Check(args)) => {
            commands::check::run(args, cli.format, use_color, cli.verbose)
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
