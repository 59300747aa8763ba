/// Mixin compiler CLI

use anyhow::Context;
use clap::Parser;
use mixin_compiler::{CompileOptions, Compiler};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mixinc")]
#[command(about = "Mixin compiler - generates forwarding categories from PROVIDE annotations")]
#[command(version)]
struct Args {
    /// Input header or implementation file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Additional directory searched for quoted imports
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Macro that marks provide annotations
    #[arg(long = "macro", value_name = "NAME", default_value = "PROVIDE")]
    annotation_macro: String,

    /// Skip members that fail instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut options = CompileOptions::new(&args.input)
        .include_dirs(args.include)
        .annotation_macro(args.annotation_macro)
        .keep_going(args.keep_going);

    if let Some(output) = &args.output {
        options = options.output_dir(output);
    }

    let output = Compiler::new(options)
        .compile()
        .with_context(|| format!("failed to compile {}", args.input.display()))?;

    for diagnostic in &output.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    match &args.output {
        Some(dir) => {
            println!(
                "Generated {} categories into {}",
                output.extensions.len(),
                dir.display()
            );
        }
        None => {
            print!("{}", output.declarations);
            if !output.definitions.is_empty() {
                println!();
                print!("{}", output.definitions);
            }
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    // MIXINC_LOG overrides the level picked by --verbose
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MIXINC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Compilation failed: {:#}", e);
        process::exit(1);
    }
}
