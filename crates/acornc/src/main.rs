//! The Acorn compiler CLI.
//!
//! Provides the `acornc` command with two subcommands:
//!
//! - `acornc build <file>` - compile a `.acorn` source file to a native binary
//! - `acornc check <file>` - run the front-end passes without emitting code
//!
//! The pipeline runs lex, parse, symbol-build, infer, check, reify, emit;
//! after every pass the driver checks the reporter and refuses to start
//! the next pass if anything was recorded.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use acorn_common::diagnostics::Reporter;
use acorn_parser::ParseOutcome;
use acorn_typeck::TypeckContext;

#[derive(Parser)]
#[command(name = "acornc", version, about = "The Acorn compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an Acorn source file to a native binary
    Build {
        /// Path to the source file (.acorn)
        file: PathBuf,

        /// Optimization level (0 = debug, 2 = release)
        #[arg(long = "opt-level", default_value = "0")]
        opt_level: u8,

        /// Emit LLVM IR (.ll file) alongside the binary
        #[arg(long = "emit-llvm")]
        emit_llvm: bool,

        /// Output path for the compiled binary
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target triple for cross-compilation
        #[arg(long)]
        target: Option<String>,

        /// Print diagnostics as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parse and type-check without generating code
    Check {
        /// Path to the source file (.acorn)
        file: PathBuf,

        /// Print the decorated AST as an indented tree
        #[arg(long = "print-ast")]
        print_ast: bool,

        /// Print diagnostics as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Build {
            file,
            opt_level,
            emit_llvm,
            output,
            target,
            json,
        } => build(
            &file,
            opt_level,
            emit_llvm,
            output.as_deref(),
            target.as_deref(),
            json,
        ),
        Commands::Check {
            file,
            print_ast,
            json,
        } => check_only(&file, print_ast, json),
    };

    if !ok {
        process::exit(1);
    }
}

/// Run the front-end passes. Returns the results only when every pass
/// finished without diagnostics.
fn front_end(file: &Path, json: bool) -> Option<(ParseOutcome, TypeckContext)> {
    let mut reporter = Reporter::new();

    let outcome = acorn_parser::parse_file(file, &mut reporter);
    let Some(mut outcome) = outcome else {
        report_diagnostics(&reporter, None, json);
        return None;
    };
    if gate(&reporter, &outcome, json) {
        return None;
    }

    let mut ctx = TypeckContext::new();

    acorn_typeck::builder::build(&outcome.file, &mut ctx, &mut reporter);
    if gate(&reporter, &outcome, json) {
        return None;
    }

    acorn_typeck::infer::infer(&outcome.file, &mut ctx, &mut reporter);
    if gate(&reporter, &outcome, json) {
        return None;
    }

    acorn_typeck::check::check(&outcome.file, &ctx, &mut reporter);
    if gate(&reporter, &outcome, json) {
        return None;
    }

    acorn_typeck::reify::reify(&mut outcome.file, &mut outcome.ids, &mut ctx, &mut reporter);
    if gate(&reporter, &outcome, json) {
        return None;
    }

    Some((outcome, ctx))
}

fn build(
    file: &Path,
    opt_level: u8,
    emit_llvm: bool,
    output: Option<&Path>,
    target: Option<&str>,
    json: bool,
) -> bool {
    let Some((outcome, mut ctx)) = front_end(file, json) else {
        return false;
    };

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => file.with_extension(""),
    };

    let mut reporter = Reporter::new();
    let result = acorn_codegen::compile_to_binary(
        &outcome.file,
        &mut ctx,
        &mut reporter,
        &output_path,
        opt_level,
        target,
        emit_llvm,
    );

    if let Err(message) = result {
        eprintln!("error: {message}");
        return false;
    }
    if gate(&reporter, &outcome, json) {
        return false;
    }

    eprintln!("  Compiled: {}", output_path.display());
    true
}

fn check_only(file: &Path, print_ast: bool, json: bool) -> bool {
    match front_end(file, json) {
        Some((outcome, _)) => {
            if print_ast {
                print!("{}", acorn_parser::prettyprint::print_source_file(&outcome.file));
            }
            true
        }
        None => false,
    }
}

/// Report any collected diagnostics. Returns true when compilation must
/// stop before the next pass.
fn gate(reporter: &Reporter, outcome: &ParseOutcome, json: bool) -> bool {
    if !reporter.has_errors() {
        return false;
    }
    report_diagnostics(reporter, Some(outcome), json);
    true
}

fn report_diagnostics(reporter: &Reporter, outcome: Option<&ParseOutcome>, json: bool) {
    for diagnostic in reporter.diagnostics() {
        if json {
            match serde_json::to_string(diagnostic) {
                Ok(line) => eprintln!("{line}"),
                Err(_) => eprintln!("{diagnostic}"),
            }
            continue;
        }

        let source = outcome.and_then(|o| o.sources.get(&diagnostic.location.filename));
        match source {
            Some(source) => eprint!("{}", diagnostic.render(source)),
            None => eprintln!("{diagnostic}"),
        }
    }
}
