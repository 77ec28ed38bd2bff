//! Acorn code generation: LLVM IR emission, symbol mangling, and linking.
//!
//! The emitter consumes the decorated AST and typeck context produced by
//! the earlier passes and lowers them to a single LLVM module per
//! compilation. See [`codegen::Emitter`] for the emission model and
//! [`mangle`] for the symbol ABI.

pub mod codegen;
pub mod link;
pub mod mangle;

use std::path::Path;

use inkwell::context::Context;

use acorn_common::diagnostics::Reporter;
use acorn_parser::ast::SourceFile;
use acorn_typeck::TypeckContext;

pub use codegen::Emitter;

/// Lower a checked file to LLVM IR text. Used by tests and `--emit-llvm`.
pub fn compile_to_llvm_ir(
    file: &SourceFile,
    ctx: &mut TypeckContext,
    reporter: &mut Reporter,
    target: Option<&str>,
) -> Result<String, String> {
    let context = Context::create();
    let mut emitter = Emitter::new(&context, &file.name, 0, target, ctx, reporter)?;
    emitter.compile(file)?;
    Ok(emitter.llvm_ir())
}

/// Compile a checked file into a native executable.
pub fn compile_to_binary(
    file: &SourceFile,
    ctx: &mut TypeckContext,
    reporter: &mut Reporter,
    output: &Path,
    opt_level: u8,
    target: Option<&str>,
    emit_llvm: bool,
) -> Result<(), String> {
    let context = Context::create();
    let mut emitter = Emitter::new(&context, &file.name, opt_level, target, ctx, reporter)?;
    emitter.compile(file)?;

    if emitter.had_errors() {
        // Diagnostics already explain the failure; the driver gates on them.
        return Ok(());
    }

    if opt_level > 0 {
        emitter.run_optimization_passes(opt_level)?;
    }

    if emit_llvm {
        emitter.emit_llvm_ir(&output.with_extension("ll"))?;
    }

    let object_path = output.with_extension("o");
    emitter.emit_object(&object_path)?;
    link::link(&object_path, output)
}
