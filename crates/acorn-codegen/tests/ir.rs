//! IR-level tests: run the whole front end, emit LLVM IR as text, and
//! assert on the symbols and structure it contains.

use acorn_common::diagnostics::Reporter;
use acorn_parser::parse_source;
use acorn_typeck::{builder, check, infer, reify, TypeckContext};

fn lower(source: &str) -> String {
    let mut reporter = Reporter::new();
    let mut outcome =
        parse_source("test.acorn", source, &mut reporter).expect("source should parse");

    let mut ctx = TypeckContext::new();
    builder::build(&outcome.file, &mut ctx, &mut reporter);
    infer::infer(&outcome.file, &mut ctx, &mut reporter);
    check::check(&outcome.file, &ctx, &mut reporter);
    reify::reify(&mut outcome.file, &mut outcome.ids, &mut ctx, &mut reporter);
    assert!(
        !reporter.has_errors(),
        "front end reported: {:?}",
        reporter.diagnostics()
    );

    let ir = acorn_codegen::compile_to_llvm_ir(&outcome.file, &mut ctx, &mut reporter, None)
        .expect("emission should succeed");
    assert!(
        !reporter.has_errors(),
        "emitter reported: {:?}",
        reporter.diagnostics()
    );
    ir
}

#[test]
fn empty_module_has_the_skeleton() {
    let ir = lower("");
    assert!(ir.contains("define void @_init_variables_"));
    assert!(ir.contains("define void @_user_code_"));
    assert!(ir.contains("define i32 @main"));
    // main returns constant zero.
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn definitions_emit_mangled_symbols() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
";
    let ir = lower(source);
    assert!(
        ir.contains("_A_add_mi64i64i64"),
        "missing mangled add symbol in:\n{ir}"
    );
}

#[test]
fn generic_specialisations_emit_one_function_each() {
    let source = "\
def id{T}(x as T) as T
    x
end
let a = id(7)
let b = id(1.5)
";
    let ir = lower(source);
    assert!(ir.contains("_A_id_mi64i64"), "missing integer specialisation:\n{ir}");
    assert!(ir.contains("_A_id_mf64f64"), "missing float specialisation:\n{ir}");
}

#[test]
fn builtin_operators_are_present() {
    let ir = lower("");
    // Integer and float overloads of + have distinct symbols.
    assert!(ir.contains("_A_+_mi64i64i64") || ir.contains("\"_A_+_mi64i64i64\""));
    assert!(ir.contains("_A_+_mf64f64f64") || ir.contains("\"_A_+_mf64f64f64\""));
}

#[test]
fn record_constructor_is_emitted() {
    let source = "\
type Point
    x as Integer64
    y as Integer64
end
let p = Point.new(1, 2)
";
    let ir = lower(source);
    assert!(ir.contains("_A_Point_mri64i64i64i64"), "missing constructor in:\n{ir}");
}

#[test]
fn module_level_variables_become_globals() {
    let ir = lower("let x = 42\n");
    assert!(ir.contains("@_A_x") || ir.contains("@\"_A_x\""), "missing global in:\n{ir}");
}

#[test]
fn debug_print_routes_through_printf() {
    let ir = lower("_debug_print_(7)\n");
    assert!(ir.contains("declare i32 @printf"));
    assert!(ir.contains("%lld"));
}
