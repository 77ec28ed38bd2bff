//! End-to-end semantic pipeline tests: parse, build symbols, infer, check,
//! reify, and assert on the resulting decorations and diagnostics.

use acorn_common::diagnostics::{DiagnosticKind, Reporter};
use acorn_parser::ast::{Expr, ExprKind};
use acorn_parser::{parse_source, ParseOutcome};
use acorn_typeck::ty::Ty;
use acorn_typeck::{builder, check, infer, reify, TypeckContext};

struct Checked {
    ctx: TypeckContext,
    reporter: Reporter,
    outcome: ParseOutcome,
}

fn run(source: &str) -> Checked {
    let mut reporter = Reporter::new();
    let mut outcome =
        parse_source("test.acorn", source, &mut reporter).expect("source should parse");
    assert!(
        !reporter.has_errors(),
        "unexpected parse errors: {:?}",
        reporter.diagnostics()
    );

    let mut ctx = TypeckContext::new();
    builder::build(&outcome.file, &mut ctx, &mut reporter);
    infer::infer(&outcome.file, &mut ctx, &mut reporter);
    if !reporter.has_errors() {
        check::check(&outcome.file, &ctx, &mut reporter);
        reify::reify(&mut outcome.file, &mut outcome.ids, &mut ctx, &mut reporter);
    }

    Checked {
        ctx,
        reporter,
        outcome,
    }
}

fn assert_clean(checked: &Checked) {
    assert!(
        !checked.reporter.has_errors(),
        "unexpected diagnostics: {:?}",
        checked.reporter.diagnostics()
    );
}

fn kinds(checked: &Checked) -> Vec<DiagnosticKind> {
    checked
        .reporter
        .diagnostics()
        .iter()
        .map(|d| d.kind)
        .collect()
}

fn statements(checked: &Checked) -> &[Expr] {
    match &checked.outcome.file.code.kind {
        ExprKind::Block(statements) => statements,
        other => panic!("top level should be a block, got {other:?}"),
    }
}

// ── Literals and declarations ──────────────────────────────────────────

#[test]
fn integer_literal_types_as_integer64() {
    let checked = run("let x = 42\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Integer(64)));
}

#[test]
fn float_literal_types_as_float64() {
    let checked = run("let x = 1.5\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Float(64)));
}

#[test]
fn string_literal_types_as_pointer_to_integer8() {
    let checked = run("let s = \"hi\"\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(
        checked.ctx.type_of(declaration.id),
        Some(&Ty::UnsafePointer(Box::new(Ty::Integer(8))))
    );
}

#[test]
fn annotation_mismatch_is_reported() {
    let checked = run("let x as Boolean = 42\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

#[test]
fn annotation_decides_the_declared_type() {
    let checked = run("let x as Integer64 = 42\n");
    assert_clean(&checked);
}

#[test]
fn undefined_name_is_reported() {
    let checked = run("let x = missing\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::Undefined));
}

#[test]
fn duplicate_declaration_in_same_scope_is_redefined() {
    let checked = run("let x = 1\nlet x = 2\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::Redefined));
}

#[test]
fn inner_scope_may_shadow_outer() {
    let source = "let x = 1\ndef f() as Integer64\n    let x = 2\n    x\nend\n";
    let checked = run(source);
    assert_clean(&checked);
}

// ── Mutability ─────────────────────────────────────────────────────────

#[test]
fn assignment_to_immutable_binding_is_constant_assignment() {
    let checked = run("let x = 1\nx = 2\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::ConstantAssignment));
}

#[test]
fn assignment_to_mutable_binding_is_allowed() {
    let checked = run("let mutable x = 1\nx = 2\n");
    assert_clean(&checked);
}

#[test]
fn assignment_type_must_match() {
    let checked = run("let mutable x = 1\nx = 1.5\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

// ── Operators and overloads ────────────────────────────────────────────

#[test]
fn builtin_addition_types_integers() {
    let checked = run("let x = 1 + 2\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Integer(64)));
}

#[test]
fn builtin_addition_types_floats() {
    let checked = run("let x = 1.5 + 2.5\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Float(64)));
}

#[test]
fn comparison_types_boolean() {
    let checked = run("let b = 1 < 2\n");
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[0].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Boolean));
}

#[test]
fn mixed_operand_addition_has_no_method() {
    let checked = run("let x = 1 + 2.5\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

#[test]
fn user_overloads_resolve_by_argument_types() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
def add(a as Float64, b as Float64) as Float64
    a + b
end
let x = add(2, 3)
let y = add(1.5, 2.5)
";
    let checked = run(source);
    assert_clean(&checked);

    let ExprKind::Let { declaration, .. } = &statements(&checked)[2].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Integer(64)));

    // The integer call resolved to method 0, the float call to method 1.
    let ExprKind::Let { value, .. } = &statements(&checked)[2].kind else {
        panic!("expected let");
    };
    let call = value.as_ref().unwrap();
    let resolution = checked.ctx.calls.get(&call.id).expect("call resolved");
    assert_eq!(resolution.method_index, 0);

    let ExprKind::Let { value, .. } = &statements(&checked)[3].kind else {
        panic!("expected let");
    };
    let call = value.as_ref().unwrap();
    let resolution = checked.ctx.calls.get(&call.id).expect("call resolved");
    assert_eq!(resolution.method_index, 1);
}

#[test]
fn keyword_arguments_reorder_to_parameters() {
    let source = "\
def sub(a as Integer64, b as Integer64) as Integer64
    a - b
end
let x = sub(b: 1, a: 10)
";
    let checked = run(source);
    assert_clean(&checked);
}

#[test]
fn calling_a_non_function_is_a_type_mismatch() {
    let checked = run("let x = 1\nlet y = x(2)\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

#[test]
fn return_type_mismatch_is_reported() {
    let source = "def f() as Integer64\n    return 1.5\nend\n";
    let checked = run(source);
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

// ── Type names ─────────────────────────────────────────────────────────

#[test]
fn pointer_type_name_applies_parameters() {
    let checked = run("def f(p as UnsafePointer{Integer64}) as Integer64\n    1\nend\n");
    assert_clean(&checked);
}

#[test]
fn wrong_constructor_arity_is_invalid_type_parameters() {
    let checked = run("def f(p as UnsafePointer) as Integer64\n    1\nend\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::InvalidTypeParameters));
}

#[test]
fn value_where_type_expected_is_invalid_constructor() {
    let checked = run("let v = 1\ndef f(p as v) as Integer64\n    1\nend\n");
    assert!(kinds(&checked).contains(&DiagnosticKind::InvalidTypeConstructor));
}

#[test]
fn alias_type_resolves_to_target() {
    let source = "type MyInt as Integer64\nlet x as MyInt = 42\n";
    let checked = run(source);
    assert_clean(&checked);
}

// ── Records ────────────────────────────────────────────────────────────

#[test]
fn record_construction_and_field_read() {
    let source = "\
type Point
    x as Integer64
    y as Integer64
end
let p = Point.new(1, 2)
let a = p.x
let b = p.0
";
    let checked = run(source);
    assert_clean(&checked);

    let ExprKind::Let { declaration, .. } = &statements(&checked)[2].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Integer(64)));
}

#[test]
fn missing_record_field_is_reported() {
    let source = "\
type Point
    x as Integer64
    y as Integer64
end
let p = Point.new(1, 2)
let z = p.z
";
    let checked = run(source);
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeInference));
}

#[test]
fn record_constructor_checks_argument_types() {
    let source = "\
type Point
    x as Integer64
    y as Integer64
end
let p = Point.new(1, 2.5)
";
    let checked = run(source);
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

// ── Generics ───────────────────────────────────────────────────────────

#[test]
fn generic_calls_record_specialisations() {
    let source = "\
def id{T}(x as T) as T
    x
end
let a = id(7)
let b = id(1.5)
let c = id(9)
";
    let checked = run(source);
    assert_clean(&checked);

    // Two distinct substitutions, the integer one deduplicated.
    let ExprKind::Def(holder) = &statements(&checked)[0].kind else {
        panic!("expected def");
    };
    let mref = checked.ctx.defs.get(&holder.decl.id).expect("method recorded");
    let method = checked.ctx.registry.method(*mref);
    assert_eq!(method.specialisations.len(), 2);

    // Call types substitute the return type.
    let ExprKind::Let { declaration, .. } = &statements(&checked)[1].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Integer(64)));
    let ExprKind::Let { declaration, .. } = &statements(&checked)[2].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Float(64)));

    // The reifier materialised one clone per substitution.
    assert_eq!(holder.specialised.len(), 2);
    let indices: Vec<usize> = holder
        .specialised
        .iter()
        .map(|s| s.specialisation_index)
        .collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn specialised_clones_get_fresh_decorated_bodies() {
    let source = "\
def twice{T}(x as T) as T
    x
end
let a = twice(3)
";
    let checked = run(source);
    assert_clean(&checked);

    let ExprKind::Def(holder) = &statements(&checked)[0].kind else {
        panic!("expected def");
    };
    assert_eq!(holder.specialised.len(), 1);
    let clone = &holder.specialised[0].decl;
    assert_ne!(clone.id, holder.decl.id);
    // The clone's body was re-inferred with T bound to Integer64.
    let body = clone.body.as_ref().expect("clone keeps its body");
    assert_eq!(checked.ctx.type_of(body.id), Some(&Ty::Integer(64)));
}

#[test]
fn unused_generic_produces_no_specialisations() {
    let source = "def id{T}(x as T) as T\n    x\nend\n";
    let checked = run(source);
    assert_clean(&checked);
    let ExprKind::Def(holder) = &statements(&checked)[0].kind else {
        panic!("expected def");
    };
    let mref = checked.ctx.defs.get(&holder.decl.id).expect("method recorded");
    assert!(checked.ctx.registry.method(*mref).specialisations.is_empty());
    assert!(holder.specialised.is_empty());
}

// ── Control flow ───────────────────────────────────────────────────────

#[test]
fn if_branches_must_unify() {
    let source = "let x = 1\nif x == 1\n    1\nelse\n    2.5\nend\n";
    let checked = run(source);
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

#[test]
fn while_condition_must_be_boolean() {
    let source = "while 1\n    2\nend\n";
    let checked = run(source);
    assert!(kinds(&checked).contains(&DiagnosticKind::TypeMismatch));
}

#[test]
fn modules_nest_and_resolve_through_selectors() {
    let source = "\
module Geometry
    let pi = 3.14
end
let x = Geometry.pi
";
    let checked = run(source);
    assert_clean(&checked);
    let ExprKind::Let { declaration, .. } = &statements(&checked)[1].kind else {
        panic!("expected let");
    };
    assert_eq!(checked.ctx.type_of(declaration.id), Some(&Ty::Float(64)));
}

#[test]
fn every_checked_expression_has_a_type() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
let total = add(40, 2)
";
    let checked = run(source);
    assert_clean(&checked);
    for statement in statements(&checked) {
        assert!(checked.ctx.type_of(statement.id).is_some());
    }
}
