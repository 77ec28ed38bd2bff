//! Parser integration tests: source text in, AST shape out.

use acorn_common::diagnostics::Reporter;
use acorn_parser::ast::{Expr, ExprKind, TypeShape};
use acorn_parser::parse_source;

/// Parse source expecting success, returning the top-level statements.
fn parse_ok(source: &str) -> Vec<Expr> {
    let mut reporter = Reporter::new();
    let outcome = parse_source("test.acorn", source, &mut reporter)
        .unwrap_or_else(|| panic!("parse failed: {:?}", reporter.diagnostics()));
    assert!(
        !reporter.has_errors(),
        "unexpected diagnostics: {:?}",
        reporter.diagnostics()
    );
    match outcome.file.code.kind {
        ExprKind::Block(statements) => statements,
        other => panic!("top level should be a block, got {other:?}"),
    }
}

fn parse_err(source: &str) -> Reporter {
    let mut reporter = Reporter::new();
    let outcome = parse_source("test.acorn", source, &mut reporter);
    assert!(
        outcome.is_none() || reporter.has_errors(),
        "expected a parse failure"
    );
    reporter
}

#[test]
fn empty_source_parses_to_empty_block() {
    assert!(parse_ok("").is_empty());
}

#[test]
fn let_with_type_annotation() {
    let statements = parse_ok("let x as Integer64 = 42\n");
    assert_eq!(statements.len(), 1);
    let ExprKind::Let {
        declaration, value, ..
    } = &statements[0].kind
    else {
        panic!("expected let");
    };
    assert_eq!(declaration.name.name.value, "x");
    assert!(!declaration.mutable);
    assert_eq!(
        declaration.given_type.as_ref().unwrap().name.value,
        "Integer64"
    );
    assert!(matches!(value.as_deref(), Some(Expr { kind: ExprKind::Int(v), .. }) if v == "42"));
}

#[test]
fn let_mutable_is_marked() {
    let statements = parse_ok("let mutable counter = 0\n");
    let ExprKind::Let { declaration, .. } = &statements[0].kind else {
        panic!("expected let");
    };
    assert!(declaration.mutable);
}

#[test]
fn def_with_parameters_and_return_type() {
    let source = "def add(a as Integer64, b as Integer64) as Integer64\n    a + b\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Def(holder) = &statements[0].kind else {
        panic!("expected def");
    };
    let def = &holder.decl;
    assert_eq!(def.name.name.value, "add");
    assert_eq!(def.parameters.len(), 2);
    assert_eq!(def.parameters[0].name.value, "a");
    assert!(!def.parameters[0].inout);
    assert_eq!(
        def.given_return_type.as_ref().unwrap().name.value,
        "Integer64"
    );
    assert!(def.body.is_some());
    assert!(holder.specialised.is_empty());
}

#[test]
fn def_with_inout_parameter() {
    let source = "def bump(inout x as Integer64) as Integer64\n    x\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Def(holder) = &statements[0].kind else {
        panic!("expected def");
    };
    assert!(holder.decl.parameters[0].inout);
}

#[test]
fn generic_def_introduces_type_parameters() {
    let source = "def id{T}(x as T) as T\n    x\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Def(holder) = &statements[0].kind else {
        panic!("expected def");
    };
    assert!(holder.decl.name.is_generic());
    assert_eq!(holder.decl.name.parameters[0].value, "T");
}

#[test]
fn operator_definition() {
    let source = "def +(a as Float64, b as Float64) as Float64\n    a\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Def(holder) = &statements[0].kind else {
        panic!("expected def");
    };
    assert_eq!(holder.decl.name.name.value, "+");
}

#[test]
fn record_type_declaration() {
    let source = "type Point\n    x as Integer64\n    y as Integer64\nend\n";
    let statements = parse_ok(source);
    let ExprKind::TypeDef(holder) = &statements[0].kind else {
        panic!("expected type");
    };
    let TypeShape::Record {
        field_names,
        field_types,
    } = &holder.decl.shape
    else {
        panic!("expected record shape");
    };
    assert_eq!(field_names.len(), 2);
    assert_eq!(field_names[0].value, "x");
    assert_eq!(field_types[1].name.value, "Integer64");
}

#[test]
fn alias_type_declaration() {
    let statements = parse_ok("type MyInt as Integer64\n");
    let ExprKind::TypeDef(holder) = &statements[0].kind else {
        panic!("expected type");
    };
    assert!(matches!(&holder.decl.shape, TypeShape::Alias(t) if t.name.value == "Integer64"));
}

#[test]
fn call_with_keyword_arguments() {
    let statements = parse_ok("f(1, second: 2)\n");
    let ExprKind::Call(call) = &statements[0].kind else {
        panic!("expected call");
    };
    assert_eq!(call.positional.len(), 1);
    assert_eq!(call.keyword.len(), 1);
    assert_eq!(call.keyword[0].0.value, "second");
}

#[test]
fn binary_precedence_multiplication_binds_tighter() {
    let statements = parse_ok("a + b * c\n");
    // Expect add(a, mul(b, c)).
    let ExprKind::Call(add) = &statements[0].kind else {
        panic!("expected call");
    };
    let ExprKind::Name(op) = &add.operand.kind else {
        panic!("expected operator name");
    };
    assert_eq!(op.value(), "+");
    let ExprKind::Call(inner) = &add.positional[1].kind else {
        panic!("expected nested call");
    };
    let ExprKind::Name(inner_op) = &inner.operand.kind else {
        panic!("expected operator name");
    };
    assert_eq!(inner_op.value(), "*");
}

#[test]
fn assignment_parses_to_assignment_node() {
    let statements = parse_ok("x = 5\n");
    let ExprKind::Assignment { target, value } = &statements[0].kind else {
        panic!("expected assignment");
    };
    assert_eq!(target.value(), "x");
    assert!(matches!(&value.kind, ExprKind::Int(v) if v == "5"));
}

#[test]
fn selector_chain_and_integer_field() {
    let statements = parse_ok("p.0\n");
    let ExprKind::Selector { field, .. } = &statements[0].kind else {
        panic!("expected selector");
    };
    assert_eq!(field.value(), "0");
}

#[test]
fn record_construction_through_selector_new() {
    let statements = parse_ok("Point.new(1, 2)\n");
    let ExprKind::Call(call) = &statements[0].kind else {
        panic!("expected call");
    };
    let ExprKind::Selector { operand, field } = &call.operand.kind else {
        panic!("expected selector operand");
    };
    assert_eq!(field.value(), "new");
    assert!(matches!(&operand.kind, ExprKind::Name(n) if n.value() == "Point"));
}

#[test]
fn if_else_chain() {
    let source = "if a\n    1\nelse if b\n    2\nelse\n    3\nend\n";
    let statements = parse_ok(source);
    let ExprKind::If { false_case, .. } = &statements[0].kind else {
        panic!("expected if");
    };
    let nested = false_case.as_ref().expect("else branch");
    assert!(matches!(nested.kind, ExprKind::If { .. }));
}

#[test]
fn while_loop_with_multi_statement_body() {
    let source = "while running\n    let x = 1\n    f(x)\nend\n";
    let statements = parse_ok(source);
    let ExprKind::While { body, .. } = &statements[0].kind else {
        panic!("expected while");
    };
    let ExprKind::Block(inner) = &body.kind else {
        panic!("expected block body");
    };
    assert_eq!(inner.len(), 2);
}

#[test]
fn for_desugars_to_start_done_next() {
    let source = "for item in things\n    use(item)\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Block(parts) = &statements[0].kind else {
        panic!("expected desugared block");
    };
    assert_eq!(parts.len(), 2);
    assert!(matches!(parts[0].kind, ExprKind::Let { .. }));
    let ExprKind::While { condition, body } = &parts[1].kind else {
        panic!("expected while");
    };
    // condition is not(done(state))
    let ExprKind::Call(not_call) = &condition.kind else {
        panic!("expected call condition");
    };
    assert!(matches!(&not_call.operand.kind, ExprKind::Name(n) if n.value() == "not"));
    // loop body starts with `let item = next(state)`
    let ExprKind::Block(loop_body) = &body.kind else {
        panic!("expected block");
    };
    let ExprKind::Let { declaration, .. } = &loop_body[0].kind else {
        panic!("expected let");
    };
    assert_eq!(declaration.name.name.value, "item");
}

#[test]
fn index_sugar_becomes_getindex_and_setindex() {
    let statements = parse_ok("a[1]\na[2] = 3\n");
    let ExprKind::Call(get) = &statements[0].kind else {
        panic!("expected call");
    };
    assert!(matches!(&get.operand.kind, ExprKind::Name(n) if n.value() == "getindex"));
    assert_eq!(get.positional.len(), 2);

    let ExprKind::Call(set) = &statements[1].kind else {
        panic!("expected call");
    };
    assert!(matches!(&set.operand.kind, ExprKind::Name(n) if n.value() == "setindex"));
    assert_eq!(set.positional.len(), 3);
}

#[test]
fn cast_expression() {
    let statements = parse_ok("x as Integer32\n");
    let ExprKind::Cast { target, .. } = &statements[0].kind else {
        panic!("expected cast");
    };
    assert_eq!(target.name.value, "Integer32");
}

#[test]
fn ccall_with_types_and_arguments() {
    let source = "ccall putchar(Integer32) as Integer32 using c\n";
    let statements = parse_ok(source);
    let ExprKind::CCall(ccall) = &statements[0].kind else {
        panic!("expected ccall");
    };
    assert_eq!(ccall.name.value, "putchar");
    assert_eq!(ccall.parameter_types.len(), 1);
    assert_eq!(ccall.return_type.name.value, "Integer32");
    assert_eq!(ccall.arguments.len(), 1);
}

#[test]
fn tuple_literal() {
    let statements = parse_ok("(1, 2.5)\n");
    let ExprKind::Tuple(elements) = &statements[0].kind else {
        panic!("expected tuple");
    };
    assert_eq!(elements.len(), 2);
}

#[test]
fn module_declaration() {
    let source = "module Geometry\n    let pi = 3.14\nend\n";
    let statements = parse_ok(source);
    let ExprKind::Module { name, body } = &statements[0].kind else {
        panic!("expected module");
    };
    assert_eq!(name.value, "Geometry");
    assert!(matches!(body.kind, ExprKind::Block(_)));
}

#[test]
fn type_arguments_on_expression_names() {
    let statements = parse_ok("id{Integer64}(7)\n");
    let ExprKind::Call(call) = &statements[0].kind else {
        panic!("expected call");
    };
    let ExprKind::Name(name) = &call.operand.kind else {
        panic!("expected name operand");
    };
    assert_eq!(name.parameters.len(), 1);
    assert_eq!(name.parameters[0].name.value, "Integer64");
}

#[test]
fn missing_end_is_a_syntax_error() {
    let reporter = parse_err("def f()\n    1\n");
    assert!(reporter.has_errors());
}

#[test]
fn stray_token_reports_expected_primary() {
    let reporter = parse_err("let x = ,\n");
    assert!(reporter.has_errors());
}

#[test]
fn spawn_requires_a_call() {
    let reporter = parse_err("spawn 42\n");
    assert!(reporter.has_errors());
}
