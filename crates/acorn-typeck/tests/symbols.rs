//! Symbol-table structure tests: what the builder and inferrer leave
//! behind in the namespace tree.

use acorn_common::diagnostics::{DiagnosticKind, Reporter};
use acorn_parser::parse_source;
use acorn_typeck::ty::Ty;
use acorn_typeck::{builder, infer, TypeckContext};

fn analyse(source: &str) -> (TypeckContext, Reporter) {
    let mut reporter = Reporter::new();
    let outcome = parse_source("test.acorn", source, &mut reporter).expect("parse");
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let mut ctx = TypeckContext::new();
    builder::build(&outcome.file, &mut ctx, &mut reporter);
    infer::infer(&outcome.file, &mut ctx, &mut reporter);
    (ctx, reporter)
}

#[test]
fn function_symbols_are_containers_without_declaration_nodes() {
    let source = "\
def greet(x as Integer64) as Integer64
    x
end
";
    let (ctx, reporter) = analyse(source);
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let root = ctx.symtab.root();
    let id = ctx.symtab.lookup(root, "greet").expect("function symbol");
    let symbol = ctx.symtab.symbol(id);

    // The function symbol is a container: an overload set with a nested
    // namespace, no declaration node of its own.
    assert!(matches!(symbol.ty, Some(Ty::Function(_))));
    assert!(symbol.node.is_none());
    let nested = symbol.scope.expect("function namespace");
    assert_eq!(ctx.symtab.scope_len(nested), 1);
}

#[test]
fn method_symbols_are_renamed_to_their_mangled_signature() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
";
    let (ctx, _) = analyse(source);

    let root = ctx.symtab.root();
    let id = ctx.symtab.lookup(root, "add").expect("function symbol");
    let nested = ctx.symtab.symbol(id).scope.expect("function namespace");

    let method = ctx
        .symtab
        .lookup_local(nested, "mi64i64i64")
        .expect("method symbol keyed by its mangled signature");
    assert!(matches!(ctx.symtab.symbol(method).ty, Some(Ty::Method(_))));
}

#[test]
fn two_overloads_with_identical_signatures_are_too_many() {
    let source = "\
def f(x as Integer64) as Integer64
    x
end
def f(y as Integer64) as Integer64
    y
end
";
    let (_, reporter) = analyse(source);
    let kinds: Vec<DiagnosticKind> = reporter.diagnostics().iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::TooManyDefined), "{kinds:?}");
}

#[test]
fn overloads_with_distinct_signatures_share_one_function_symbol() {
    let source = "\
def f(x as Integer64) as Integer64
    x
end
def f(x as Float64) as Float64
    x
end
";
    let (ctx, reporter) = analyse(source);
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let root = ctx.symtab.root();
    let id = ctx.symtab.lookup(root, "f").expect("function symbol");
    let symbol = ctx.symtab.symbol(id);
    let Some(Ty::Function(function)) = symbol.ty.clone() else {
        panic!("f should be a function");
    };
    assert_eq!(ctx.registry.function(function).methods.len(), 2);
    let nested = symbol.scope.expect("function namespace");
    assert_eq!(ctx.symtab.scope_len(nested), 2);
}

#[test]
fn every_declaration_is_reachable_by_node() {
    let source = "\
let counter = 0
type Point
    x as Integer64
    y as Integer64
end
";
    let (ctx, _) = analyse(source);
    let root = ctx.symtab.root();

    for name in ["counter", "Point"] {
        let id = ctx.symtab.lookup(root, name).expect("symbol exists");
        let node = ctx.symtab.symbol(id).node.expect("declarations carry their node");
        assert_eq!(ctx.symtab.lookup_by_node(root, node), Some(id));
    }
}

#[test]
fn type_declarations_namespace_their_parameters_and_fields() {
    let source = "\
type Box{T}
    value as T
end
";
    let (ctx, reporter) = analyse(source);
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let root = ctx.symtab.root();
    let id = ctx.symtab.lookup(root, "Box").expect("type symbol");
    let nested = ctx.symtab.symbol(id).scope.expect("type namespace");

    // T and the field name both live in the type's namespace.
    assert!(ctx.symtab.lookup_local(nested, "T").is_some());
    assert!(ctx.symtab.lookup_local(nested, "value").is_some());
    // Neither leaks into the root.
    assert!(ctx.symtab.lookup_local(root, "T").is_none());
    assert!(ctx.symtab.lookup_local(root, "value").is_none());
}

#[test]
fn module_bindings_stay_inside_the_module() {
    let source = "\
module Math
    let pi = 3.14
end
";
    let (ctx, reporter) = analyse(source);
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let root = ctx.symtab.root();
    assert!(ctx.symtab.lookup_local(root, "pi").is_none());

    let id = ctx.symtab.lookup(root, "Math").expect("module symbol");
    let nested = ctx.symtab.symbol(id).scope.expect("module namespace");
    assert!(ctx.symtab.lookup_local(nested, "pi").is_some());
    assert!(matches!(ctx.symtab.symbol(id).ty, Some(Ty::Module(_))));
}

#[test]
fn defining_a_function_over_an_outer_value_binding_shadows_it() {
    // `f` is a value at the root; a def inside a module namespace creates
    // a fresh function symbol rather than extending the outer binding.
    let source = "\
let f = 1
module M
    def f(x as Integer64) as Integer64
        x
    end
end
";
    let (ctx, reporter) = analyse(source);
    assert!(!reporter.has_errors(), "{:?}", reporter.diagnostics());

    let root = ctx.symtab.root();
    let outer = ctx.symtab.lookup(root, "f").expect("outer binding");
    assert_eq!(ctx.symtab.symbol(outer).ty, Some(Ty::Integer(64)));

    let module = ctx.symtab.lookup(root, "M").expect("module symbol");
    let nested = ctx.symtab.symbol(module).scope.expect("module namespace");
    let inner = ctx.symtab.lookup_local(nested, "f").expect("inner function");
    assert!(matches!(ctx.symtab.symbol(inner).ty, Some(Ty::Function(_))));
}
