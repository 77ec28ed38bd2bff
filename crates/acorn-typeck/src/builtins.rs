//! Root-namespace builtins: type constructors, primitive values, and the
//! built-in operator functions.
//!
//! The builtin operator methods are registered here with their types; the
//! emitter supplies their bodies. `Integer` and `Float` are the unsized
//! spellings integer and float literals resolve through; they alias the
//! 64-bit constructors. `String` aliases `UnsafePointer{Integer8}`.

use crate::symtab::{ScopeId, Symbol, SymbolTable};
use crate::ty::{
    AliasCtor, FunctionRegistry, MethodData, MethodRef, Ty, TyCtor,
};

/// The operator and conversion methods the emitter can produce bodies for.
pub const BUILTIN_METHOD_NAMES: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "not",
    "to_float", "to_int", "_debug_print_",
];

/// Populate the root namespace.
pub fn install(symtab: &mut SymbolTable, registry: &mut FunctionRegistry) {
    let root = symtab.root();

    // ── Type constructors ──────────────────────────────────────────────
    add_ctor(symtab, root, "Void", TyCtor::Void);
    add_ctor(symtab, root, "Boolean", TyCtor::Boolean);
    for size in [8u32, 16, 32, 64, 128] {
        add_ctor(symtab, root, &format!("Integer{size}"), TyCtor::Integer(size));
        add_ctor(
            symtab,
            root,
            &format!("UnsignedInteger{size}"),
            TyCtor::UnsignedInteger(size),
        );
    }
    for size in [16u32, 32, 64, 128] {
        add_ctor(symtab, root, &format!("Float{size}"), TyCtor::Float(size));
    }
    // Unsized spellings used by literal inference.
    add_ctor(symtab, root, "Integer", TyCtor::Integer(64));
    add_ctor(symtab, root, "UnsignedInteger", TyCtor::UnsignedInteger(64));
    add_ctor(symtab, root, "Float", TyCtor::Float(64));
    add_ctor(symtab, root, "UnsafePointer", TyCtor::UnsafePointer);
    add_ctor(symtab, root, "Function", TyCtor::Function);
    add_ctor(symtab, root, "Method", TyCtor::Method);
    add_ctor(symtab, root, "Tuple", TyCtor::Tuple);
    add_ctor(symtab, root, "Type", TyCtor::TypeDescription);
    add_ctor(
        symtab,
        root,
        "String",
        TyCtor::Alias(AliasCtor {
            name: "String".to_string(),
            input_parameters: Vec::new(),
            target: Ty::UnsafePointer(Box::new(Ty::Integer(8))),
        }),
    );

    // ── Primitive values ───────────────────────────────────────────────
    add_value(symtab, root, "true", Ty::Boolean);
    add_value(symtab, root, "false", Ty::Boolean);
    add_value(symtab, root, "Nothing", Ty::Void);

    // ── Operator functions ─────────────────────────────────────────────
    let int = Ty::Integer(64);
    let float = Ty::Float(64);

    for op in ["+", "-", "*", "/", "%"] {
        let function = add_function(symtab, registry, root, op);
        add_method(
            symtab,
            registry,
            &function,
            binary(&int, &int, &int),
        );
        add_method(
            symtab,
            registry,
            &function,
            binary(&float, &float, &float),
        );
    }

    for op in ["==", "!=", "<", "<=", ">", ">="] {
        let function = add_function(symtab, registry, root, op);
        add_method(
            symtab,
            registry,
            &function,
            binary(&int, &int, &Ty::Boolean),
        );
        add_method(
            symtab,
            registry,
            &function,
            binary(&float, &float, &Ty::Boolean),
        );
    }

    let not = add_function(symtab, registry, root, "not");
    add_method(
        symtab,
        registry,
        &not,
        unary("x", &Ty::Boolean, &Ty::Boolean),
    );

    let to_float = add_function(symtab, registry, root, "to_float");
    add_method(symtab, registry, &to_float, unary("self", &int, &float));

    let to_int = add_function(symtab, registry, root, "to_int");
    add_method(symtab, registry, &to_int, unary("self", &float, &int));

    let debug_print = add_function(symtab, registry, root, "_debug_print_");
    add_method(
        symtab,
        registry,
        &debug_print,
        unary("x", &int, &Ty::Void),
    );
}

fn add_ctor(symtab: &mut SymbolTable, root: ScopeId, name: &str, ctor: TyCtor) {
    symtab
        .insert(
            root,
            Symbol::new(name)
                .with_ty(Ty::Constructor(Box::new(ctor)))
                .builtin(),
        )
        .expect("builtin type constructors have unique names");
}

fn add_value(symtab: &mut SymbolTable, root: ScopeId, name: &str, ty: Ty) {
    symtab
        .insert(root, Symbol::new(name).with_ty(ty).builtin())
        .expect("builtin values have unique names");
}

struct BuiltinFunction {
    id: crate::ty::FunctionId,
    scope: ScopeId,
}

/// Register a function symbol with an empty overload set and a nested
/// namespace for its method symbols.
fn add_function(
    symtab: &mut SymbolTable,
    registry: &mut FunctionRegistry,
    root: ScopeId,
    name: &str,
) -> BuiltinFunction {
    let id = registry.add_function(name);
    let scope = symtab.new_scope(root);
    let mut symbol = Symbol::new(name).with_ty(Ty::Function(id)).builtin();
    symbol.scope = Some(scope);
    symtab
        .insert(root, symbol)
        .expect("builtin functions have unique names");
    BuiltinFunction { id, scope }
}

/// Add one builtin overload: registry entry plus a method symbol inside the
/// function's namespace, keyed by the method's mangled name.
fn add_method(
    symtab: &mut SymbolTable,
    registry: &mut FunctionRegistry,
    function: &BuiltinFunction,
    mut method: MethodData,
) {
    method.builtin = true;
    let index = registry.function_mut(function.id).add_method(method);
    let mref = MethodRef {
        function: function.id,
        index,
    };
    let mangled = registry.method(mref).mangled_name(registry);
    symtab
        .insert(
            function.scope,
            Symbol::new(mangled).with_ty(Ty::Method(mref)).builtin(),
        )
        .expect("builtin overloads have distinct signatures");
}

fn binary(a: &Ty, b: &Ty, ret: &Ty) -> MethodData {
    MethodData::new(
        vec!["a".to_string(), "b".to_string()],
        vec![a.clone(), b.clone()],
        vec![false, false],
        ret.clone(),
    )
}

fn unary(name: &str, parameter: &Ty, ret: &Ty) -> MethodData {
    MethodData::new(
        vec![name.to_string()],
        vec![parameter.clone()],
        vec![false],
        ret.clone(),
    )
}
