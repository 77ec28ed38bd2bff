//! Acorn semantic analysis: symbol table, two-tier type system, inference,
//! checking, and generic reification.
//!
//! # Architecture
//!
//! - [`symtab`]: nested namespaces over a symbol arena
//! - [`ty`]: `TyCtor` constructors / `Ty` instances, and the function registry
//! - [`builtins`]: root-namespace population
//! - [`builder`]: the symbol-table building pass
//! - [`infer`]: bottom-up typing, call resolution, specialisation collection
//! - [`check`]: decoration verification (defence in depth)
//! - [`reify`]: materialisation of generic specialisations
//!
//! All passes share a [`TypeckContext`] owned by the driver. Decorations
//! live in side tables keyed by node id, so AST clones (which get fresh
//! ids) start undecorated.

pub mod builder;
pub mod builtins;
pub mod check;
pub mod infer;
pub mod reify;
pub mod symtab;
pub mod ty;

use rustc_hash::FxHashMap;

use acorn_parser::ast::NodeId;

use symtab::SymbolTable;
use ty::{FunctionId, FunctionRegistry, MethodRef, Ty};

/// How a call site was resolved: which overload, and which of its generic
/// specialisations. Written by the inferrer, read by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallResolution {
    pub function: FunctionId,
    pub method_index: usize,
    pub specialisation_index: usize,
}

/// Shared state of the semantic passes for one compilation.
pub struct TypeckContext {
    pub symtab: SymbolTable,
    pub registry: FunctionRegistry,
    /// Resolved type of every expression (and resolved type names).
    pub types: FxHashMap<NodeId, Ty>,
    /// Call-site resolution decorations.
    pub calls: FxHashMap<NodeId, CallResolution>,
    /// `def` declaration -> the method it produced.
    pub defs: FxHashMap<NodeId, MethodRef>,
}

impl TypeckContext {
    /// A fresh context with the root namespace pre-populated with builtins.
    pub fn new() -> Self {
        let mut symtab = SymbolTable::new();
        let mut registry = FunctionRegistry::new();
        builtins::install(&mut symtab, &mut registry);
        Self {
            symtab,
            registry,
            types: FxHashMap::default(),
            calls: FxHashMap::default(),
            defs: FxHashMap::default(),
        }
    }

    /// The resolved type of a node, if inference reached it.
    pub fn type_of(&self, node: NodeId) -> Option<&Ty> {
        self.types.get(&node)
    }
}

impl Default for TypeckContext {
    fn default() -> Self {
        Self::new()
    }
}
