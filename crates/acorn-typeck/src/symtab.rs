//! The symbol table: a tree of namespaces over an arena of symbols.
//!
//! One root namespace exists per compilation, pre-populated with builtins.
//! Lookup walks innermost-first along the parent chain. Insertion under a
//! name already taken in the *same* namespace is a redefinition; shadowing
//! a parent binding is allowed and is how block-local `let` works.

use rustc_hash::FxHashMap;

use acorn_parser::ast::NodeId;

use crate::ty::Ty;

/// Handle to a namespace in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// Handle to a symbol in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// A named binding: where it was declared, its type once inferred, and an
/// optional nested namespace (functions, types, modules, generic variables).
#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    /// The declaration node. Function symbols have none: they are
    /// containers whose nested namespace holds one symbol per method.
    pub node: Option<NodeId>,
    /// Filled in by the inferrer.
    pub ty: Option<Ty>,
    /// Nested namespace, if this symbol introduces one.
    pub scope: Option<ScopeId>,
    pub is_builtin: bool,
    /// Assignable after declaration (`let mutable`).
    pub is_mutable: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node: None,
            ty: None,
            scope: None,
            is_builtin: false,
            is_mutable: false,
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_ty(mut self, ty: Ty) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: FxHashMap<String, SymbolId>,
    /// Insertion order, for deterministic iteration.
    order: Vec<SymbolId>,
}

/// The namespace tree plus the symbol arena.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Create a table with an empty root namespace.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            symbols: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn is_root(&self, scope: ScopeId) -> bool {
        scope == self.root()
    }

    /// Create a new namespace under `parent`.
    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        ScopeId(self.scopes.len() as u32 - 1)
    }

    /// Insert a symbol. Fails (returning the symbol's name) when the name
    /// is already bound in this namespace.
    pub fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> Result<SymbolId, String> {
        if self.scopes[scope.0 as usize].names.contains_key(&symbol.name) {
            return Err(symbol.name);
        }

        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name.clone();
        self.symbols.push(symbol);

        let scope = &mut self.scopes[scope.0 as usize];
        scope.names.insert(name, id);
        scope.order.push(id);
        Ok(id)
    }

    /// Whether `name` is bound here (or, optionally, in any ancestor).
    pub fn has(&self, scope: ScopeId, name: &str, follow_parents: bool) -> bool {
        if follow_parents {
            self.lookup(scope, name).is_some()
        } else {
            self.scopes[scope.0 as usize].names.contains_key(name)
        }
    }

    /// Innermost-first lookup along the parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.0 as usize];
            if let Some(&id) = scope.names.get(name) {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    /// Lookup restricted to this namespace.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0 as usize].names.get(name).copied()
    }

    /// Find the symbol introduced by a declaration node, searching this
    /// namespace then its ancestors.
    pub fn lookup_by_node(&self, scope: ScopeId, node: NodeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.0 as usize];
            for &id in &scope.order {
                if self.symbols[id.0 as usize].node == Some(node) {
                    return Some(id);
                }
            }
            current = scope.parent;
        }
        None
    }

    /// Re-key a symbol under a new name within its namespace. Fails when
    /// the new name is already taken by a different symbol.
    pub fn rename(&mut self, scope: ScopeId, id: SymbolId, new_name: &str) -> Result<(), String> {
        let scope = &mut self.scopes[scope.0 as usize];
        match scope.names.get(new_name) {
            Some(&existing) if existing != id => return Err(new_name.to_string()),
            _ => {}
        }

        let old_name = self.symbols[id.0 as usize].name.clone();
        scope.names.remove(&old_name);
        scope.names.insert(new_name.to_string(), id);
        self.symbols[id.0 as usize].name = new_name.to_string();
        Ok(())
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Symbols of a namespace, in insertion order.
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = SymbolId> + '_ {
        self.scopes[scope.0 as usize].order.iter().copied()
    }

    /// Number of symbols bound directly in a namespace.
    pub fn scope_len(&self, scope: ScopeId) -> usize {
        self.scopes[scope.0 as usize].order.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let id = table.insert(root, Symbol::new("x")).unwrap();
        assert_eq!(table.lookup(root, "x"), Some(id));
        assert_eq!(table.lookup(root, "y"), None);
    }

    #[test]
    fn duplicate_insert_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.insert(root, Symbol::new("x")).unwrap();
        assert_eq!(table.insert(root, Symbol::new("x")), Err("x".to_string()));
    }

    #[test]
    fn child_scope_shadows_parent() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let outer = table.insert(root, Symbol::new("x").with_ty(Ty::Integer(64))).unwrap();

        let child = table.new_scope(root);
        let inner = table
            .insert(child, Symbol::new("x").with_ty(Ty::Boolean))
            .unwrap();

        // Lookup from the child sees the child's binding.
        assert_eq!(table.lookup(child, "x"), Some(inner));
        // Lookup from the root still sees the original.
        assert_eq!(table.lookup(root, "x"), Some(outer));
    }

    #[test]
    fn lookup_follows_parent_chain() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let id = table.insert(root, Symbol::new("deep")).unwrap();
        let mid = table.new_scope(root);
        let leaf = table.new_scope(mid);
        assert_eq!(table.lookup(leaf, "deep"), Some(id));
        assert_eq!(table.lookup_local(leaf, "deep"), None);
    }

    #[test]
    fn lookup_by_node_finds_declaration() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let node = NodeId(7);
        let id = table
            .insert(root, Symbol::new("decl").with_node(node))
            .unwrap();
        let child = table.new_scope(root);
        assert_eq!(table.lookup_by_node(child, node), Some(id));
        assert_eq!(table.lookup_by_node(child, NodeId(8)), None);
    }

    #[test]
    fn rename_rekeys_the_symbol() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let id = table.insert(root, Symbol::new("temp")).unwrap();
        table.rename(root, id, "mi64i64i64").unwrap();
        assert_eq!(table.lookup(root, "mi64i64i64"), Some(id));
        assert_eq!(table.lookup(root, "temp"), None);
    }

    #[test]
    fn rename_collision_fails() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.insert(root, Symbol::new("taken")).unwrap();
        let id = table.insert(root, Symbol::new("temp")).unwrap();
        assert!(table.rename(root, id, "taken").is_err());
    }

    #[test]
    fn symbols_iterate_in_insertion_order() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.insert(root, Symbol::new("a")).unwrap();
        table.insert(root, Symbol::new("b")).unwrap();
        let names: Vec<_> = table
            .symbols_in(root)
            .map(|id| table.symbol(id).name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
