//! The two-tier Acorn type system.
//!
//! Types come in two layers. A [`TyCtor`] is a *type constructor* — the type
//! of a type, what a name after `as` resolves to. Applying a constructor to
//! parameters with [`TyCtor::create`] yields a [`Ty`], the type of a value.
//! `Integer64` in source is a nullary constructor whose `create` produces
//! the `Ty::Integer(64)` instance; `UnsafePointer{Integer64}` applies a
//! unary constructor.
//!
//! Functions and their overloads live in the [`FunctionRegistry`]: a
//! `Ty::Function` is just a handle into it, so specialisations recorded at
//! one call site are visible everywhere the function is referenced.

use std::fmt;

use rustc_hash::FxHashMap;

use acorn_parser::ast::NodeId;

use crate::symtab::ScopeId;

/// Handle to a function (overload set) in the [`FunctionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Handle to one method of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub function: FunctionId,
    pub index: usize,
}

/// A substitution from type-parameter names to concrete types, ordered by
/// parameter name so equal substitutions compare equal.
pub type Specialisation = Vec<(String, Ty)>;

// ── Instances ──────────────────────────────────────────────────────────

/// The type of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    /// An uninstantiated type parameter, by name.
    Parameter(String),
    Void,
    Boolean,
    Integer(u32),
    UnsignedInteger(u32),
    Float(u32),
    UnsafePointer(Box<Ty>),
    Record(RecordTy),
    Tuple(Vec<Ty>),
    /// An overload set, by registry handle.
    Function(FunctionId),
    /// One overload of a function.
    Method(MethodRef),
    /// A module value; selectors read from its namespace.
    Module(ScopeId),
    /// The type of a name that denotes a type.
    Constructor(Box<TyCtor>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordTy {
    pub name: String,
    pub field_names: Vec<String>,
    pub field_types: Vec<Ty>,
}

impl RecordTy {
    /// Resolve a field by name; integer names address fields by position.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        if let Ok(index) = field.parse::<usize>() {
            return (index < self.field_types.len()).then_some(index);
        }
        self.field_names.iter().position(|name| name == field)
    }
}

impl Ty {
    /// Whether two types agree for assignment, argument passing, and
    /// branch unification. A type parameter accepts anything.
    pub fn is_compatible(&self, other: &Ty) -> bool {
        match (self, other) {
            (Ty::Parameter(_), _) | (_, Ty::Parameter(_)) => true,
            (Ty::Void, Ty::Void) => true,
            (Ty::Boolean, Ty::Boolean) => true,
            (Ty::Integer(a), Ty::Integer(b)) => a == b,
            (Ty::UnsignedInteger(a), Ty::UnsignedInteger(b)) => a == b,
            (Ty::Float(a), Ty::Float(b)) => a == b,
            (Ty::UnsafePointer(a), Ty::UnsafePointer(b)) => a.is_compatible(b),
            (Ty::Record(a), Ty::Record(b)) => {
                a.field_types.len() == b.field_types.len()
                    && a.field_types
                        .iter()
                        .zip(&b.field_types)
                        .all(|(x, y)| x.is_compatible(y))
            }
            (Ty::Tuple(a), Ty::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_compatible(y))
            }
            (Ty::Function(a), Ty::Function(b)) => a == b,
            (Ty::Method(a), Ty::Method(b)) => a == b,
            (Ty::Module(a), Ty::Module(b)) => a == b,
            (Ty::Constructor(a), Ty::Constructor(b)) => a == b,
            _ => false,
        }
    }

    /// Whether the type still contains an unsubstituted parameter.
    pub fn is_abstract(&self) -> bool {
        match self {
            Ty::Parameter(_) => true,
            Ty::UnsafePointer(element) => element.is_abstract(),
            Ty::Record(record) => record.field_types.iter().any(Ty::is_abstract),
            Ty::Tuple(elements) => elements.iter().any(Ty::is_abstract),
            _ => false,
        }
    }

    /// Replace parameter leaves according to the substitution.
    pub fn substitute(&self, substitution: &FxHashMap<String, Ty>) -> Ty {
        match self {
            Ty::Parameter(name) => substitution
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Ty::UnsafePointer(element) => {
                Ty::UnsafePointer(Box::new(element.substitute(substitution)))
            }
            Ty::Record(record) => Ty::Record(RecordTy {
                name: record.name.clone(),
                field_names: record.field_names.clone(),
                field_types: record
                    .field_types
                    .iter()
                    .map(|f| f.substitute(substitution))
                    .collect(),
            }),
            Ty::Tuple(elements) => {
                Ty::Tuple(elements.iter().map(|e| e.substitute(substitution)).collect())
            }
            _ => self.clone(),
        }
    }

    /// The short ASCII tag used in mangled symbol names.
    pub fn mangled_name(&self, registry: &FunctionRegistry) -> String {
        match self {
            Ty::Parameter(name) => format!("g{name}"),
            Ty::Void => "v".to_string(),
            Ty::Boolean => "b".to_string(),
            Ty::Integer(size) => format!("i{size}"),
            Ty::UnsignedInteger(size) => format!("ui{size}"),
            Ty::Float(size) => format!("f{size}"),
            Ty::UnsafePointer(element) => format!("p{}", element.mangled_name(registry)),
            Ty::Record(record) => {
                let mut out = "r".to_string();
                for field in &record.field_types {
                    out.push_str(&field.mangled_name(registry));
                }
                out
            }
            Ty::Tuple(elements) => {
                // `t`, not `r`: a tuple must not collide with a record of
                // structurally equal fields.
                let mut out = "t".to_string();
                for element in elements {
                    out.push_str(&element.mangled_name(registry));
                }
                out
            }
            Ty::Function(id) => registry.function(*id).mangled_name(registry),
            Ty::Method(mref) => registry.method(*mref).mangled_name(registry),
            Ty::Module(_) => "o".to_string(),
            Ty::Constructor(_) => "c".to_string(),
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn name(&self, registry: &FunctionRegistry) -> String {
        match self {
            Ty::Parameter(name) => name.clone(),
            Ty::Void => "Void".to_string(),
            Ty::Boolean => "Boolean".to_string(),
            Ty::Integer(size) => format!("Integer{size}"),
            Ty::UnsignedInteger(size) => format!("UnsignedInteger{size}"),
            Ty::Float(size) => format!("Float{size}"),
            Ty::UnsafePointer(element) => format!("UnsafePointer{{{}}}", element.name(registry)),
            Ty::Record(record) => record.name.clone(),
            Ty::Tuple(elements) => {
                let inner: Vec<String> = elements.iter().map(|e| e.name(registry)).collect();
                format!("Tuple{{{}}}", inner.join(", "))
            }
            Ty::Function(id) => {
                let function = registry.function(*id);
                let methods: Vec<String> = function
                    .methods
                    .iter()
                    .map(|m| m.signature(registry))
                    .collect();
                format!("Function{{{}}}", methods.join(", "))
            }
            Ty::Method(mref) => registry.method(*mref).signature(registry),
            Ty::Module(_) => "Module".to_string(),
            Ty::Constructor(ctor) => ctor.name(),
        }
    }
}

// ── Constructors ───────────────────────────────────────────────────────

/// A type constructor — the type of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TyCtor {
    /// A declaration-introduced type parameter.
    Parameter(String),
    Void,
    Boolean,
    Integer(u32),
    UnsignedInteger(u32),
    Float(u32),
    UnsafePointer,
    Function,
    Method,
    Record(RecordCtor),
    Tuple,
    Alias(AliasCtor),
    Module,
    TypeDescription,
}

/// Constructor for a record type, including its canonical `new` function.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCtor {
    pub name: String,
    pub input_parameters: Vec<String>,
    pub field_names: Vec<String>,
    /// Field types, possibly containing `Ty::Parameter` leaves.
    pub field_types: Vec<Ty>,
    /// The overload set behind `Type.new(...)`.
    pub constructor: FunctionId,
}

/// Constructor for an alias. The target may reference the input parameters
/// as `Ty::Parameter` leaves; `create` substitutes them.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasCtor {
    pub name: String,
    pub input_parameters: Vec<String>,
    pub target: Ty,
}

/// Why instantiating a constructor failed.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateError {
    /// Parameter count does not match the constructor's arity.
    Arity { given: usize, expected: usize },
    /// The constructor cannot be instantiated from source.
    NotConstructible,
}

impl TyCtor {
    pub fn name(&self) -> String {
        match self {
            TyCtor::Parameter(name) => name.clone(),
            TyCtor::Void => "Void".to_string(),
            TyCtor::Boolean => "Boolean".to_string(),
            TyCtor::Integer(size) => format!("Integer{size}"),
            TyCtor::UnsignedInteger(size) => format!("UnsignedInteger{size}"),
            TyCtor::Float(size) => format!("Float{size}"),
            TyCtor::UnsafePointer => "UnsafePointer".to_string(),
            TyCtor::Function => "Function".to_string(),
            TyCtor::Method => "Method".to_string(),
            TyCtor::Record(record) => record.name.clone(),
            TyCtor::Tuple => "Tuple".to_string(),
            TyCtor::Alias(alias) => alias.name.clone(),
            TyCtor::Module => "Module".to_string(),
            TyCtor::TypeDescription => "Type".to_string(),
        }
    }

    /// Instantiate the constructor with the given parameters.
    pub fn create(&self, parameters: &[Ty]) -> Result<Ty, CreateError> {
        match self {
            TyCtor::Parameter(name) => {
                expect_arity(parameters, 0)?;
                Ok(Ty::Parameter(name.clone()))
            }
            TyCtor::Void => {
                expect_arity(parameters, 0)?;
                Ok(Ty::Void)
            }
            TyCtor::Boolean => {
                expect_arity(parameters, 0)?;
                Ok(Ty::Boolean)
            }
            TyCtor::Integer(size) => {
                expect_arity(parameters, 0)?;
                Ok(Ty::Integer(*size))
            }
            TyCtor::UnsignedInteger(size) => {
                expect_arity(parameters, 0)?;
                Ok(Ty::UnsignedInteger(*size))
            }
            TyCtor::Float(size) => {
                expect_arity(parameters, 0)?;
                Ok(Ty::Float(*size))
            }
            TyCtor::UnsafePointer => {
                expect_arity(parameters, 1)?;
                Ok(Ty::UnsafePointer(Box::new(parameters[0].clone())))
            }
            TyCtor::Tuple => Ok(Ty::Tuple(parameters.to_vec())),
            TyCtor::Record(record) => {
                expect_arity(parameters, record.input_parameters.len())?;
                let bound = self.with_parameters(parameters);
                let TyCtor::Record(bound) = bound else {
                    unreachable!("with_parameters preserves the constructor kind");
                };
                Ok(Ty::Record(RecordTy {
                    name: bound.name,
                    field_names: bound.field_names,
                    field_types: bound.field_types,
                }))
            }
            TyCtor::Alias(alias) => {
                expect_arity(parameters, alias.input_parameters.len())?;
                let bound = self.with_parameters(parameters);
                let TyCtor::Alias(bound) = bound else {
                    unreachable!("with_parameters preserves the constructor kind");
                };
                Ok(bound.target)
            }
            TyCtor::Function | TyCtor::Method | TyCtor::Module | TyCtor::TypeDescription => {
                Err(CreateError::NotConstructible)
            }
        }
    }

    /// A copy of this constructor with its input parameters substituted.
    pub fn with_parameters(&self, parameters: &[Ty]) -> TyCtor {
        match self {
            TyCtor::Record(record) => {
                let substitution = bind(&record.input_parameters, parameters);
                TyCtor::Record(RecordCtor {
                    name: record.name.clone(),
                    input_parameters: Vec::new(),
                    field_names: record.field_names.clone(),
                    field_types: record
                        .field_types
                        .iter()
                        .map(|f| f.substitute(&substitution))
                        .collect(),
                    constructor: record.constructor,
                })
            }
            TyCtor::Alias(alias) => {
                let substitution = bind(&alias.input_parameters, parameters);
                TyCtor::Alias(AliasCtor {
                    name: alias.name.clone(),
                    input_parameters: Vec::new(),
                    target: alias.target.substitute(&substitution),
                })
            }
            other => other.clone(),
        }
    }
}

fn expect_arity(parameters: &[Ty], expected: usize) -> Result<(), CreateError> {
    if parameters.len() == expected {
        Ok(())
    } else {
        Err(CreateError::Arity {
            given: parameters.len(),
            expected,
        })
    }
}

fn bind(names: &[String], values: &[Ty]) -> FxHashMap<String, Ty> {
    names
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect()
}

// ── Functions and methods ──────────────────────────────────────────────

/// One overload of a function.
#[derive(Debug, Clone)]
pub struct MethodData {
    pub parameter_types: Vec<Ty>,
    pub return_type: Ty,
    /// Canonical left-to-right parameter names.
    pub parameter_names: Vec<String>,
    /// Per-parameter inout flag; true means the caller passes a pointer.
    pub inout: Vec<bool>,
    /// Recorded generic substitutions. Non-generic methods hold exactly one
    /// empty entry from creation.
    pub specialisations: Vec<Specialisation>,
    /// The emitter supplies the body instead of reading one from the AST.
    pub builtin: bool,
    /// The `def` this method was created from, if any. Record constructors
    /// have none.
    pub decl: Option<NodeId>,
}

impl MethodData {
    pub fn new(
        parameter_names: Vec<String>,
        parameter_types: Vec<Ty>,
        inout: Vec<bool>,
        return_type: Ty,
    ) -> Self {
        let mut method = MethodData {
            parameter_types,
            return_type,
            parameter_names,
            inout,
            specialisations: Vec::new(),
            builtin: false,
            decl: None,
        };
        if !method.is_generic() {
            method.specialisations.push(Vec::new());
        }
        method
    }

    pub fn is_generic(&self) -> bool {
        self.parameter_types.iter().any(Ty::is_abstract) || self.return_type.is_abstract()
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == name)
    }

    /// Place positional and keyword arguments into canonical parameter
    /// order. `None` when counts or names do not line up.
    pub fn ordered_arguments<T: Clone>(
        &self,
        positional: &[T],
        keyword: &[(String, T)],
    ) -> Option<Vec<T>> {
        if positional.len() + keyword.len() != self.parameter_types.len() {
            return None;
        }

        let mut slots: Vec<Option<T>> = vec![None; self.parameter_types.len()];

        for (name, value) in keyword {
            let index = self.parameter_index(name)?;
            if slots[index].is_some() {
                return None;
            }
            slots[index] = Some(value.clone());
        }

        let mut next = 0;
        for value in positional {
            while next < slots.len() && slots[next].is_some() {
                next += 1;
            }
            if next == slots.len() {
                return None;
            }
            slots[next] = Some(value.clone());
        }

        slots.into_iter().collect()
    }

    /// Whether this method accepts the given argument types.
    pub fn could_be_called_with(&self, positional: &[Ty], keyword: &[(String, Ty)]) -> bool {
        let Some(ordered) = self.ordered_arguments(positional, keyword) else {
            return false;
        };
        self.parameter_types
            .iter()
            .zip(&ordered)
            .all(|(parameter, argument)| parameter.is_compatible(argument))
    }

    /// Record a specialisation, deduplicating identical substitutions.
    /// Returns its index.
    pub fn add_specialisation(&mut self, specialisation: Specialisation) -> usize {
        if let Some(index) = self
            .specialisations
            .iter()
            .position(|existing| *existing == specialisation)
        {
            return index;
        }
        self.specialisations.push(specialisation);
        self.specialisations.len() - 1
    }

    /// `m` + return tag + parameter tags; unique per typed signature.
    pub fn mangled_name(&self, registry: &FunctionRegistry) -> String {
        let mut out = "m".to_string();
        out.push_str(&self.return_type.mangled_name(registry));
        for parameter in &self.parameter_types {
            out.push_str(&parameter.mangled_name(registry));
        }
        out
    }

    /// Display form, e.g. `(Integer64, Integer64) -> Integer64`.
    pub fn signature(&self, registry: &FunctionRegistry) -> String {
        let parameters: Vec<String> = self
            .parameter_types
            .iter()
            .map(|p| p.name(registry))
            .collect();
        format!(
            "({}) -> {}",
            parameters.join(", "),
            self.return_type.name(registry)
        )
    }
}

/// A named overload set.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: String,
    pub methods: Vec<MethodData>,
    /// Method index -> element index in the emitted method-table struct.
    llvm_indices: FxHashMap<usize, usize>,
}

impl FunctionData {
    /// Append an overload, returning its method index.
    pub fn add_method(&mut self, method: MethodData) -> usize {
        self.methods.push(method);
        self.methods.len() - 1
    }

    /// The first method that accepts the given arguments, if any.
    pub fn find_method(&self, positional: &[Ty], keyword: &[(String, Ty)]) -> Option<usize> {
        self.methods
            .iter()
            .position(|method| method.could_be_called_with(positional, keyword))
    }

    pub fn set_llvm_index(&mut self, method_index: usize, llvm_index: usize) {
        self.llvm_indices.insert(method_index, llvm_index);
    }

    pub fn llvm_index(&self, method_index: usize) -> Option<usize> {
        self.llvm_indices.get(&method_index).copied()
    }

    pub fn mangled_name(&self, registry: &FunctionRegistry) -> String {
        let mut out = "f".to_string();
        for method in &self.methods {
            out.push_str(&method.mangled_name(registry));
        }
        out
    }
}

/// Owner of every function in a compilation.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionData>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, name: impl Into<String>) -> FunctionId {
        self.functions.push(FunctionData {
            name: name.into(),
            methods: Vec::new(),
            llvm_indices: FxHashMap::default(),
        });
        FunctionId(self.functions.len() as u32 - 1)
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.0 as usize]
    }

    pub fn method(&self, mref: MethodRef) -> &MethodData {
        &self.function(mref.function).methods[mref.index]
    }

    pub fn method_mut(&mut self, mref: MethodRef) -> &mut MethodData {
        &mut self.function_mut(mref.function).methods[mref.index]
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str) -> (FunctionRegistry, FunctionId) {
        let mut registry = FunctionRegistry::new();
        let id = registry.add_function(name);
        (registry, id)
    }

    #[test]
    fn scalar_compatibility_is_exact() {
        assert!(Ty::Integer(64).is_compatible(&Ty::Integer(64)));
        assert!(!Ty::Integer(64).is_compatible(&Ty::Integer(32)));
        assert!(!Ty::Integer(64).is_compatible(&Ty::Float(64)));
    }

    #[test]
    fn parameters_accept_anything() {
        assert!(Ty::Parameter("T".into()).is_compatible(&Ty::Integer(64)));
        assert!(Ty::Float(64).is_compatible(&Ty::Parameter("T".into())));
    }

    #[test]
    fn record_compatibility_is_pairwise() {
        let ab = Ty::Record(RecordTy {
            name: "P".into(),
            field_names: vec!["x".into(), "y".into()],
            field_types: vec![Ty::Integer(64), Ty::Boolean],
        });
        let ab2 = Ty::Record(RecordTy {
            name: "Q".into(),
            field_names: vec!["a".into(), "b".into()],
            field_types: vec![Ty::Integer(64), Ty::Boolean],
        });
        let ac = Ty::Record(RecordTy {
            name: "R".into(),
            field_names: vec!["x".into(), "y".into()],
            field_types: vec![Ty::Integer(64), Ty::Float(64)],
        });
        assert!(ab.is_compatible(&ab2));
        assert!(!ab.is_compatible(&ac));
    }

    #[test]
    fn mangled_tags() {
        let registry = FunctionRegistry::new();
        assert_eq!(Ty::Integer(64).mangled_name(&registry), "i64");
        assert_eq!(Ty::Boolean.mangled_name(&registry), "b");
        assert_eq!(Ty::Void.mangled_name(&registry), "v");
        assert_eq!(
            Ty::UnsafePointer(Box::new(Ty::Integer(8))).mangled_name(&registry),
            "pi8"
        );
        assert_eq!(Ty::UnsignedInteger(32).mangled_name(&registry), "ui32");
    }

    #[test]
    fn tuple_and_record_tags_do_not_collide() {
        let registry = FunctionRegistry::new();
        let tuple = Ty::Tuple(vec![Ty::Integer(64), Ty::Integer(64)]);
        let record = Ty::Record(RecordTy {
            name: "Pair".into(),
            field_names: vec!["x".into(), "y".into()],
            field_types: vec![Ty::Integer(64), Ty::Integer(64)],
        });
        assert_eq!(tuple.mangled_name(&registry), "ti64i64");
        assert_eq!(record.mangled_name(&registry), "ri64i64");

        // Overloads differing only in tuple-vs-record mangle apart.
        let takes_tuple = MethodData::new(
            vec!["p".into()],
            vec![tuple],
            vec![false],
            Ty::Void,
        );
        let takes_record = MethodData::new(
            vec!["p".into()],
            vec![record],
            vec![false],
            Ty::Void,
        );
        assert_ne!(
            takes_tuple.mangled_name(&registry),
            takes_record.mangled_name(&registry)
        );
    }

    #[test]
    fn method_mangling_is_injective_across_signatures() {
        let registry = FunctionRegistry::new();
        let add_ints = MethodData::new(
            vec!["a".into(), "b".into()],
            vec![Ty::Integer(64), Ty::Integer(64)],
            vec![false, false],
            Ty::Integer(64),
        );
        let add_floats = MethodData::new(
            vec!["a".into(), "b".into()],
            vec![Ty::Float(64), Ty::Float(64)],
            vec![false, false],
            Ty::Float(64),
        );
        let compare = MethodData::new(
            vec!["a".into(), "b".into()],
            vec![Ty::Integer(64), Ty::Integer(64)],
            vec![false, false],
            Ty::Boolean,
        );
        let names = [
            add_ints.mangled_name(&registry),
            add_floats.mangled_name(&registry),
            compare.mangled_name(&registry),
        ];
        assert_eq!(names[0], "mi64i64i64");
        assert_ne!(names[0], names[1]);
        assert_ne!(names[0], names[2]);
        assert_ne!(names[1], names[2]);
    }

    #[test]
    fn create_scalar_constructors() {
        assert_eq!(TyCtor::Integer(64).create(&[]), Ok(Ty::Integer(64)));
        assert_eq!(TyCtor::Void.create(&[]), Ok(Ty::Void));
        assert!(matches!(
            TyCtor::Integer(64).create(&[Ty::Boolean]),
            Err(CreateError::Arity {
                given: 1,
                expected: 0
            })
        ));
    }

    #[test]
    fn create_pointer_constructor() {
        let created = TyCtor::UnsafePointer.create(&[Ty::Integer(64)]).unwrap();
        assert_eq!(created, Ty::UnsafePointer(Box::new(Ty::Integer(64))));
        assert!(TyCtor::UnsafePointer.create(&[]).is_err());
    }

    #[test]
    fn generic_record_constructor_substitutes_fields() {
        let (_, ctor_fn) = registry_with("Box.new");
        let ctor = TyCtor::Record(RecordCtor {
            name: "Box".into(),
            input_parameters: vec!["T".into()],
            field_names: vec!["value".into()],
            field_types: vec![Ty::Parameter("T".into())],
            constructor: ctor_fn,
        });

        let created = ctor.create(&[Ty::Float(64)]).unwrap();
        let Ty::Record(record) = created else {
            panic!("expected record");
        };
        assert_eq!(record.field_types, vec![Ty::Float(64)]);
    }

    #[test]
    fn alias_create_resolves_to_target() {
        let ctor = TyCtor::Alias(AliasCtor {
            name: "String".into(),
            input_parameters: vec![],
            target: Ty::UnsafePointer(Box::new(Ty::Integer(8))),
        });
        assert_eq!(
            ctor.create(&[]).unwrap(),
            Ty::UnsafePointer(Box::new(Ty::Integer(8)))
        );
    }

    #[test]
    fn ordered_arguments_mixes_positional_and_keyword() {
        let method = MethodData::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![Ty::Integer(64), Ty::Integer(64), Ty::Integer(64)],
            vec![false, false, false],
            Ty::Void,
        );

        let ordered = method
            .ordered_arguments(&[1, 3], &[("b".to_string(), 2)])
            .unwrap();
        assert_eq!(ordered, vec![1, 2, 3]);

        // Unknown keyword name fails.
        assert!(method.ordered_arguments(&[1, 2], &[("z".to_string(), 3)]).is_none());
        // Wrong arity fails.
        assert!(method.ordered_arguments(&[1], &[]).is_none());
    }

    #[test]
    fn find_method_returns_first_compatible() {
        let (mut registry, id) = registry_with("add");
        let ints = MethodData::new(
            vec!["a".into(), "b".into()],
            vec![Ty::Integer(64), Ty::Integer(64)],
            vec![false, false],
            Ty::Integer(64),
        );
        let floats = MethodData::new(
            vec!["a".into(), "b".into()],
            vec![Ty::Float(64), Ty::Float(64)],
            vec![false, false],
            Ty::Float(64),
        );
        registry.function_mut(id).add_method(ints);
        registry.function_mut(id).add_method(floats);

        let function = registry.function(id);
        assert_eq!(
            function.find_method(&[Ty::Integer(64), Ty::Integer(64)], &[]),
            Some(0)
        );
        assert_eq!(
            function.find_method(&[Ty::Float(64), Ty::Float(64)], &[]),
            Some(1)
        );
        assert_eq!(function.find_method(&[Ty::Boolean], &[]), None);
    }

    #[test]
    fn non_generic_methods_start_with_one_empty_specialisation() {
        let method = MethodData::new(
            vec!["x".into()],
            vec![Ty::Integer(64)],
            vec![false],
            Ty::Integer(64),
        );
        assert_eq!(method.specialisations, vec![vec![]]);
    }

    #[test]
    fn identical_specialisations_are_deduplicated() {
        let mut method = MethodData::new(
            vec!["x".into()],
            vec![Ty::Parameter("T".into())],
            vec![false],
            Ty::Parameter("T".into()),
        );
        assert!(method.specialisations.is_empty());

        let first = method.add_specialisation(vec![("T".into(), Ty::Integer(64))]);
        let second = method.add_specialisation(vec![("T".into(), Ty::Integer(64))]);
        let third = method.add_specialisation(vec![("T".into(), Ty::Float(64))]);

        assert_eq!(first, second);
        assert_ne!(first, third);
        assert_eq!(method.specialisations.len(), 2);
    }

    #[test]
    fn substitute_replaces_parameter_leaves() {
        let mut map = FxHashMap::default();
        map.insert("T".to_string(), Ty::Integer(64));
        let ty = Ty::UnsafePointer(Box::new(Ty::Parameter("T".into())));
        assert_eq!(
            ty.substitute(&map),
            Ty::UnsafePointer(Box::new(Ty::Integer(64)))
        );
    }

    #[test]
    fn record_field_index_by_name_and_position() {
        let record = RecordTy {
            name: "Point".into(),
            field_names: vec!["x".into(), "y".into()],
            field_types: vec![Ty::Integer(64), Ty::Integer(64)],
        };
        assert_eq!(record.field_index("x"), Some(0));
        assert_eq!(record.field_index("1"), Some(1));
        assert_eq!(record.field_index("z"), None);
        assert_eq!(record.field_index("7"), None);
    }
}
