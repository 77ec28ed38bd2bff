//! Parenthesized tree dump of the AST.
//!
//! Produces an indented s-expression per node, one line per terminal,
//! opening and closing lines for non-terminals. Used by the driver's
//! `--print-ast` flag and handy when debugging the parser.

use std::fmt::Write;

use crate::ast::{
    DeclName, Expr, ExprKind, Name, ParamName, SourceFile, TypeName, TypeShape,
};

/// Render a source file (imports included) as an indented tree.
pub fn print_source_file(file: &SourceFile) -> String {
    let mut printer = PrettyPrinter::default();
    printer.source_file(file);
    printer.out
}

#[derive(Default)]
struct PrettyPrinter {
    out: String,
    indent: usize,
}

impl PrettyPrinter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, label: &str) {
        self.line(&format!("({label}"));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent -= 1;
        self.line(")");
    }

    fn source_file(&mut self, file: &SourceFile) {
        self.open(&format!("SourceFile {}", file.name));
        for import in &file.imports {
            self.source_file(import);
        }
        self.expr(&file.code);
        self.close();
    }

    fn name(&mut self, name: &Name) {
        self.line(&format!("(Name {})", name.value));
    }

    fn type_name(&mut self, type_name: &TypeName) {
        if type_name.parameters.is_empty() {
            self.line(&format!("(TypeName {})", type_name.name.value));
        } else {
            self.open(&format!("TypeName {}", type_name.name.value));
            for parameter in &type_name.parameters {
                self.type_name(parameter);
            }
            self.close();
        }
    }

    fn decl_name(&mut self, decl_name: &DeclName) {
        if decl_name.parameters.is_empty() {
            self.line(&format!("(DeclName {})", decl_name.name.value));
        } else {
            self.open(&format!("DeclName {}", decl_name.name.value));
            for parameter in &decl_name.parameters {
                self.name(parameter);
            }
            self.close();
        }
    }

    fn param_name(&mut self, name: &ParamName) {
        if name.parameters.is_empty() {
            self.line(&format!("(Name {})", name.value()));
        } else {
            self.open(&format!("Name {}", name.value()));
            for parameter in &name.parameters {
                self.type_name(parameter);
            }
            self.close();
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Int(value) => self.line(&format!("(Int {value})")),
            ExprKind::Float(value) => self.line(&format!("(Float {value})")),
            ExprKind::Complex(value) => self.line(&format!("(Complex {value})")),
            ExprKind::Str(value) => self.line(&format!("(String {value:?})")),
            ExprKind::Name(name) => self.param_name(name),

            ExprKind::List(elements) => {
                self.open("List");
                for element in elements {
                    self.expr(element);
                }
                self.close();
            }
            ExprKind::Tuple(elements) => {
                self.open("Tuple");
                for element in elements {
                    self.expr(element);
                }
                self.close();
            }
            ExprKind::Dictionary { keys, values } => {
                self.open("Dictionary");
                for (key, value) in keys.iter().zip(values) {
                    self.expr(key);
                    self.expr(value);
                }
                self.close();
            }

            ExprKind::Selector { operand, field } => {
                self.open("Selector");
                self.expr(operand);
                self.param_name(field);
                self.close();
            }
            ExprKind::Call(call) => {
                self.open("Call");
                self.expr(&call.operand);
                for argument in &call.positional {
                    self.expr(argument);
                }
                for (name, argument) in &call.keyword {
                    self.open(&format!("Keyword {}", name.value));
                    self.expr(argument);
                    self.close();
                }
                self.close();
            }
            ExprKind::CCall(ccall) => {
                self.open(&format!("CCall {}", ccall.name.value));
                for parameter in &ccall.parameter_types {
                    self.type_name(parameter);
                }
                self.type_name(&ccall.return_type);
                for argument in &ccall.arguments {
                    self.expr(argument);
                }
                self.close();
            }
            ExprKind::Cast { operand, target } => {
                self.open("Cast");
                self.expr(operand);
                self.type_name(target);
                self.close();
            }
            ExprKind::Assignment { target, value } => {
                self.open("Assignment");
                self.param_name(target);
                self.expr(value);
                self.close();
            }

            ExprKind::While { condition, body } => {
                self.open("While");
                self.expr(condition);
                self.expr(body);
                self.close();
            }
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => {
                self.open("If");
                self.expr(condition);
                self.expr(true_case);
                if let Some(false_case) = false_case {
                    self.expr(false_case);
                }
                self.close();
            }
            ExprKind::Return(value) => {
                self.open("Return");
                self.expr(value);
                self.close();
            }
            ExprKind::Spawn(call) => {
                self.open("Spawn");
                self.expr(call);
                self.close();
            }
            ExprKind::Case {
                condition,
                assignment,
                body,
            } => {
                self.open("Case");
                self.expr(condition);
                if let Some(assignment) = assignment {
                    self.expr(assignment);
                }
                self.expr(body);
                self.close();
            }
            ExprKind::Switch {
                subject,
                cases,
                default_case,
            } => {
                self.open("Switch");
                self.expr(subject);
                for case in cases {
                    self.expr(case);
                }
                if let Some(default_case) = default_case {
                    self.expr(default_case);
                }
                self.close();
            }

            ExprKind::Let {
                declaration,
                value,
                body,
            } => {
                let mut label = String::from("Let");
                if declaration.mutable {
                    label.push_str(" mutable");
                }
                if declaration.builtin {
                    label.push_str(" builtin");
                }
                self.open(&label);
                self.decl_name(&declaration.name);
                if let Some(given_type) = &declaration.given_type {
                    self.type_name(given_type);
                }
                if let Some(value) = value {
                    self.expr(value);
                }
                if let Some(body) = body {
                    self.expr(body);
                }
                self.close();
            }
            ExprKind::Def(holder) => {
                let def = &holder.decl;
                let mut label = String::from("Def");
                if def.builtin {
                    label.push_str(" builtin");
                }
                self.open(&label);
                self.decl_name(&def.name);
                for parameter in &def.parameters {
                    let mut text = String::from("(Parameter ");
                    if parameter.inout {
                        text.push_str("inout ");
                    }
                    let _ = write!(text, "{}", parameter.name.value);
                    if let Some(given_type) = &parameter.given_type {
                        let _ = write!(text, " as {}", given_type.name.value);
                    }
                    text.push(')');
                    self.line(&text);
                }
                if let Some(return_type) = &def.given_return_type {
                    self.type_name(return_type);
                }
                if let Some(body) = &def.body {
                    self.expr(body);
                }
                if !holder.specialised.is_empty() {
                    self.open("Specialised");
                    for specialised in &holder.specialised {
                        self.line(&format!(
                            "(Specialisation {})",
                            specialised.specialisation_index
                        ));
                    }
                    self.close();
                }
                self.close();
            }
            ExprKind::TypeDef(holder) => {
                let decl = &holder.decl;
                self.open("Type");
                self.decl_name(&decl.name);
                match &decl.shape {
                    TypeShape::Builtin => self.line("(Builtin)"),
                    TypeShape::Alias(target) => {
                        self.open("Alias");
                        self.type_name(target);
                        self.close();
                    }
                    TypeShape::Record {
                        field_names,
                        field_types,
                    } => {
                        for (name, ty) in field_names.iter().zip(field_types) {
                            self.open(&format!("Field {}", name.value));
                            self.type_name(ty);
                            self.close();
                        }
                    }
                }
                self.close();
            }
            ExprKind::Module { name, body } => {
                self.open(&format!("Module {}", name.value));
                self.expr(body);
                self.close();
            }
            ExprKind::Import { path } => self.line(&format!("(Import {path:?})")),

            ExprKind::Block(statements) => {
                self.open("Block");
                for statement in statements {
                    self.expr(statement);
                }
                self.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use acorn_common::diagnostics::Reporter;

    use super::*;
    use crate::parse_source;

    fn print(source: &str) -> String {
        let mut reporter = Reporter::new();
        let outcome = parse_source("test.acorn", source, &mut reporter).expect("parse");
        print_source_file(&outcome.file)
    }

    #[test]
    fn terminal_nodes_print_on_one_line() {
        let printed = print("let x = 42\n");
        assert!(printed.contains("(Int 42)"));
        assert!(printed.contains("(DeclName x)"));
    }

    #[test]
    fn blocks_nest_with_indentation() {
        let printed = print("def f()\n    1\nend\n");
        assert!(printed.contains("(Def"));
        assert!(printed.contains("  (Block"));
        assert!(printed.contains("(Int 1)"));
    }

    #[test]
    fn operators_print_as_calls() {
        let printed = print("1 + 2\n");
        assert!(printed.contains("(Call"));
        assert!(printed.contains("(Name +)"));
    }

    #[test]
    fn records_print_their_fields() {
        let printed = print("type Point\n    x as Integer64\n    y as Integer64\nend\n");
        assert!(printed.contains("(Field x"));
        assert!(printed.contains("(TypeName Integer64)"));
    }

    #[test]
    fn mutable_and_inout_markers_survive() {
        let printed = print("let mutable c = 0\ndef f(inout x as Integer64) as Integer64\n    x\nend\n");
        assert!(printed.contains("(Let mutable"));
        assert!(printed.contains("(Parameter inout x as Integer64)"));
    }
}
