//! Acorn parser: recursive descent over the indentation-aware token stream.
//!
//! The parser produces an owned [`ast::SourceFile`] whose imports have been
//! loaded transitively, depth-first, before the importer's own top level.
//! Syntax errors go to the shared [`Reporter`]; any error makes the parse
//! entry points return `None`, and the driver abandons the translation unit.

pub mod ast;
mod parser;
pub mod prettyprint;

use std::path::{Path, PathBuf};

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_lexer::read_source;
use rustc_hash::FxHashMap;

use ast::{NodeIdGen, SourceFile};
use parser::Parser;

/// Everything the later passes need from a successful parse.
pub struct ParseOutcome {
    pub file: SourceFile,
    /// The node id allocator, continued by the generic reifier when cloning.
    pub ids: NodeIdGen,
    /// Source text per filename, for diagnostic rendering.
    pub sources: FxHashMap<String, String>,
}

/// Parse a file from disk, loading its imports transitively.
pub fn parse_file(path: &Path, reporter: &mut Reporter) -> Option<ParseOutcome> {
    let mut loader = Loader::new(reporter);
    let file = loader.load(path)?;
    Some(ParseOutcome {
        file,
        ids: loader.ids,
        sources: loader.sources,
    })
}

/// Parse source text directly. Imports resolve relative to `filename`'s
/// directory.
pub fn parse_source(filename: &str, source: &str, reporter: &mut Reporter) -> Option<ParseOutcome> {
    let mut loader = Loader::new(reporter);
    let file = loader.parse(Path::new(filename), source)?;
    Some(ParseOutcome {
        file,
        ids: loader.ids,
        sources: loader.sources,
    })
}

/// Drives parsing across imports, sharing one id allocator and detecting
/// import cycles with an in-progress set.
struct Loader<'r> {
    reporter: &'r mut Reporter,
    ids: NodeIdGen,
    in_progress: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
    sources: FxHashMap<String, String>,
}

impl<'r> Loader<'r> {
    fn new(reporter: &'r mut Reporter) -> Self {
        Self {
            reporter,
            ids: NodeIdGen::new(),
            in_progress: Vec::new(),
            loaded: Vec::new(),
            sources: FxHashMap::default(),
        }
    }

    fn load(&mut self, path: &Path) -> Option<SourceFile> {
        let source = match read_source(path) {
            Ok(source) => source,
            Err(diagnostic) => {
                self.reporter.report(diagnostic);
                return None;
            }
        };
        self.parse(path, &source)
    }

    fn parse(&mut self, path: &Path, source: &str) -> Option<SourceFile> {
        let filename = path.display().to_string();
        self.sources.insert(filename.clone(), source.to_string());
        self.in_progress.push(path.to_path_buf());

        let mut parser = Parser::new(&filename, source, &mut self.ids, self.reporter);
        let parsed = parser.parse();
        parser.flush_lexer_errors();
        drop(parser);

        let result = parsed.and_then(|(imports, code)| {
            let mut import_files = Vec::new();
            for (import_path, import_token) in imports {
                let target = match path.parent() {
                    Some(dir) if !dir.as_os_str().is_empty() => {
                        dir.join(format!("{import_path}.acorn"))
                    }
                    _ => PathBuf::from(format!("{import_path}.acorn")),
                };

                if self.in_progress.contains(&target) || self.loaded.contains(&target) {
                    self.reporter.report(Diagnostic::at_token(
                        DiagnosticKind::Syntax,
                        format!("\"{import_path}\" is already imported."),
                        &import_token,
                    ));
                    continue;
                }

                if let Some(file) = self.load(&target) {
                    import_files.push(file);
                }
            }

            let token = code.token.clone();
            Some(SourceFile {
                id: self.ids.fresh(),
                token,
                name: filename,
                imports: import_files,
                code,
            })
        });

        let just_parsed = self.in_progress.pop().expect("in-progress stack is balanced");
        self.loaded.push(just_parsed);
        result
    }
}
