use crate::ast::ImportDirective;
use crate::error::{IdlError, ImportError};
use crate::lexer::{Token, TokenType};
use crate::model::{IdlModel, Position};
use crate::namespace;
use crate::parser::Parser;
use log::{debug, trace};
use miette::NamedSource;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const IMPORT_KEYWORD: &str = "import";

/// Lifts `import "<path>"` directives out of a trivia-free token stream.
///
/// A directive is recognised at top level (outside any braces) at a statement
/// boundary: the start of the file, after a closing brace, after a namespace
/// declaration, or after another directive. Repeated paths are kept once, at
/// their first occurrence. Returns the directives and the remaining tokens.
pub fn extract_imports(tokens: Vec<Token>, file: &str) -> (Vec<ImportDirective>, Vec<Token>) {
    let mut imports: Vec<ImportDirective> = Vec::new();
    let mut kept = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    let mut at_statement = true;
    let mut after_namespace_keyword = false;
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let is_import_keyword =
            matches!(&token.ttype, TokenType::Identifier(word) if word == IMPORT_KEYWORD);
        if depth == 0 && at_statement && is_import_keyword {
            if let Some(Token {
                ttype: TokenType::StringLiteral(path),
                pos_end,
                ..
            }) = iter.peek()
            {
                let path = path.clone();
                let pos_end = *pos_end;
                iter.next();
                if imports.iter().any(|i| i.path == path) {
                    trace!("{file}: duplicate import of {path} ignored");
                } else {
                    imports.push(ImportDirective {
                        path,
                        pos: token.position(file),
                        pos_start: token.pos_start,
                        pos_end,
                    });
                }
                continue;
            }
        }

        at_statement = match token.ttype {
            TokenType::LBrace => {
                depth += 1;
                false
            }
            TokenType::RBrace => {
                depth = depth.saturating_sub(1);
                depth == 0
            }
            TokenType::Identifier(_) => after_namespace_keyword,
            _ => false,
        };
        after_namespace_keyword = token.ttype == TokenType::Namespace;
        kept.push(token);
    }

    (imports, kept)
}

/// The chain of files currently being resolved, outermost first.
///
/// Membership is path-scoped: a file is pushed before its imports are followed
/// and popped once they return, so revisiting a file that is still on the
/// chain is an import cycle.
#[derive(Debug, Default)]
pub struct ImportChain {
    files: Vec<PathBuf>,
}

impl ImportChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }

    fn push(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    fn pop(&mut self) {
        self.files.pop();
    }

    /// Renders the cycle closed by importing `path` again, as `a -> b -> a`.
    fn describe_cycle(&self, path: &Path) -> String {
        let start = self.files.iter().position(|p| p == path).unwrap_or(0);
        let mut parts: Vec<String> = self.files[start..]
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        parts.push(path.display().to_string());
        parts.join(" -> ")
    }
}

/// Which file defines each namespace, and which files are already merged,
/// within one top-level resolution.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    owners: HashMap<String, PathBuf>,
    included: HashSet<PathBuf>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self, namespace: &str) -> Option<&Path> {
        self.owners.get(namespace).map(PathBuf::as_path)
    }

    /// Records `file` as the definition of `namespace`. Returns the file that
    /// already claimed it, if that is a different one.
    fn claim(&mut self, namespace: &str, file: &Path) -> Option<PathBuf> {
        match self.owners.get(namespace) {
            Some(existing) if existing != file => Some(existing.clone()),
            Some(_) => None,
            None => {
                self.owners.insert(namespace.to_string(), file.to_path_buf());
                None
            }
        }
    }
}

/// Parses a file and, depth first, every file it imports, merging them into
/// one namespace-qualified model.
///
/// A `Resolver` holds no per-resolution state; the import chain and namespace
/// registry are created by [`Resolver::resolve`] and threaded through the
/// recursion, so one resolver can serve concurrent top-level calls.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: Option<PathBuf>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Resolves relative root file names against the process working directory.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolves relative root file names against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    /// Resolves `source_text`, the contents of `file_name`, and everything it imports.
    pub fn resolve(&self, file_name: &str, source_text: &str) -> Result<IdlModel, IdlError> {
        let path = self.absolute(Path::new(file_name))?;
        let file = SourceContext {
            path: &path,
            display_name: file_name,
            source_text,
        };
        let mut chain = ImportChain::new();
        let mut registry = NamespaceRegistry::new();
        let mut model = self.resolve_file(&file, &mut chain, &mut registry)?;
        model.file = file_name.to_string();
        Ok(model)
    }

    /// Reads `path` and resolves it like [`Resolver::resolve`].
    pub fn resolve_path(&self, path: &Path) -> Result<IdlModel, IdlError> {
        let file_name = path.display().to_string();
        let absolute = self.absolute(path)?;
        let source_text = std::fs::read_to_string(&absolute).map_err(|err| {
            ImportError::ModuleNotFound {
                path: file_name.clone(),
                resolved: absolute.display().to_string(),
                reason: err.to_string(),
                src: NamedSource::new(&file_name, String::new()),
                span: (0, 0).into(),
                pos: Position::start_of(file_name.as_str()),
            }
        })?;
        self.resolve(&file_name, &source_text)
    }

    /// Resolves one file and, depth first, its imports.
    ///
    /// The file's namespace is claimed only after its imports are resolved, so
    /// an import cycle is always reported as a cycle even when the files on it
    /// share a namespace.
    pub fn resolve_file(
        &self,
        file: &SourceContext<'_>,
        chain: &mut ImportChain,
        registry: &mut NamespaceRegistry,
    ) -> Result<IdlModel, IdlError> {
        debug!("resolving {}", file.path.display());
        let mut parser = Parser::new_with_name(file.source_text, file.display_name.to_string())?;
        let source_file = parser.parse_source_file()?;
        let imports = source_file.imports.clone();
        let mut model = source_file.into_model(file.source_text)?;
        registry.included.insert(file.path.to_path_buf());

        chain.push(file.path.to_path_buf());
        let result = self.resolve_imports(file, &imports, &mut model, chain, registry);
        chain.pop();
        result?;

        if !model.root_namespace.is_empty() {
            if let Some(first) = registry.claim(&model.root_namespace, file.path) {
                return Err(ImportError::DuplicateNamespace {
                    namespace: model.root_namespace.clone(),
                    first: first.display().to_string(),
                    second: file.path.display().to_string(),
                    src: file.named_source(),
                    span: (0, 0).into(),
                    pos: Position::start_of(file.display_name),
                }
                .into());
            }
        }

        Ok(model)
    }

    fn resolve_imports(
        &self,
        file: &SourceContext<'_>,
        imports: &[ImportDirective],
        model: &mut IdlModel,
        chain: &mut ImportChain,
        registry: &mut NamespaceRegistry,
    ) -> Result<(), IdlError> {
        let current_dir = file.path.parent().unwrap_or_else(|| Path::new("."));

        for import in imports {
            let imported_path = normalize(&current_dir.join(&import.path));
            let span = (import.pos_start, import.pos_end - import.pos_start);

            if chain.contains(&imported_path) {
                return Err(ImportError::CircularImport {
                    cycle: chain.describe_cycle(&imported_path),
                    src: file.named_source(),
                    span: span.into(),
                    pos: import.pos.clone(),
                }
                .into());
            }

            if registry.included.contains(&imported_path) {
                debug!(
                    "{}: {} is already included, skipping",
                    file.path.display(),
                    imported_path.display()
                );
                continue;
            }

            let imported_source = std::fs::read_to_string(&imported_path).map_err(|err| {
                ImportError::ModuleNotFound {
                    path: import.path.clone(),
                    resolved: imported_path.display().to_string(),
                    reason: err.to_string(),
                    src: file.named_source(),
                    span: span.into(),
                    pos: import.pos.clone(),
                }
            })?;

            debug!("{} imports {}", file.path.display(), imported_path.display());
            let imported_name = imported_path.display().to_string();
            let imported = SourceContext {
                path: &imported_path,
                display_name: &imported_name,
                source_text: &imported_source,
            };
            let sub_model = self
                .resolve_file(&imported, chain, registry)
                .map_err(|err| match err {
                    // Point a namespace clash at the directive that pulled the file in.
                    IdlError::Import(ImportError::DuplicateNamespace {
                        namespace,
                        first,
                        second,
                        ..
                    }) if second == imported_name => ImportError::DuplicateNamespace {
                        namespace,
                        first,
                        second,
                        src: file.named_source(),
                        span: span.into(),
                        pos: import.pos.clone(),
                    }
                    .into(),
                    other => other,
                })?;

            namespace::merge(model, sub_model);
        }

        Ok(())
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf, ImportError> {
        if path.is_absolute() {
            return Ok(normalize(path));
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|err| working_dir_error(path, err))?,
        };
        Ok(normalize(&base.join(path)))
    }
}

/// One file being resolved: its absolute path, the name used in positions
/// and diagnostics, and its text.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    pub path: &'a Path,
    pub display_name: &'a str,
    pub source_text: &'a str,
}

impl SourceContext<'_> {
    fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.display_name, self.source_text.to_string())
    }
}

fn working_dir_error(path: &Path, err: std::io::Error) -> ImportError {
    let file_name = path.display().to_string();
    ImportError::ModuleNotFound {
        path: file_name.clone(),
        resolved: file_name.clone(),
        reason: format!("cannot determine the working directory: {err}"),
        src: NamedSource::new(&file_name, String::new()),
        span: (0, 0).into(),
        pos: Position::start_of(file_name.as_str()),
    }
}

/// Removes `.` and `..` components without touching the filesystem, so the
/// same file reached through different relative paths compares equal.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
