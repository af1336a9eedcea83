use crate::model::Position;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum IdlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationErrors),
}

/// One entry of the flat error list handed to the command-line layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ErrorRecord {
    fn new(pos: &Position, message: String) -> Self {
        // Syntax and import errors lead their display text with the position.
        let message = match message.strip_prefix(&format!("{pos}: ")) {
            Some(rest) => rest.to_string(),
            None => message,
        };
        Self {
            file: pos.file.clone(),
            line: pos.line,
            column: pos.column,
            message,
        }
    }
}

impl IdlError {
    /// Flattens this error into `(file, line, column, message)` records.
    pub fn records(&self) -> Vec<ErrorRecord> {
        match self {
            IdlError::Syntax(err) => vec![ErrorRecord::new(err.position(), err.to_string())],
            IdlError::Import(err) => vec![ErrorRecord::new(err.position(), err.to_string())],
            IdlError::Validation(errs) => errs
                .errors
                .iter()
                .map(|err| ErrorRecord::new(err.position(), err.to_string()))
                .collect(),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SyntaxError {
    #[error("{pos}: invalid token {text:?}")]
    #[diagnostic(
        code(syntax::invalid_token),
        help("Identifiers must start with a letter. Only `//` comments, `[optional]`, quoted import paths and single-character punctuation are recognized.")
    )]
    InvalidToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("this does not start any token")]
        span: SourceSpan,
        text: String,
        pos: Position,
    },

    #[error("{pos}: unexpected {found}, expected {expected}")]
    #[diagnostic(
        code(syntax::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected {expected}, but found this")]
        span: SourceSpan,
        found: String,
        expected: String,
        pos: Position,
    },

    #[error("{pos}: unexpected end of file, expected {expected}")]
    #[diagnostic(
        code(syntax::unexpected_eof),
        help("The file ended unexpectedly. Check for a missing closing brace or type.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("file ended here")]
        span: SourceSpan,
        expected: String,
        pos: Position,
    },
}

impl SyntaxError {
    pub fn position(&self) -> &Position {
        match self {
            SyntaxError::InvalidToken { pos, .. }
            | SyntaxError::UnexpectedToken { pos, .. }
            | SyntaxError::UnexpectedEof { pos, .. } => pos,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ImportError {
    #[error("{pos}: failed to read import file {resolved} (resolved from {path}): {reason}")]
    #[diagnostic(
        code(import::module_not_found),
        help("Import paths are resolved relative to the directory of the importing file.")
    )]
    ModuleNotFound {
        path: String,
        resolved: String,
        reason: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("imported here")]
        span: SourceSpan,
        pos: Position,
    },

    #[error("{pos}: import cycle detected: {cycle}")]
    #[diagnostic(
        code(import::circular_import),
        help("Break the cycle by moving the shared declarations into a file that both can import.")
    )]
    CircularImport {
        cycle: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("this import closes the cycle")]
        span: SourceSpan,
        pos: Position,
    },

    #[error("{pos}: duplicate namespace {namespace}: already used in {first}, also used in {second}")]
    #[diagnostic(
        code(import::duplicate_namespace),
        help("Each namespace may be declared by exactly one file in an import graph.")
    )]
    DuplicateNamespace {
        namespace: String,
        first: String,
        second: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("imported here")]
        span: SourceSpan,
        pos: Position,
    },

    #[error("{pos}: multiple namespace declarations in file {file}")]
    #[diagnostic(
        code(import::multiple_namespaces),
        help("A file declares at most one namespace.")
    )]
    MultipleNamespaces {
        file: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("second namespace declaration")]
        span: SourceSpan,
        pos: Position,
    },
}

impl ImportError {
    pub fn position(&self) -> &Position {
        match self {
            ImportError::ModuleNotFound { pos, .. }
            | ImportError::CircularImport { pos, .. }
            | ImportError::DuplicateNamespace { pos, .. }
            | ImportError::MultipleNamespaces { pos, .. } => pos,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ValidationError {
    #[error("IDL file must declare a namespace at the top level")]
    #[diagnostic(code(validation::missing_namespace), help("Add `namespace <name>` to the file."))]
    MissingNamespace { pos: Position },

    #[error("invalid identifier: {name} (must start with a letter, followed by letters, numbers, or underscores)")]
    #[diagnostic(code(validation::invalid_identifier))]
    InvalidIdentifier { name: String, pos: Position },

    #[error("duplicate type name: {name} (previously defined as {previous_kind} at {}:{})", .previous.line, .previous.column)]
    #[diagnostic(code(validation::duplicate_type_name))]
    DuplicateTypeName {
        name: String,
        previous_kind: &'static str,
        previous: Position,
        pos: Position,
    },

    #[error("unknown type: {name}")]
    #[diagnostic(code(validation::unknown_type))]
    UnknownType { name: String, pos: Position },

    #[error("struct {name} extends unknown type {extends}")]
    #[diagnostic(code(validation::extends_unknown_type))]
    ExtendsUnknownType {
        name: String,
        extends: String,
        pos: Position,
    },

    #[error("circular type reference detected: {cycle}")]
    #[diagnostic(
        code(validation::circular_reference),
        help("Mark one of the fields on the cycle `[optional]` to break it.")
    )]
    CircularReference { cycle: String, pos: Position },
}

impl ValidationError {
    pub fn position(&self) -> &Position {
        match self {
            ValidationError::MissingNamespace { pos }
            | ValidationError::InvalidIdentifier { pos, .. }
            | ValidationError::DuplicateTypeName { pos, .. }
            | ValidationError::UnknownType { pos, .. }
            | ValidationError::ExtendsUnknownType { pos, .. }
            | ValidationError::CircularReference { pos, .. } => pos,
        }
    }
}

/// Every semantic problem found by one validation run.
#[derive(Error, Debug, Diagnostic, Clone, Default, PartialEq)]
#[error("{}", summary(.errors))]
#[diagnostic(code(validation::failed))]
pub struct ValidationErrors {
    #[related]
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn add(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

fn summary(errors: &[ValidationError]) -> String {
    match errors {
        [] => "validation errors".to_string(),
        [only] => format!("{}: {only}", only.position()),
        [first, ..] => format!(
            "{} validation errors (first: {}: {first})",
            errors.len(),
            first.position()
        ),
    }
}
