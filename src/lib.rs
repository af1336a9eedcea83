pub mod api;
pub mod ast;
pub mod comments;
pub mod error;
pub mod lexer;
pub mod model;
pub mod namespace;
pub mod parser;
pub mod resolver;
pub mod utils;
pub mod validator;
mod serialization;

pub use api::{analyze, analyze_file, parse_idl, parse_idl_file, validate_idl, AnalysisResult};
pub use error::{ErrorRecord, IdlError};
pub use model::IdlModel;
