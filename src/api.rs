use crate::error::IdlError;
use crate::model::{IdlModel, NamespaceTypes};
use crate::resolver::Resolver;
use crate::serialization;
use crate::validator;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// The result of a successful analysis of an IDL file.
/// It holds the merged, validated model and provides the serialized forms
/// handed to generators and to the introspection endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub model: IdlModel,
}

impl Serialize for AnalysisResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.model.serialize(serializer)
    }
}

impl AnalysisResult {
    /// Serializes the model into a generic JSON value.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serialization::to_value(&self.model)
    }

    /// Serializes the model into the pretty-printed JSON introspection document.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serialization::to_json(&self.model)
    }

    /// Serializes the model into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serialization::to_yaml(&self.model)
    }

    /// The model's declarations grouped by namespace.
    #[must_use]
    pub fn namespaces(&self) -> BTreeMap<String, NamespaceTypes<'_>> {
        self.model.namespaces()
    }
}

/// Parses `source`, the contents of `file_name`, and merges everything it
/// imports into one model. The model is not validated.
///
/// Relative import paths resolve against the directory of `file_name`, which
/// itself resolves against the current working directory.
///
/// # Errors
///
/// Returns an `IdlError` on the first syntax or import error.
pub fn parse_idl(file_name: &str, source: &str) -> Result<IdlModel, IdlError> {
    Resolver::new().resolve(file_name, source)
}

/// Reads and parses the file at `path`, like [`parse_idl`].
///
/// # Errors
///
/// Returns an `IdlError` if the file cannot be read, or on the first syntax
/// or import error.
pub fn parse_idl_file(path: impl AsRef<Path>) -> Result<IdlModel, IdlError> {
    Resolver::new().resolve_path(path.as_ref())
}

/// Validates a merged model, reporting every problem found.
///
/// # Errors
///
/// Returns `IdlError::Validation` holding all validation errors.
pub fn validate_idl(model: &IdlModel) -> Result<(), IdlError> {
    validator::validate(model).map_err(IdlError::from)
}

/// Analyzes an IDL source string: parsing, import resolution, namespace
/// merging and validation.
///
/// This is the primary entry point. It returns an `AnalysisResult` on
/// success, which contains the validated model.
///
/// # Arguments
///
/// * `source` - The IDL source code as a string.
/// * `file_name` - The name of the file being analyzed (used for error reporting
///   and to locate relative imports).
///
/// # Errors
///
/// Returns an `IdlError` if parsing, resolution, or validation fails.
pub fn analyze(source: &str, file_name: &str) -> Result<AnalysisResult, IdlError> {
    let model = parse_idl(file_name, source)?;
    validate_idl(&model)?;
    Ok(AnalysisResult { model })
}

/// Reads the file at `path` and analyzes it, like [`analyze`].
///
/// # Errors
///
/// Returns an `IdlError` if reading, parsing, resolution, or validation fails.
pub fn analyze_file(path: impl AsRef<Path>) -> Result<AnalysisResult, IdlError> {
    let model = parse_idl_file(path)?;
    validate_idl(&model)?;
    Ok(AnalysisResult { model })
}

#[cfg(test)]
mod tests {
    use crate::analyze;
    use crate::error::IdlError;

    #[test]
    fn test_simple_parse_to_json() {
        let source = r"
namespace app

// A registered user.
struct User {
    id string
    tags []string [optional]
}

enum Role {
    admin
}
";

        let expected_json = serde_json::json!({
            "rootNamespace": "app",
            "interfaces": [],
            "structs": [{
                "name": "User",
                "namespace": "app",
                "extends": "",
                "comment": "A registered user.",
                "pos": { "file": "test.pulse", "line": 5, "column": 1, "offset": 38 },
                "fields": [
                    {
                        "name": "id",
                        "type": { "builtIn": "string" },
                        "optional": false,
                        "comment": "",
                        "pos": { "file": "test.pulse", "line": 6, "column": 5, "offset": 56 }
                    },
                    {
                        "name": "tags",
                        "type": { "array": { "builtIn": "string" } },
                        "optional": true,
                        "comment": "",
                        "pos": { "file": "test.pulse", "line": 7, "column": 5, "offset": 70 }
                    }
                ]
            }],
            "enums": [{
                "name": "Role",
                "namespace": "app",
                "comment": "",
                "pos": { "file": "test.pulse", "line": 10, "column": 1, "offset": 98 },
                "values": [{
                    "name": "admin",
                    "comment": "",
                    "pos": { "file": "test.pulse", "line": 11, "column": 5, "offset": 114 }
                }]
            }]
        });

        let analysis_result = analyze(source, "test.pulse").unwrap();
        let result = analysis_result.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json, expected_json);
    }

    #[test]
    fn test_analyze_groups_namespaces() {
        let source = "namespace app\nstruct A { id int }\ninterface S { get() A }";

        let analysis_result = analyze(source, "test.pulse").unwrap();
        let groups = analysis_result.namespaces();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups["app"].structs.len(), 1);
        assert_eq!(groups["app"].interfaces.len(), 1);
    }

    #[test]
    fn test_simple_parse_to_yaml() {
        let source = "namespace app\nenum Role { admin }";

        let analysis_result = analyze(source, "test.pulse").unwrap();
        let result = analysis_result.to_yaml().unwrap();

        assert!(result.starts_with("rootNamespace: app\ninterfaces: []\nstructs: []\nenums:\n"));
        assert!(result.contains("- name: admin\n"));
    }

    #[test]
    fn test_analyze_reports_validation_errors() {
        let err = analyze("struct X { y UnknownY }", "test.pulse").unwrap_err();
        let records = err.records();
        assert!(matches!(err, IdlError::Validation(_)));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].message, "unknown type: UnknownY");
        assert_eq!((records[1].line, records[1].column), (1, 14));
    }
}
