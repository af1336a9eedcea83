// API error path tests
// These test error handling, conversions, and edge cases in the API layer

use pulse_idl::error::{ValidationError, ValidationErrors};
use pulse_idl::{analyze, parse_idl, parse_idl_file, validate_idl, IdlError};

#[test]
fn test_api_analyze_parse_error() {
    let source = "namespace app\nstruct {";
    let result = analyze(source, "test.pulse");
    assert!(result.is_err());
    if let Err(IdlError::Syntax(_)) = result {
        // Success
    } else {
        panic!("Expected syntax error");
    }
}

#[test]
fn test_api_analyze_import_error() {
    let source = "namespace app\nimport \"definitely/not/here.pulse\"\n";
    let result = analyze(source, "/nonexistent-root/test.pulse");
    assert!(result.is_err());
    if let Err(IdlError::Import(_)) = result {
        // Success
    } else {
        panic!("Expected import error");
    }
}

#[test]
fn test_api_analyze_validation_error() {
    let source = "namespace app\nstruct S { t T }";
    let result = analyze(source, "test.pulse");
    if let Err(IdlError::Validation(errs)) = result {
        assert_eq!(errs.len(), 1);
    } else {
        panic!("Expected validation error");
    }
}

#[test]
fn test_api_relative_path_handling() {
    let source = "namespace app\nstruct S { v int }";
    let result = analyze(source, "relative/path/test.pulse");
    // Should succeed without touching the filesystem
    assert!(result.is_ok());
    assert_eq!(result.unwrap().model.structs[0].pos.file, "relative/path/test.pulse");
}

#[test]
fn test_api_absolute_path_handling() {
    let source = "";
    let result = analyze(source, "/absolute/path/test.pulse");
    assert!(result.is_ok());
}

#[test]
fn test_api_parse_without_validation() {
    // Parsing alone accepts a model that validation rejects.
    let model = parse_idl("test.pulse", "struct S { t Missing }").unwrap();
    assert_eq!(model.structs.len(), 1);

    let err = validate_idl(&model).unwrap_err();
    assert_eq!(err.records().len(), 2);
}

#[test]
fn test_api_parse_missing_file() {
    let err = parse_idl_file("/nonexistent-root/missing.pulse").unwrap_err();
    let records = err.records();
    assert_eq!(records[0].file, "/nonexistent-root/missing.pulse");
    assert_eq!((records[0].line, records[0].column), (1, 1));
}

#[test]
fn test_validation_summary_message() {
    let err = analyze("struct S { a A b B }", "test.pulse").unwrap_err();
    assert_eq!(
        err.to_string(),
        "3 validation errors (first: test.pulse:1:1: IDL file must declare a namespace at the top level)"
    );
}

#[test]
fn test_single_validation_error_message() {
    let err = analyze("namespace app\nstruct S { a A }", "test.pulse").unwrap_err();
    assert_eq!(err.to_string(), "test.pulse:2:14: unknown type: A");
}

#[test]
fn test_error_records_keep_order_and_positions() {
    let err = analyze("namespace app\nstruct S {\n  a A\n  b B\n}", "test.pulse").unwrap_err();
    let records = err.records();
    let lines: Vec<usize> = records.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(records.iter().all(|r| r.file == "test.pulse" && r.column == 5));
}

#[test]
fn test_validation_errors_collection() {
    let mut errors = ValidationErrors::default();
    assert!(!errors.has_errors());
    errors.add(ValidationError::UnknownType {
        name: "T".to_string(),
        pos: pulse_idl::model::Position::new("x.pulse", 2, 3, 10),
    });
    assert!(errors.has_errors());
    assert_eq!(errors.len(), 1);

    let err = IdlError::from(errors);
    let records = err.records();
    assert_eq!(records[0].message, "unknown type: T");
    assert_eq!((records[0].line, records[0].column), (2, 3));
}

#[test]
fn test_errors_render_with_miette() {
    let err = analyze("namespace app\nstruct S { id strin }", "test.pulse").unwrap_err();
    let report = miette::Report::new(err);
    let rendered = format!("{report:?}");
    assert!(rendered.contains("unknown type: strin"));
}
