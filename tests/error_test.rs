//! Tests for error types

use sintonia_db::Error;

#[test]
fn test_length_mismatch_error() {
    let error = Error::LengthMismatch {
        values: 5,
        descriptors: 3,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("length mismatch"));
    assert!(error_str.contains("5 values"));
    assert!(error_str.contains("3 descriptors"));
}

#[test]
fn test_mixed_stimulus_types_error() {
    let error = Error::MixedStimulusTypes {
        first: "DriftingGrating".to_string(),
        other: "NaturalImage".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("mixed stimulus types"));
    assert!(error_str.contains("DriftingGrating"));
    assert!(error_str.contains("NaturalImage"));
    assert!(error_str.contains("allow_mixed_stimulus_types"));
}

#[test]
fn test_missing_parameter_error() {
    let error = Error::MissingParameter {
        parameter: "temporal_frequency".to_string(),
        descriptor: "Grating(orientation=0)".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("no parameter 'temporal_frequency'"));
    assert!(error_str.contains("Grating(orientation=0)"));
}

#[test]
fn test_shape_mismatch_error() {
    let error = Error::ShapeMismatch {
        expected: 10,
        found: 7,
        context: "per-neuron values across curve points".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("shape mismatch"));
    assert!(error_str.contains("expected 10"));
    assert!(error_str.contains("found 7"));
    assert!(error_str.contains("curve points"));
}

#[test]
fn test_ambiguous_record_error() {
    let error = Error::AmbiguousRecord {
        found: 0,
        context: "sheet='V1', value_name='Firing rate'".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("exactly one record"));
    assert!(error_str.contains("found 0"));
    assert!(error_str.contains("sheet='V1'"));
}

#[test]
fn test_mismatched_parameter_sets_error() {
    let error = Error::MismatchedParameterSets {
        expected: "contrast, orientation".to_string(),
        found: "contrast, size".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("fixed parameter set"));
    assert!(error_str.contains("contrast, orientation"));
    assert!(error_str.contains("contrast, size"));
}

#[test]
fn test_duplicate_combination_error() {
    let error = Error::DuplicateCombination {
        combination: "contrast=0.5, orientation=0".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("duplicate sweep combination"));
    assert!(error_str.contains("contrast=0.5"));
}

#[test]
fn test_incomplete_sweep_error() {
    let error = Error::IncompleteSweep {
        loaded: 11,
        unloadable: 0,
        expected: 12,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("incomplete sweep"));
    assert!(error_str.contains("11 loaded"));
    assert!(error_str.contains("12 grid cells"));
}

#[test]
fn test_precondition_error() {
    let error = Error::Precondition("parameter 'phase' is not numeric".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("precondition failed"));
    assert!(error_str.contains("'phase' is not numeric"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_serde_error_conversion() {
    let serde_error = serde_json::from_str::<sintonia_db::RecordStore>("not json").unwrap_err();
    let error: Error = serde_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("serialization error"));
}

#[test]
fn test_error_debug() {
    let error = Error::Precondition("x".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Precondition"));
}

#[test]
fn test_result_type_alias() {
    // Test that Result<T> can be used
    #[allow(clippy::unnecessary_wraps)]
    fn returns_result() -> sintonia_db::Result<i32> {
        Ok(42)
    }

    let result = returns_result();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> sintonia_db::Result<i32> {
        Err(Error::Precondition("test error".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
