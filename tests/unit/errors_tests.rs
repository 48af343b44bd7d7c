/*!
 * Tests for error types and conversions
 */

use ytlearn::errors::{AdminError, AnalysisError, ProviderError, StoreError};

/// Test that provider errors render their details
#[test]
fn test_providerError_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Quota exceeded".to_string(),
    };

    assert_eq!(error.to_string(), "API responded with error: 429 - Quota exceeded");
}

/// Test that validation and not-found messages pass through unchanged
#[test]
fn test_adminError_validation_shouldDisplayMessageOnly() {
    assert_eq!(AdminError::validation("Video ID is required").to_string(), "Video ID is required");
    assert_eq!(AdminError::not_found("Video not found").to_string(), "Video not found");
}

/// Test that nested errors convert into AdminError
#[test]
fn test_adminError_fromNestedErrors_shouldWrap() {
    let from_analysis: AdminError = AnalysisError::EmptyTranscript.into();
    assert!(matches!(from_analysis, AdminError::Analysis(AnalysisError::EmptyTranscript)));

    let from_store: AdminError = StoreError::InvalidQuery("bad field".to_string()).into();
    assert!(from_store.to_string().contains("bad field"));

    let from_io: AdminError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(from_io, AdminError::File(_)));
}

/// Test that serde errors become store serialization errors
#[test]
fn test_storeError_fromSerdeError_shouldBeSerialization() {
    let serde_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: StoreError = serde_error.into();

    assert!(matches!(error, StoreError::Serialization(_)));
}
