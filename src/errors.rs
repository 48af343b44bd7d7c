/*!
 * Error types for the ytlearn application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with the third-party APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A required setting (usually an API key) is missing
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        // Request URLs carry the API key as a query parameter
        let error = error.without_url();
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by the document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection name
        collection: String,
        /// Document identifier
        id: String,
    },

    /// Stored or submitted data is not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A query argument cannot be used (e.g. an unsafe field name)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying database failed
    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        Self::Database(error.to_string())
    }
}

/// Errors that can occur while analyzing a transcript
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The transcript payload was empty
    #[error("Transcript text is required")]
    EmptyTranscript,

    /// The provider answered without any candidate text
    #[error("No analysis content received from the provider")]
    EmptyResponse,

    /// The provider's text was not the expected JSON document
    #[error("Analysis data generated by the model is malformed: {0}")]
    Malformed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AdminError {
    /// Caller supplied missing or invalid input
    #[error("{0}")]
    Validation(String),

    /// The requested entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// No valid admin session
    #[error("Not logged in: {0}")]
    Unauthorized(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from transcript analysis
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error from the document store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AdminError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing entity
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AdminError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
