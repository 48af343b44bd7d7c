/*!
 * Client implementations for the third-party APIs.
 *
 * This module contains:
 * - YouTube: video metadata lookup (YouTube Data API v3)
 * - Gemini: generative-language API used for transcript analysis
 * - Mock: in-process stand-ins for tests and offline use
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub use youtube::VideoDetails;

/// Common trait for request/response style generation APIs
///
/// This trait defines the interface that generation clients follow,
/// allowing them to be swapped behind the analysis service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Source of video metadata, keyed by the 11-character video id
#[async_trait]
pub trait VideoMetadataSource: Send + Sync {
    /// Look up a video; `Ok(None)` when the id is unknown
    async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ProviderError>;
}

pub mod youtube;
pub mod gemini;
pub mod mock;
