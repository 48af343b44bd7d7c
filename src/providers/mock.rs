/*!
 * Mock implementations for testing.
 *
 * This module provides stand-ins that simulate different behaviors:
 * - `MockAnalyzer::working()` - Always returns a fixed analysis
 * - `MockAnalyzer::malformed()` - Model output that is not valid JSON
 * - `MockAnalyzer::failing()` - Always fails with an API error
 * - `MockVideoSource` - Serves metadata from an in-memory table
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::analysis::{parse_analysis_text, AnalysisResult, TranscriptAnalyzer};
use crate::errors::{AnalysisError, ProviderError};
use crate::models::{Analysis, SlangExpression};
use crate::providers::{VideoDetails, VideoMetadataSource};

/// Behavior mode for the mock analyzer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `sample_analysis()`
    Working,
    /// Returns text that fails JSON parsing
    Malformed,
    /// Returns no candidate text
    Empty,
    /// Always fails with an API error
    Failing,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock transcript analyzer
#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Transcripts received, shared between clones
    received: Arc<Mutex<Vec<String>>>,
}

impl MockAnalyzer {
    /// Create a new mock analyzer with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Number of `analyze` calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Transcripts passed to `analyze`, in call order
    pub fn received_transcripts(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The analysis returned by `MockBehavior::Working`
    pub fn sample_analysis() -> Analysis {
        Analysis {
            summary: "테스트용 요약입니다.".to_string(),
            keywords: vec!["practice".to_string(), "listening".to_string()],
            slang_expressions: vec![SlangExpression {
                expression: "no cap".to_string(),
                meaning: "진짜로".to_string(),
            }],
            main_questions: vec!["What did you learn?".to_string()],
        }
    }
}

#[async_trait]
impl TranscriptAnalyzer for MockAnalyzer {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, AnalysisError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(transcript.to_string());
        }

        if transcript.trim().is_empty() {
            return Err(AnalysisError::EmptyTranscript);
        }

        match self.behavior {
            MockBehavior::Working => Ok(AnalysisResult {
                analysis: Self::sample_analysis(),
            }),

            MockBehavior::Malformed => parse_analysis_text("```json\n{\"analysis\": {\"summary\": \"cut off"),

            MockBehavior::Empty => Err(AnalysisError::EmptyResponse),

            MockBehavior::Failing => Err(AnalysisError::Provider(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            })),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(AnalysisResult {
                    analysis: Self::sample_analysis(),
                })
            }
        }
    }
}

/// Mock metadata source backed by a map of known videos
#[derive(Debug, Clone, Default)]
pub struct MockVideoSource {
    videos: HashMap<String, VideoDetails>,
    fail: bool,
}

impl MockVideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every lookup fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Register a video with generated metadata
    pub fn with_video(mut self, video_id: &str, title: &str, duration: u64) -> Self {
        self.videos.insert(
            video_id.to_string(),
            VideoDetails {
                video_id: video_id.to_string(),
                title: title.to_string(),
                description: format!("Description of {}", title),
                thumbnail_url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id),
                duration,
                channel_title: "Mock Channel".to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl VideoMetadataSource for MockVideoSource {
    async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ProviderError> {
        if self.fail {
            return Err(ProviderError::ConnectionError("Simulated network failure".to_string()));
        }
        Ok(self.videos.get(video_id).cloned())
    }
}
