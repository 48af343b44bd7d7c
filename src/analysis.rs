/*!
 * Transcript analysis.
 *
 * Sends a normalized transcript to the generative-language API with a JSON
 * response schema and turns the reply into an `Analysis`.
 */

use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app_config::GeminiConfig;
use crate::errors::{AnalysisError, ProviderError};
use crate::models::Analysis;
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::Provider;

/// Instructions sent ahead of the transcript
pub const ANALYSIS_PROMPT: &str = r#"Based on the provided English transcript, generate a structured JSON output. The JSON must contain a single main field: 'analysis'.

**CRITICAL RULE:** All string values within the JSON output MUST have internal double quotes properly escaped with a backslash (e.g., "He said, \"Hi!\""). This is essential for valid JSON.

The 'analysis' field must be an object containing:
- 'summary': A concise summary of the video content in KOREAN (1-2 sentences).
- 'keywords': An array of 5 key English terms that would be useful for a learner.
- 'slang_expressions': An array of objects, where each object has an 'expression' (the English slang/idiom) and a 'meaning' (its explanation in KOREAN).
- 'main_questions': An array of 2 *single, concise, and simple* questions in ENGLISH based on the video's content, designed to encourage speaking practice.

Ensure the entire output is a single, strictly valid JSON object."#;

/// Copyable prompt for producing a registration envelope with an external assistant
const ASSISTANT_PROMPT: &str = r#"Analyze the provided video content and generate a structured JSON output. The JSON must contain two main fields: 'analysis' and 'transcript_text'.

The 'analysis' field must be an object containing:
- 'summary': A very concise summary of the video content (1-2 sentences) in Korean.
- 'keywords': An array of 5 key terms that English learners might not know or find challenging.
- 'slang_expressions': An array of objects, where each object has 'expression' and 'meaning (meaning in Korean)'.
- 'main_questions': An array of 2 main questions based on the video content.

The 'transcript_text' field must contain a detailed transcript of the video, adhering strictly to the following segmentation rules:
1. Each segment must begin with a timestamp in the EXACT format [MM:SS], followed immediately by the text. Example: '[00:05] This is the text at 5 seconds.'
2. Create a new timestamped segment for every change in speaker.
3. If a single person speaks for an extended period, create a new timestamped segment after a natural pause or a shift in topic.
4. Crucially, ensure that no single segment represents more than 20 seconds of video time. Aim for shorter, more frequent segments (ideally every 10-15 seconds) for better readability.
5. Do NOT include any other timestamps or time ranges within the transcript text itself.

Ensure the entire output is a single, strictly valid JSON object."#;

/// Prompt plus an envelope skeleton to fill in
pub fn assistant_prompt_template() -> String {
    let skeleton = json!({
        "analysis": {
            "summary": "여기에 영상 내용 요약 (1-2 문장)을 입력하세요.",
            "keywords": ["키워드1", "키워드2", "키워드3", "키워드4", "키워드5"],
            "slang_expressions": [
                { "expression": "슬랭표현1", "meaning": "의미1" },
                { "expression": "슬랭표현2", "meaning": "의미2" }
            ],
            "main_questions": ["주요 질문1", "주요 질문2"]
        },
        "transcript_text": "[00:00] 영상 스크립트가 타임스탬프와 함께 여기에 들어갑니다.\n[00:15] 새로운 스피커 또는 주제 변경 시 새로운 세그먼트를 시작합니다.\n[00:30] 각 세그먼트는 20초를 넘지 않도록 짧게 유지합니다. (10-15초가 Best)"
    });

    let skeleton = serde_json::to_string_pretty(&skeleton).unwrap_or_default();
    format!("{}\n{}", ASSISTANT_PROMPT, skeleton)
}

/// Response schema with explicit property ordering
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": {
                "type": "OBJECT",
                "properties": {
                    "summary": { "type": "STRING" },
                    "keywords": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "slang_expressions": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "expression": { "type": "STRING" },
                                "meaning": { "type": "STRING" }
                            },
                            "propertyOrdering": ["expression", "meaning"]
                        }
                    },
                    "main_questions": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "propertyOrdering": ["summary", "keywords", "slang_expressions", "main_questions"]
            }
        },
        "propertyOrdering": ["analysis"]
    })
}

/// Parsed analysis reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub analysis: Analysis,
}

/// Remove markdown code fences the model sometimes wraps JSON in
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse model output into an `AnalysisResult`
pub fn parse_analysis_text(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(text);

    serde_json::from_str(&cleaned).map_err(|e| {
        error!("Failed to parse analysis JSON: {}", e);
        error!("Problematic analysis text: {}", text);
        AnalysisError::Malformed(e.to_string())
    })
}

/// Anything that can turn transcript text into an analysis
#[async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, AnalysisError>;
}

/// Analyzer backed by the Gemini API
#[derive(Debug)]
pub struct GeminiAnalyzer {
    client: Gemini,
    temperature: Option<f32>,
}

impl GeminiAnalyzer {
    pub fn new(client: Gemini, temperature: Option<f32>) -> Self {
        Self { client, temperature }
    }

    /// Build from configuration
    pub fn from_config(config: &GeminiConfig) -> Self {
        let client = Gemini::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout_secs,
        );
        Self::new(client, config.temperature)
    }

    /// Request for one transcript
    pub fn build_request(&self, transcript: &str) -> GeminiRequest {
        let request = GeminiRequest::new()
            .add_text_part(ANALYSIS_PROMPT)
            .add_text_part(format!("Transcript: \"\"\"{}\"\"\"", transcript))
            .json_schema(analysis_response_schema());

        match self.temperature {
            Some(temperature) => request.temperature(temperature),
            None => request,
        }
    }

    /// Check that the key and model are accepted
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.client.test_connection().await
    }
}

#[async_trait]
impl TranscriptAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, AnalysisError> {
        if transcript.trim().is_empty() {
            return Err(AnalysisError::EmptyTranscript);
        }

        info!(
            "Analyzing transcript ({} chars) with {}",
            transcript.chars().count(),
            self.client.model()
        );

        let response = self.client.complete(self.build_request(transcript)).await?;
        let text = Gemini::extract_text(&response);
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        debug!("Received {} chars of analysis", text.len());
        parse_analysis_text(&text)
    }
}
