/*!
 * Domain records stored in the document database.
 *
 * Stored documents use loose JSON shapes (optional nested fields, transcripts
 * stored either as one string or as an array of lines). Every record here is
 * deserialized with explicit defaults so the shape is validated once, at the
 * boundary, rather than probed field by field.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AdminError;

/// Collection holding one document per analyzed video, keyed by video id
pub const VIDEOS_COLLECTION: &str = "videoAnalyses";

/// Collection holding one document per end user, keyed by uid
pub const USERS_COLLECTION: &str = "users";

/// Collection for bookkeeping documents
pub const SYSTEM_COLLECTION: &str = "system";

/// Subscription plan of an end user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Plus,
    Pro,
}

impl Plan {
    /// All accepted plans, in upgrade order
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Plus, Plan::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Plus => "plus",
            Plan::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "plus" => Ok(Plan::Plus),
            "pro" => Ok(Plan::Pro),
            _ => Err(AdminError::validation("Invalid plan type")),
        }
    }
}

/// Per-user analysis usage counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageStats {
    pub analysis_count: u32,
    pub last_analysis_date: Option<String>,
}

/// End-user account as stored in the `users` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub plan: Plan,
    pub created_at: String,
    pub usage: UsageStats,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One slang expression or idiom with its explanation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlangExpression {
    pub expression: String,
    pub meaning: String,
}

/// Learning material generated for a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub summary: String,
    pub keywords: Vec<String>,
    pub slang_expressions: Vec<SlangExpression>,
    pub main_questions: Vec<String>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.keywords.is_empty()
            && self.slang_expressions.is_empty()
            && self.main_questions.is_empty()
    }
}

/// Transcript as stored: older records hold a string, edited ones hold lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptText {
    Text(String),
    Lines(Vec<String>),
}

impl Default for TranscriptText {
    fn default() -> Self {
        TranscriptText::Text(String::new())
    }
}

impl TranscriptText {
    /// Render as a single newline-separated string
    pub fn joined(&self) -> String {
        match self {
            TranscriptText::Text(text) => text.clone(),
            TranscriptText::Lines(lines) => lines.join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TranscriptText::Text(text) => text.trim().is_empty(),
            TranscriptText::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
        }
    }
}

impl From<String> for TranscriptText {
    fn from(text: String) -> Self {
        TranscriptText::Text(text)
    }
}

/// Video analysis document from the `videoAnalyses` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRecord {
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(rename = "youtubeTitle")]
    pub youtube_title: String,
    #[serde(rename = "youtubeDescription")]
    pub youtube_description: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    /// Length in seconds
    pub duration: u64,
    /// RFC 3339 time of the last write
    pub timestamp: String,
    pub analysis: Analysis,
    pub transcript_text: TranscriptText,
}

/// Input for registering a video; only the id is mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewVideo {
    pub video_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<u64>,
    pub analysis: Option<Analysis>,
    #[serde(rename = "transcript_text")]
    pub transcript_text: Option<String>,
}

impl NewVideo {
    /// Build the stored record, filling defaults and stamping `timestamp`
    pub fn into_record(self, timestamp: String) -> Result<VideoRecord, AdminError> {
        if self.video_id.trim().is_empty() {
            return Err(AdminError::validation("Video ID is required"));
        }

        Ok(VideoRecord {
            video_id: self.video_id,
            youtube_title: self.title.unwrap_or_default(),
            youtube_description: self.description.unwrap_or_default(),
            thumbnail_url: self.thumbnail_url.unwrap_or_default(),
            duration: self.duration.unwrap_or(0),
            timestamp,
            analysis: self.analysis.unwrap_or_default(),
            transcript_text: TranscriptText::Text(self.transcript_text.unwrap_or_default()),
        })
    }
}

/// `{ "analysis": {...}, "transcript_text": "..." }` document pasted from an
/// external assistant during registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisEnvelope {
    pub analysis: Analysis,
    pub transcript_text: String,
}

impl AnalysisEnvelope {
    pub fn from_json_str(json: &str) -> Result<Self, AdminError> {
        serde_json::from_str(json)
            .map_err(|_| AdminError::validation("Invalid JSON format in analysis data"))
    }
}

/// Values from the video edit form, as raw strings
#[derive(Debug, Clone, Default)]
pub struct VideoEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u64>,
    pub summary: Option<String>,
    /// Comma-separated
    pub keywords: Option<String>,
    /// JSON array of `{expression, meaning}`
    pub slang_expressions: Option<String>,
    /// One question per line
    pub main_questions: Option<String>,
    /// One segment per line
    pub transcript: Option<String>,
}

impl VideoEdit {
    /// Convert into the partial document merged into the stored record.
    ///
    /// Analysis fields are only written when at least one of them was edited;
    /// unedited ones are then taken from `current`, since the whole
    /// `analysis` object is replaced.
    pub fn into_update(self, current: &Analysis) -> Result<Map<String, Value>, AdminError> {
        let mut update = Map::new();

        if let Some(title) = self.title {
            update.insert("youtubeTitle".to_string(), Value::String(title));
        }
        if let Some(description) = self.description {
            update.insert("youtubeDescription".to_string(), Value::String(description));
        }
        if let Some(duration) = self.duration {
            update.insert("duration".to_string(), Value::from(duration));
        }

        let analysis_edited = self.summary.is_some()
            || self.keywords.is_some()
            || self.slang_expressions.is_some()
            || self.main_questions.is_some();

        if analysis_edited {
            let slang_expressions = match self.slang_expressions {
                Some(json) => parse_slang_expressions(&json)?,
                None => current.slang_expressions.clone(),
            };

            let analysis = Analysis {
                summary: self.summary.unwrap_or_else(|| current.summary.clone()),
                keywords: self
                    .keywords
                    .map(|k| split_comma_list(&k))
                    .unwrap_or_else(|| current.keywords.clone()),
                slang_expressions,
                main_questions: self
                    .main_questions
                    .map(|q| split_lines(&q))
                    .unwrap_or_else(|| current.main_questions.clone()),
            };

            update.insert("analysis".to_string(), serde_json::to_value(analysis).map_err(|e| {
                AdminError::Unknown(format!("Failed to serialize analysis: {}", e))
            })?);
        }

        if let Some(transcript) = self.transcript {
            let lines = split_lines(&transcript);
            update.insert(
                "transcript_text".to_string(),
                Value::Array(lines.into_iter().map(Value::String).collect()),
            );
        }

        Ok(update)
    }
}

/// Parse the slang-expression editor contents, which must be a JSON array
pub fn parse_slang_expressions(json: &str) -> Result<Vec<SlangExpression>, AdminError> {
    let invalid = || AdminError::validation("Slang expressions must be a JSON array");

    let value: Value = serde_json::from_str(json).map_err(|_| invalid())?;
    if !value.is_array() {
        return Err(invalid());
    }

    serde_json::from_value(value).map_err(|_| invalid())
}

/// Split `"a, b,,c"` into `["a", "b", "c"]`
pub fn split_comma_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split on newlines, trimming and dropping empty lines
pub fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format a length in seconds as `H:MM:SS`, or `M:SS` below one hour
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
