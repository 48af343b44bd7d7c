use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{AnalysisResult, GeminiAnalyzer, TranscriptAnalyzer};
use crate::app_config::Config;
use crate::database::{DatabaseConnection, DatabaseStats, Document, DocumentStore, DocumentWrite, Repository, SortDirection};
use crate::database::models::to_document_data;
use crate::errors::{AdminError, StoreError};
use crate::file_utils::FileManager;
use crate::models::{
    Analysis, AnalysisEnvelope, NewVideo, Plan, SlangExpression, UsageStats, UserRecord, VideoEdit,
    VideoRecord, SYSTEM_COLLECTION, USERS_COLLECTION, VIDEOS_COLLECTION,
};
use crate::providers::youtube::{extract_video_id, YouTube};
use crate::providers::{VideoDetails, VideoMetadataSource};
use crate::transcript;

// @module: Admin operations over videos, users and the document store

/// Result of `check_database`
#[derive(Debug, Clone)]
pub struct DatabaseCheck {
    pub location: String,
    pub stats: DatabaseStats,
}

/// Admin operations controller
pub struct AdminController {
    // @field: Document store
    store: Arc<dyn DocumentStore>,
    // @field: Video metadata lookup
    videos: Arc<dyn VideoMetadataSource>,
    // @field: Transcript analysis
    analyzer: Arc<dyn TranscriptAnalyzer>,
}

/// ISO 8601 UTC time with milliseconds, e.g. `2025-06-21T09:30:00.000Z`
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn store_error(error: StoreError, what: &str) -> AdminError {
    match error {
        StoreError::NotFound { .. } => AdminError::not_found(format!("{} not found", what)),
        other => AdminError::Store(other),
    }
}

impl AdminController {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        videos: Arc<dyn VideoMetadataSource>,
        analyzer: Arc<dyn TranscriptAnalyzer>,
    ) -> Self {
        Self { store, videos, analyzer }
    }

    // @method: Build the production controller from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db_path = config.database.resolve_path()?;
        let db = DatabaseConnection::new(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        debug!("Using database at {}", db_path.display());

        let youtube = YouTube::new(
            config.youtube.api_key.clone(),
            config.youtube.endpoint.clone(),
            config.youtube.timeout_secs,
        );

        Ok(Self::new(
            Arc::new(Repository::new(db)),
            Arc::new(youtube),
            Arc::new(GeminiAnalyzer::from_config(&config.gemini)),
        ))
    }

    // =========================================================================
    // YouTube and analysis
    // =========================================================================

    /// Look up video metadata from a YouTube URL
    pub async fn youtube_details(&self, url: &str) -> Result<VideoDetails, AdminError> {
        if url.trim().is_empty() {
            return Err(AdminError::validation("URL parameter is required"));
        }

        let video_id = extract_video_id(url).ok_or_else(|| AdminError::validation("Invalid YouTube URL"))?;

        self.videos
            .video_details(&video_id)
            .await?
            .ok_or_else(|| AdminError::not_found("Video not found"))
    }

    /// Run transcript analysis
    pub async fn analyze_transcript(&self, transcript_text: &str) -> Result<AnalysisResult, AdminError> {
        if transcript_text.trim().is_empty() {
            return Err(AdminError::validation("Transcript text is required"));
        }
        Ok(self.analyzer.analyze(transcript_text).await?)
    }

    /// Read a .txt/.srt/.vtt file and normalize it into `[MM:SS] text` lines
    pub fn load_transcript_file(&self, path: &Path) -> Result<String, AdminError> {
        if !FileManager::is_transcript_file(path) {
            return Err(AdminError::validation(format!(
                "Unsupported transcript file (expected .txt, .srt or .vtt): {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdminError::File(format!("Failed to read {}: {}", path.display(), e)))?;

        let normalized = transcript::normalize(&raw);
        if normalized.is_empty() {
            warn!("No timed cues found in {}", path.display());
        }
        Ok(normalized)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Create or replace a video record under its video id
    pub async fn register_video(&self, video: NewVideo) -> Result<VideoRecord, AdminError> {
        let record = video.into_record(current_timestamp())?;
        let data = to_document_data(&record)?;

        self.store.set(VIDEOS_COLLECTION, &record.video_id, data).await?;
        info!("Registered video {} ({})", record.video_id, record.youtube_title);
        Ok(record)
    }

    /// Register using fetched details plus a pasted `{analysis, transcript_text}` document
    pub async fn register_from_envelope(
        &self,
        details: &VideoDetails,
        envelope_json: &str,
    ) -> Result<VideoRecord, AdminError> {
        if envelope_json.trim().is_empty() {
            return Err(AdminError::validation("Please provide both YouTube details and analysis data"));
        }
        let envelope = AnalysisEnvelope::from_json_str(envelope_json)?;
        if envelope.analysis.is_empty() {
            warn!("Analysis data for {} is empty", details.video_id);
        }

        self.register_video(new_video_from(details, envelope.analysis, envelope.transcript_text))
            .await
    }

    /// Fetch details, normalize the subtitle file, analyze it and register the result
    pub async fn register_from_subtitles(&self, url: &str, subtitle_path: &Path) -> Result<VideoRecord, AdminError> {
        let details = self.youtube_details(url).await?;
        let transcript_text = self.load_transcript_file(subtitle_path)?;
        if transcript_text.is_empty() {
            return Err(AdminError::validation(format!(
                "No subtitle cues found in {}",
                subtitle_path.display()
            )));
        }

        let result = self.analyze_transcript(&transcript_text).await?;

        self.register_video(new_video_from(&details, result.analysis, transcript_text))
            .await
    }

    /// All videos, newest first
    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>, AdminError> {
        let documents = self
            .store
            .query_ordered(VIDEOS_COLLECTION, "timestamp", SortDirection::Descending)
            .await?;

        documents.iter().map(decode_video).collect()
    }

    pub async fn get_video(&self, video_id: &str) -> Result<VideoRecord, AdminError> {
        let document = self
            .store
            .get(VIDEOS_COLLECTION, video_id)
            .await?
            .ok_or_else(|| AdminError::not_found("Video not found"))?;

        decode_video(&document)
    }

    /// Merge fields into a video and stamp a new `timestamp`
    pub async fn update_video(&self, video_id: &str, mut fields: Map<String, Value>) -> Result<VideoRecord, AdminError> {
        if video_id.trim().is_empty() {
            return Err(AdminError::validation("Video ID is required"));
        }

        fields.remove("videoId");
        fields.insert("timestamp".to_string(), Value::String(current_timestamp()));

        let document = self
            .store
            .update(VIDEOS_COLLECTION, video_id, fields)
            .await
            .map_err(|e| store_error(e, "Video"))?;

        info!("Video updated successfully: {}", video_id);
        decode_video(&document)
    }

    /// Apply edit-form values on top of the stored analysis
    pub async fn edit_video(&self, video_id: &str, edit: VideoEdit) -> Result<VideoRecord, AdminError> {
        let current = self.get_video(video_id).await?;
        let fields = edit.into_update(&current.analysis)?;
        self.update_video(video_id, fields).await
    }

    pub async fn delete_video(&self, video_id: &str) -> Result<bool, AdminError> {
        if video_id.trim().is_empty() {
            return Err(AdminError::validation("Video ID is required"));
        }

        let removed = self.store.delete(VIDEOS_COLLECTION, video_id).await?;
        if removed {
            info!("Video deleted successfully: {}", video_id);
        } else {
            debug!("Delete of unknown video {} ignored", video_id);
        }
        Ok(removed)
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AdminError> {
        let documents = self.store.list(USERS_COLLECTION).await?;

        documents
            .iter()
            .map(|document| -> Result<UserRecord, AdminError> {
                let mut user: UserRecord = document.decode()?;
                user.uid = document.id.clone();
                Ok(user)
            })
            .collect()
    }

    /// Change a user's plan after validating the plan name
    pub async fn update_plan(&self, uid: &str, new_plan: &str) -> Result<(), AdminError> {
        if uid.trim().is_empty() || new_plan.trim().is_empty() {
            return Err(AdminError::validation("UID and newPlan are required"));
        }
        let plan: Plan = new_plan.parse()?;

        let mut fields = Map::new();
        fields.insert("plan".to_string(), Value::String(plan.as_str().to_string()));

        self.store
            .update(USERS_COLLECTION, uid, fields)
            .await
            .map_err(|e| store_error(e, "User"))?;

        info!("Updated plan of {} to {}", uid, plan);
        Ok(())
    }

    // =========================================================================
    // Database bookkeeping
    // =========================================================================

    /// Seed `system/config`, a sample user and a sample video in one batch
    pub async fn setup_database(&self) -> Result<Vec<String>, AdminError> {
        let now = current_timestamp();

        let config = object(json!({
            "initialized": true,
            "createdAt": now,
            "version": "1.0.0",
        }));

        let user = UserRecord {
            uid: "sample-user".to_string(),
            email: "sample@example.com".to_string(),
            display_name: "Sample User".to_string(),
            plan: Plan::Free,
            created_at: now.clone(),
            usage: UsageStats::default(),
            extra: Map::new(),
        };

        let video = VideoRecord {
            video_id: "sample-video".to_string(),
            youtube_title: "Sample Video".to_string(),
            youtube_description: "This is a sample video for testing".to_string(),
            thumbnail_url: "https://example.com/thumbnail.jpg".to_string(),
            duration: 300,
            timestamp: now.clone(),
            analysis: Analysis {
                summary: "Sample analysis".to_string(),
                keywords: vec!["sample".to_string(), "test".to_string()],
                slang_expressions: vec![SlangExpression {
                    expression: "sample".to_string(),
                    meaning: "example".to_string(),
                }],
                main_questions: vec!["What is this video about?".to_string()],
            },
            transcript_text: "Sample transcript".to_string().into(),
        };

        let writes = vec![
            DocumentWrite::new(SYSTEM_COLLECTION, "config", config),
            DocumentWrite::new(USERS_COLLECTION, &user.uid, to_document_data(&user)?),
            DocumentWrite::new(VIDEOS_COLLECTION, &video.video_id, to_document_data(&video)?),
        ];
        self.store.set_batch(writes).await?;

        info!("Database setup completed");
        Ok([SYSTEM_COLLECTION, USERS_COLLECTION, VIDEOS_COLLECTION]
            .iter()
            .map(|name| name.to_string())
            .collect())
    }

    /// Write `system/init` and read it back
    pub async fn init_database(&self) -> Result<Document, AdminError> {
        let data = object(json!({
            "type": "initialization",
            "timestamp": current_timestamp(),
            "message": "Database initialized",
        }));

        self.store.set(SYSTEM_COLLECTION, "init", data).await?;

        self.store
            .get(SYSTEM_COLLECTION, "init")
            .await?
            .ok_or_else(|| AdminError::Unknown("Initialization document could not be read back".to_string()))
    }

    /// Connectivity check with document counts
    pub async fn check_database(&self) -> Result<DatabaseCheck, AdminError> {
        let stats = self.store.stats().await?;
        Ok(DatabaseCheck {
            location: self.store.location(),
            stats,
        })
    }
}

fn new_video_from(details: &VideoDetails, analysis: Analysis, transcript_text: String) -> NewVideo {
    NewVideo {
        video_id: details.video_id.clone(),
        title: Some(details.title.clone()),
        description: Some(details.description.clone()),
        thumbnail_url: Some(details.thumbnail_url.clone()),
        duration: Some(details.duration),
        analysis: Some(analysis),
        transcript_text: Some(transcript_text),
    }
}

/// Decode a stored video; the document id stands in for a missing `videoId`
fn decode_video(document: &Document) -> Result<VideoRecord, AdminError> {
    let mut record: VideoRecord = document.decode()?;
    if record.video_id.is_empty() {
        record.video_id = document.id.clone();
    }
    Ok(record)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
