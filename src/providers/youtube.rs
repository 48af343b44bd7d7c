use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::VideoMetadataSource;
use crate::errors::ProviderError;

// @const: Video id in watch, embed, /v/, /e/, nested-path and short-link URLs
static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#)
        .unwrap()
});

// @const: ISO 8601 duration as used by contentDetails.duration
static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?").unwrap()
});

/// Extract the 11-character video id from a YouTube URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Convert `PT#H#M#S` into seconds; unrecognized input yields 0
pub fn parse_iso8601_duration(duration: &str) -> u64 {
    let Some(caps) = DURATION_REGEX.captures(duration) else {
        return 0;
    };

    let field = |index: usize| {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    field(1)
        .saturating_mul(3600)
        .saturating_add(field(2).saturating_mul(60))
        .saturating_add(field(3))
}

/// Metadata the admin screens need about one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    /// Length in seconds
    pub duration: u64,
    pub channel_title: String,
}

/// `videos.list` response
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

/// One entry of `videos.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub snippet: Snippet,
    pub content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    #[serde(rename = "default")]
    pub standard: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: String,
}

impl VideoItem {
    /// Flatten into `VideoDetails`, preferring the high-resolution thumbnail
    pub fn into_details(self, video_id: &str) -> VideoDetails {
        let thumbnails = self.snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.standard)
            .map(|t| t.url)
            .unwrap_or_default();

        VideoDetails {
            video_id: video_id.to_string(),
            title: self.snippet.title,
            description: self.snippet.description,
            thumbnail_url,
            duration: parse_iso8601_duration(&self.content_details.duration),
            channel_title: self.snippet.channel_title,
        }
    }
}

/// YouTube Data API client
#[derive(Debug)]
pub struct YouTube {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent as the `key` query parameter
    api_key: String,
    /// Base URL, e.g. `https://www.googleapis.com/youtube/v3`
    endpoint: String,
}

impl YouTube {
    /// Create a new YouTube client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn videos_url(&self, video_id: &str) -> Result<Url, ProviderError> {
        let base = format!("{}/videos", self.endpoint.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[
                ("id", video_id),
                ("key", self.api_key.as_str()),
                ("part", "snippet,contentDetails"),
            ],
        )
        .map_err(|e| ProviderError::ConfigurationError(format!("Invalid YouTube endpoint: {}", e)))
    }

    /// Fetch details for one video; `None` when the API returns no items
    pub async fn fetch_video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::ConfigurationError(
                "YouTube API key not configured".to_string(),
            ));
        }

        debug!("Fetching YouTube details for {}", video_id);

        let response = self.client.get(self.videos_url(video_id)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("YouTube API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(format!("YouTube API error: {}", status)),
                code => ProviderError::ApiError {
                    status_code: code,
                    message: format!("YouTube API error: {}", status),
                },
            });
        }

        let list = response
            .json::<VideoListResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;

        Ok(list
            .items
            .into_iter()
            .next()
            .map(|item| item.into_details(video_id)))
    }
}

#[async_trait]
impl VideoMetadataSource for YouTube {
    async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ProviderError> {
        self.fetch_video_details(video_id).await
    }
}
