/*!
 * End-to-end tests of the HTTP-backed providers against a local mock server
 */

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytlearn::analysis::GeminiAnalyzer;
use ytlearn::app_controller::AdminController;
use ytlearn::database::Repository;
use ytlearn::errors::{AdminError, AnalysisError, ProviderError};
use ytlearn::providers::gemini::Gemini;
use ytlearn::providers::youtube::YouTube;
use crate::common::{self, SAMPLE_VIDEO_ID, SAMPLE_VIDEO_URL};

const MODEL: &str = "gemini-2.5-flash";

fn video_list(title: &str, duration: &str) -> Value {
    json!({
        "items": [{
            "snippet": {
                "title": title,
                "description": "Official video",
                "channelTitle": "Rick Astley",
                "thumbnails": { "high": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg" } }
            },
            "contentDetails": { "duration": duration }
        }]
    })
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }],
        "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 80, "totalTokenCount": 200 }
    })
}

fn analysis_json() -> String {
    json!({
        "analysis": {
            "summary": "사랑을 포기하지 않겠다는 노래입니다.",
            "keywords": ["commitment", "promise"],
            "slang_expressions": [{ "expression": "gonna", "meaning": "going to의 구어체" }],
            "main_questions": ["What does the singer promise?"]
        }
    })
    .to_string()
}

fn controller_for(youtube: &MockServer, gemini: &MockServer, youtube_key: &str) -> Result<AdminController> {
    let repo = Repository::new_in_memory()?;
    Ok(AdminController::new(
        Arc::new(repo),
        Arc::new(YouTube::new(youtube_key, youtube.uri(), 5)),
        Arc::new(GeminiAnalyzer::new(Gemini::new("gemini-key", gemini.uri(), MODEL, 5), None)),
    ))
}

/// Full registration through both HTTP APIs
#[tokio::test]
async fn test_registerFromSubtitles_withHttpProviders_shouldStoreAnalyzedVideo() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", SAMPLE_VIDEO_ID))
        .and(query_param("key", "yt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_list("Never Gonna Give You Up", "PT3M33S")))
        .expect(1)
        .mount(&youtube)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", MODEL)))
        .and(query_param("key", "gemini-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&format!("```json\n{}\n```", analysis_json()))))
        .expect(1)
        .mount(&gemini)
        .await;

    let controller = controller_for(&youtube, &gemini, "yt-key")?;
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_vtt(temp_dir.path(), "song.vtt")?;

    let record = controller.register_from_subtitles(SAMPLE_VIDEO_URL, &subtitles).await?;

    assert_eq!(record.youtube_title, "Never Gonna Give You Up");
    assert_eq!(record.duration, 213);
    assert_eq!(record.thumbnail_url, "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg");
    assert_eq!(record.analysis.keywords, vec!["commitment", "promise"]);
    assert_eq!(record.analysis.slang_expressions[0].expression, "gonna");
    assert_eq!(record.transcript_text.joined(), "[00:02] Hello there.\n[01:07] General Kenobi!");

    assert_eq!(controller.list_videos().await?.len(), 1);
    Ok(())
}

/// The transcript sent to the model is the normalized text inside triple quotes
#[tokio::test]
async fn test_analyzeTranscript_shouldSendPromptAndTranscript() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", MODEL)))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": ytlearn::analysis::ANALYSIS_PROMPT },
                    { "text": "Transcript: \"\"\"[00:01] Hello\"\"\"" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&analysis_json())))
        .expect(1)
        .mount(&gemini)
        .await;

    let controller = controller_for(&youtube, &gemini, "yt-key")?;

    let result = controller.analyze_transcript("[00:01] Hello").await?;

    assert_eq!(result.analysis.main_questions, vec!["What does the singer promise?"]);
    Ok(())
}

/// Rejected API keys surface as authentication errors without leaking the key
#[tokio::test]
async fn test_youtubeDetails_withForbiddenKey_shouldReportAuthentication() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": { "message": "API key not valid" } })))
        .mount(&youtube)
        .await;

    let controller = controller_for(&youtube, &gemini, "secret-key")?;

    let error = controller.youtube_details(SAMPLE_VIDEO_URL).await.unwrap_err();

    assert!(matches!(error, AdminError::Provider(ProviderError::AuthenticationError(_))));
    assert!(!error.to_string().contains("secret-key"));
    Ok(())
}

/// An empty item list means the video does not exist
#[tokio::test]
async fn test_youtubeDetails_withNoItems_shouldReportNotFound() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&youtube)
        .await;

    let controller = controller_for(&youtube, &gemini, "yt-key")?;

    let result = controller.youtube_details("https://youtu.be/dQw4w9WgXcQ").await;

    assert!(matches!(result, Err(AdminError::NotFound(ref m)) if m == "Video not found"));
    Ok(())
}

/// Without a YouTube key no request is made
#[tokio::test]
async fn test_youtubeDetails_withoutApiKey_shouldNotCallApi() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_list("x", "PT1S")))
        .expect(0)
        .mount(&youtube)
        .await;

    let controller = controller_for(&youtube, &gemini, "")?;

    let result = controller.youtube_details(SAMPLE_VIDEO_URL).await;

    assert!(matches!(result, Err(AdminError::Provider(ProviderError::ConfigurationError(_)))));
    Ok(())
}

/// Gemini API errors carry the message from the error body
#[tokio::test]
async fn test_analyzeTranscript_withQuotaError_shouldSurfaceMessage() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&gemini)
        .await;

    let controller = controller_for(&youtube, &gemini, "yt-key")?;

    let result = controller.analyze_transcript("[00:01] Hello").await;

    match result {
        Err(AdminError::Analysis(AnalysisError::Provider(ProviderError::ApiError { status_code, message }))) => {
            assert_eq!(status_code, 429);
            assert!(message.contains("Resource has been exhausted"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

/// Model output that is not JSON is reported as malformed
#[tokio::test]
async fn test_analyzeTranscript_withProseReply_shouldReportMalformed() -> Result<()> {
    let youtube = MockServer::start().await;
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Sure! Here is a summary of the video.")))
        .mount(&gemini)
        .await;

    let controller = controller_for(&youtube, &gemini, "yt-key")?;

    let result = controller.analyze_transcript("[00:01] Hello").await;

    assert!(matches!(result, Err(AdminError::Analysis(AnalysisError::Malformed(_)))));
    Ok(())
}
