/*!
 * Integration tests for admin operations over mocks and an in-memory store
 */

use anyhow::Result;
use serde_json::{json, Map, Value};
use ytlearn::errors::{AdminError, AnalysisError};
use ytlearn::models::{NewVideo, Plan, VideoEdit};
use ytlearn::providers::mock::{MockAnalyzer, MockVideoSource};
use crate::common::{self, SAMPLE_VIDEO_ID, SAMPLE_VIDEO_URL};

fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Subtitle file in, analyzed and stored record out
#[tokio::test]
async fn test_registerFromSubtitles_shouldNormalizeAnalyzeAndStore() -> Result<()> {
    let analyzer = MockAnalyzer::working();
    let controller = common::create_test_controller_with(analyzer.clone(), common::mock_video_source());
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_subtitle(temp_dir.path(), "lesson.srt")?;

    let record = controller.register_from_subtitles(SAMPLE_VIDEO_URL, &subtitles).await?;

    let expected_transcript =
        "[00:01] This is a test subtitle.\n[00:05] It contains multiple lines.\n[00:10] For testing purposes.";
    assert_eq!(analyzer.received_transcripts(), vec![expected_transcript]);
    assert_eq!(record.video_id, SAMPLE_VIDEO_ID);
    assert_eq!(record.youtube_title, "Never Gonna Give You Up");
    assert_eq!(record.duration, 213);
    assert_eq!(record.analysis, MockAnalyzer::sample_analysis());
    assert_eq!(record.transcript_text.joined(), expected_transcript);

    let stored = controller.get_video(SAMPLE_VIDEO_ID).await?;
    assert_eq!(stored, record);
    Ok(())
}

/// Malformed model output surfaces as an analysis error and nothing is stored
#[tokio::test]
async fn test_registerFromSubtitles_withMalformedAnalysis_shouldNotStore() -> Result<()> {
    let controller = common::create_test_controller_with(MockAnalyzer::malformed(), common::mock_video_source());
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_vtt(temp_dir.path(), "lesson.vtt")?;

    let result = controller.register_from_subtitles(SAMPLE_VIDEO_URL, &subtitles).await;

    assert!(matches!(result, Err(AdminError::Analysis(AnalysisError::Malformed(_)))));
    assert!(controller.list_videos().await?.is_empty());
    Ok(())
}

/// Unsupported extensions are rejected before reading
#[tokio::test]
async fn test_loadTranscriptFile_withUnsupportedExtension_shouldFail() -> Result<()> {
    let controller = common::create_test_controller();
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "clip.mp4", "binary")?;

    assert!(matches!(controller.load_transcript_file(&file), Err(AdminError::Validation(_))));
    Ok(())
}

/// URL validation and unknown videos map to distinct errors
#[tokio::test]
async fn test_youtubeDetails_errorCases() {
    let controller = common::create_test_controller();

    assert!(matches!(controller.youtube_details("").await, Err(AdminError::Validation(_))));
    assert!(matches!(
        controller.youtube_details("https://vimeo.com/123").await,
        Err(AdminError::Validation(ref m)) if m == "Invalid YouTube URL"
    ));
    assert!(matches!(
        controller.youtube_details("https://youtu.be/zzzzzzzzzzz").await,
        Err(AdminError::NotFound(_))
    ));

    let offline = common::create_test_controller_with(MockAnalyzer::working(), MockVideoSource::failing());
    assert!(matches!(
        offline.youtube_details(SAMPLE_VIDEO_URL).await,
        Err(AdminError::Provider(_))
    ));
}

/// Envelope registration keeps the pasted analysis and transcript
#[tokio::test]
async fn test_registerFromEnvelope_shouldUsePastedDocument() -> Result<()> {
    let controller = common::create_test_controller();
    let details = controller.youtube_details(SAMPLE_VIDEO_URL).await?;
    let envelope = json!({
        "analysis": { "summary": "요약", "keywords": ["a"], "slang_expressions": [], "main_questions": [] },
        "transcript_text": "[00:00] pasted"
    })
    .to_string();

    let record = controller.register_from_envelope(&details, &envelope).await?;

    assert_eq!(record.analysis.summary, "요약");
    assert_eq!(record.transcript_text.joined(), "[00:00] pasted");
    assert_eq!(record.thumbnail_url, details.thumbnail_url);

    let invalid = controller.register_from_envelope(&details, "{oops").await;
    assert!(matches!(invalid, Err(AdminError::Validation(_))));
    Ok(())
}

/// Listing is newest first, driven by the timestamp field
#[tokio::test]
async fn test_listVideos_shouldOrderByTimestampDescending() -> Result<()> {
    let controller = common::create_test_controller();
    for id in ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"] {
        controller
            .register_video(NewVideo {
                video_id: id.to_string(),
                ..NewVideo::default()
            })
            .await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // Touching the oldest moves it to the front
    controller
        .update_video("aaaaaaaaaaa", fields(json!({ "youtubeTitle": "Edited" })))
        .await?;

    let ids: Vec<_> = controller.list_videos().await?.into_iter().map(|v| v.video_id).collect();
    assert_eq!(ids, vec!["aaaaaaaaaaa", "ccccccccccc", "bbbbbbbbbbb"]);
    Ok(())
}

/// Registration requires an id
#[tokio::test]
async fn test_registerVideo_withoutId_shouldFail() {
    let controller = common::create_test_controller();

    let result = controller.register_video(NewVideo::default()).await;

    assert!(matches!(result, Err(AdminError::Validation(ref m)) if m == "Video ID is required"));
}

/// Updates merge, stamp a new timestamp and fail for unknown ids
#[tokio::test]
async fn test_updateVideo_shouldMergeAndRestamp() -> Result<()> {
    let controller = common::create_test_controller();
    let created = controller
        .register_video(NewVideo {
            video_id: SAMPLE_VIDEO_ID.to_string(),
            title: Some("Original".to_string()),
            duration: Some(60),
            ..NewVideo::default()
        })
        .await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let updated = controller
        .update_video(SAMPLE_VIDEO_ID, fields(json!({ "youtubeDescription": "Now described" })))
        .await?;

    assert_eq!(updated.youtube_title, "Original");
    assert_eq!(updated.youtube_description, "Now described");
    assert_eq!(updated.duration, 60);
    assert!(updated.timestamp > created.timestamp);

    let missing = controller.update_video("zzzzzzzzzzz", Map::new()).await;
    assert!(matches!(missing, Err(AdminError::NotFound(_))));
    assert!(matches!(controller.update_video("", Map::new()).await, Err(AdminError::Validation(_))));
    Ok(())
}

/// Edit-form values replace the analysis fields they name
#[tokio::test]
async fn test_editVideo_shouldSplitFormFields() -> Result<()> {
    let controller = common::create_test_controller();
    let temp_dir = common::create_temp_dir()?;
    let subtitles = common::create_test_subtitle(temp_dir.path(), "lesson.srt")?;
    controller.register_from_subtitles(SAMPLE_VIDEO_URL, &subtitles).await?;

    let edit = VideoEdit {
        keywords: Some("alpha, beta,,gamma ".to_string()),
        main_questions: Some("First?\n\n  Second?  ".to_string()),
        transcript: Some("[00:00] a\n\n[00:04] b\n".to_string()),
        ..VideoEdit::default()
    };
    let edited = controller.edit_video(SAMPLE_VIDEO_ID, edit).await?;

    assert_eq!(edited.analysis.keywords, vec!["alpha", "beta", "gamma"]);
    assert_eq!(edited.analysis.main_questions, vec!["First?", "Second?"]);
    assert_eq!(edited.analysis.summary, MockAnalyzer::sample_analysis().summary);
    assert_eq!(edited.transcript_text.joined(), "[00:00] a\n[00:04] b");
    Ok(())
}

/// Deleting reports whether the video existed
#[tokio::test]
async fn test_deleteVideo_shouldRemoveRecord() -> Result<()> {
    let controller = common::create_test_controller();
    controller
        .register_video(NewVideo {
            video_id: SAMPLE_VIDEO_ID.to_string(),
            ..NewVideo::default()
        })
        .await?;

    assert!(controller.delete_video(SAMPLE_VIDEO_ID).await?);
    assert!(!controller.delete_video(SAMPLE_VIDEO_ID).await?);
    assert!(matches!(controller.get_video(SAMPLE_VIDEO_ID).await, Err(AdminError::NotFound(_))));
    Ok(())
}

/// Seeding creates the sample documents and plan updates validate input
#[tokio::test]
async fn test_setupDatabase_thenUpdatePlan() -> Result<()> {
    let controller = common::create_test_controller();

    let collections = controller.setup_database().await?;
    assert_eq!(collections, vec!["system", "users", "videoAnalyses"]);

    let users = controller.list_users().await?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].uid, "sample-user");
    assert_eq!(users[0].plan, Plan::Free);

    controller.update_plan("sample-user", "pro").await?;
    assert_eq!(controller.list_users().await?[0].plan, Plan::Pro);

    assert!(matches!(
        controller.update_plan("sample-user", "enterprise").await,
        Err(AdminError::Validation(ref m)) if m == "Invalid plan type"
    ));
    assert!(matches!(
        controller.update_plan("", "pro").await,
        Err(AdminError::Validation(ref m)) if m == "UID and newPlan are required"
    ));
    assert!(matches!(
        controller.update_plan("ghost", "plus").await,
        Err(AdminError::NotFound(_))
    ));

    let sample = controller.get_video("sample-video").await?;
    assert_eq!(sample.youtube_title, "Sample Video");
    assert_eq!(sample.duration, 300);
    Ok(())
}

/// Init writes a marker and check reports counts per collection
#[tokio::test]
async fn test_initAndCheckDatabase() -> Result<()> {
    let controller = common::create_test_controller();

    let marker = controller.init_database().await?;
    assert_eq!(marker.id, "init");
    assert_eq!(marker.data["message"], "Database initialized");

    controller.setup_database().await?;
    let check = controller.check_database().await?;
    assert_eq!(check.stats.count_for("system"), 2);
    assert_eq!(check.stats.count_for("users"), 1);
    assert_eq!(check.stats.document_count(), 4);
    Ok(())
}
