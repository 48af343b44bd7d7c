/*!
 * Tests for domain records and edit-form conversion
 */

use serde_json::json;
use ytlearn::errors::AdminError;
use ytlearn::models::{
    AnalysisEnvelope, NewVideo, Plan, TranscriptText, VideoEdit, VideoRecord,
};

/// Stored video documents use the camelCase field names of the catalog
#[test]
fn test_videoRecord_serialization_shouldUseStoredFieldNames() {
    let record = NewVideo {
        video_id: "abcdefghijk".to_string(),
        title: Some("Title".to_string()),
        duration: Some(90),
        transcript_text: Some("[00:01] hi".to_string()),
        ..NewVideo::default()
    }
    .into_record("2025-06-21T09:30:00.000Z".to_string())
    .unwrap();

    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["videoId"], "abcdefghijk");
    assert_eq!(value["youtubeTitle"], "Title");
    assert_eq!(value["youtubeDescription"], "");
    assert_eq!(value["thumbnailUrl"], "");
    assert_eq!(value["duration"], 90);
    assert_eq!(value["transcript_text"], "[00:01] hi");
    assert!(value["analysis"]["keywords"].as_array().unwrap().is_empty());
}

/// NewVideo accepts the registration payload shape
#[test]
fn test_newVideo_fromJson_shouldReadCamelCaseAndTranscriptField() {
    let video: NewVideo = serde_json::from_value(json!({
        "videoId": "abcdefghijk",
        "thumbnailUrl": "https://i.ytimg.com/x.jpg",
        "transcript_text": "[00:00] start"
    }))
    .unwrap();

    assert_eq!(video.video_id, "abcdefghijk");
    assert_eq!(video.thumbnail_url.as_deref(), Some("https://i.ytimg.com/x.jpg"));
    assert_eq!(video.transcript_text.as_deref(), Some("[00:00] start"));
    assert!(video.title.is_none());
}

/// Pasted envelope JSON parses; anything else is a validation error
#[test]
fn test_analysisEnvelope_fromJsonStr_shouldValidate() {
    let envelope = AnalysisEnvelope::from_json_str(
        r#"{"analysis":{"summary":"요약","keywords":["k"],"slang_expressions":[],"main_questions":["Q?"]},"transcript_text":"[00:00] a"}"#,
    )
    .unwrap();
    assert_eq!(envelope.analysis.summary, "요약");
    assert_eq!(envelope.transcript_text, "[00:00] a");

    match AnalysisEnvelope::from_json_str("Analyze the provided video content") {
        Err(AdminError::Validation(message)) => assert_eq!(message, "Invalid JSON format in analysis data"),
        other => panic!("unexpected result: {:?}", other),
    }
}

/// Records with a line-array transcript render back to one string
#[test]
fn test_transcriptText_withLines_shouldJoinWithNewlines() {
    let record: VideoRecord = serde_json::from_value(json!({
        "videoId": "abcdefghijk",
        "transcript_text": ["[00:00] one", "[00:05] two"]
    }))
    .unwrap();

    assert_eq!(record.transcript_text, TranscriptText::Lines(vec!["[00:00] one".into(), "[00:05] two".into()]));
    assert_eq!(record.transcript_text.joined(), "[00:00] one\n[00:05] two");
    assert!(!record.transcript_text.is_empty());
}

/// An edit touching only the title leaves analysis and transcript alone
#[test]
fn test_videoEdit_titleOnly_shouldNotWriteAnalysis() {
    let edit = VideoEdit {
        title: Some("New title".to_string()),
        ..VideoEdit::default()
    };

    let update = edit.into_update(&Default::default()).unwrap();

    assert_eq!(update.len(), 1);
    assert_eq!(update["youtubeTitle"], "New title");
}

/// Invalid slang JSON rejects the whole edit
#[test]
fn test_videoEdit_withInvalidSlang_shouldFail() {
    let edit = VideoEdit {
        slang_expressions: Some("not json".to_string()),
        ..VideoEdit::default()
    };

    let result = edit.into_update(&Default::default());

    assert!(matches!(result, Err(AdminError::Validation(_))));
}

/// Plans round-trip through their lowercase names
#[test]
fn test_plan_parseAndDisplay_shouldRoundTrip() {
    for plan in Plan::ALL {
        assert_eq!(plan.to_string().parse::<Plan>().unwrap(), plan);
    }
    assert!("Pro".parse::<Plan>().is_err());
}
