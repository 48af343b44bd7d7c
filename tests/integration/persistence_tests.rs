/*!
 * Tests for on-disk state: the document database file and the admin session
 */

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use ytlearn::app_controller::AdminController;
use ytlearn::auth::{AdminCredentials, AdminSession};
use ytlearn::database::{DatabaseConnection, DocumentStore, Repository};
use ytlearn::errors::AdminError;
use ytlearn::models::{NewVideo, Plan, VIDEOS_COLLECTION};
use ytlearn::providers::mock::MockAnalyzer;
use crate::common::{self, SAMPLE_VIDEO_ID};

fn file_controller(db_path: &std::path::Path) -> Result<AdminController> {
    let db = DatabaseConnection::new(db_path)?;
    Ok(AdminController::new(
        Arc::new(Repository::new(db)),
        Arc::new(common::mock_video_source()),
        Arc::new(MockAnalyzer::working()),
    ))
}

/// Records written through one connection are visible after reopening the file
#[tokio::test]
async fn test_fileDatabase_shouldPersistAcrossConnections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("data").join("ytlearn.db");

    {
        let controller = file_controller(&db_path)?;
        controller.setup_database().await?;
        controller
            .register_video(NewVideo {
                video_id: SAMPLE_VIDEO_ID.to_string(),
                title: Some("Never Gonna Give You Up".to_string()),
                duration: Some(213),
                ..NewVideo::default()
            })
            .await?;
        controller.update_plan("sample-user", "plus").await?;
    }

    assert!(db_path.exists());

    let controller = file_controller(&db_path)?;
    let videos = controller.list_videos().await?;
    assert_eq!(videos.len(), 2);
    assert_eq!(controller.get_video(SAMPLE_VIDEO_ID).await?.duration, 213);
    assert_eq!(controller.list_users().await?[0].plan, Plan::Plus);

    let check = controller.check_database().await?;
    assert_eq!(check.location, db_path.display().to_string());
    assert_eq!(check.stats.count_for(VIDEOS_COLLECTION), 2);
    Ok(())
}

/// Raw repository writes keep creation time and bump update time
#[test]
fn test_repository_update_shouldKeepCreatedAt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repo = Repository::new(DatabaseConnection::new(temp_dir.path().join("store.db"))?);

    let (created, updated) = tokio_test::block_on(async {
        let mut data = serde_json::Map::new();
        data.insert("plan".to_string(), "free".into());
        repo.set("users", "u1", data).await?;
        let created = repo.get("users", "u1").await?.expect("document should exist");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut fields = serde_json::Map::new();
        fields.insert("plan".to_string(), "pro".into());
        let updated = repo.update("users", "u1", fields).await?;

        Ok::<_, anyhow::Error>((created, updated))
    })?;

    assert_eq!(updated.created_at, created.created_at);
    assert_ne!(updated.updated_at, created.updated_at);
    assert_eq!(updated.data["plan"], "pro");
    Ok(())
}

/// Login writes a session file that later invocations can read
#[test]
fn test_adminSession_loginThenRequireLogin_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let session_path = temp_dir.path().join("state").join("session.json");
    let credentials = AdminCredentials::new("admin@example.com", "hunter2");

    let session = AdminSession::new(&session_path, 3600);
    session.login(&credentials, "admin@example.com", "hunter2")?;

    let reopened = AdminSession::new(&session_path, 3600);
    let state = reopened.require_login()?;
    assert!(state.admin_logged_in);
    assert_eq!(state.email, "admin@example.com");

    let later = Utc::now() + Duration::hours(2);
    assert!(matches!(reopened.require_login_at(later), Err(AdminError::Unauthorized(_))));

    assert!(reopened.logout()?);
    assert!(!session_path.exists());
    assert!(reopened.current()?.is_none());
    Ok(())
}

/// A rejected login leaves no session behind
#[test]
fn test_adminSession_withWrongPassword_shouldNotWriteFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let session_path = temp_dir.path().join("session.json");
    let session = AdminSession::new(&session_path, 3600);

    let result = session.login(&AdminCredentials::new("admin@example.com", "hunter2"), "admin@example.com", "guess");

    assert!(matches!(result, Err(AdminError::Unauthorized(_))));
    assert!(!session_path.exists());
    assert!(!session.logout()?);
    Ok(())
}
