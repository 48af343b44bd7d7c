/*!
 * Admin gate.
 *
 * A single credential pair from configuration, and a login session persisted
 * as a small JSON file so consecutive CLI invocations share it.
 */

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_config::{AdminConfig, Config};
use crate::errors::AdminError;
use crate::file_utils::FileManager;

/// The configured admin account
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.email.clone(), config.password.clone())
    }

    /// Both values are set
    pub fn is_configured(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    /// Exact match against both values; an unconfigured account never matches
    pub fn check(&self, email: &str, password: &str) -> bool {
        self.is_configured() && self.email == email && self.password == password
    }
}

/// Persisted session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub admin_logged_in: bool,
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionState {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.admin_logged_in && now < self.expires_at
    }
}

/// File-backed admin session
#[derive(Debug, Clone)]
pub struct AdminSession {
    path: PathBuf,
    max_age: Duration,
}

impl AdminSession {
    pub fn new(path: impl Into<PathBuf>, max_age_secs: u64) -> Self {
        Self {
            path: path.into(),
            max_age: Duration::seconds(i64::try_from(max_age_secs).unwrap_or(i64::MAX / 1000)),
        }
    }

    /// Session at the configured (or default) location
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let path = config.session.resolve_path(&config.database)?;
        Ok(Self::new(path, config.session.max_age_secs))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify credentials and start a new session
    pub fn login(
        &self,
        credentials: &AdminCredentials,
        email: &str,
        password: &str,
    ) -> Result<SessionState, AdminError> {
        self.login_at(credentials, email, password, Utc::now())
    }

    pub fn login_at(
        &self,
        credentials: &AdminCredentials,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionState, AdminError> {
        if !credentials.is_configured() {
            return Err(AdminError::Unauthorized(
                "Admin credentials are not configured".to_string(),
            ));
        }
        if !credentials.check(email, password) {
            warn!("Rejected admin login for {}", email);
            return Err(AdminError::Unauthorized("Invalid credentials".to_string()));
        }

        let state = SessionState {
            admin_logged_in: true,
            email: email.to_string(),
            logged_in_at: now,
            expires_at: now.checked_add_signed(self.max_age).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| AdminError::File(format!("Failed to serialize session: {}", e)))?;
        FileManager::write_to_file(&self.path, &json).map_err(|e| AdminError::File(e.to_string()))?;

        info!("Logged in as {} until {}", email, state.expires_at.to_rfc3339());
        Ok(state)
    }

    /// Clear the session; returns whether one existed
    pub fn logout(&self) -> Result<bool, AdminError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        info!("Logged out");
        Ok(true)
    }

    /// The active session, if any
    pub fn current(&self) -> Result<Option<SessionState>, AdminError> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Result<Option<SessionState>, AdminError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let state = match serde_json::from_str::<SessionState>(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                return Ok(None);
            }
        };

        if !state.is_valid_at(now) {
            debug!("Session expired at {}", state.expires_at.to_rfc3339());
            return Ok(None);
        }

        Ok(Some(state))
    }

    /// Fail with `Unauthorized` unless a session is active
    pub fn require_login(&self) -> Result<SessionState, AdminError> {
        self.require_login_at(Utc::now())
    }

    pub fn require_login_at(&self, now: DateTime<Utc>) -> Result<SessionState, AdminError> {
        self.current_at(now)?.ok_or_else(|| {
            AdminError::Unauthorized("run `ytlearn login` first".to_string())
        })
    }
}
