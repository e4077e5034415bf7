// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The signed-in user's token and cached profile.
//!
//! The session is kept in memory behind a lock and, when a storage directory
//! is configured, mirrored to a JSON file so it survives restarts.
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE_NAME: &str = "session.json";

/// Cached profile of the signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct SessionData {
    auth_token: Option<String>,
    user: Option<SessionUser>,
}

#[derive(Debug, Default)]
pub struct Session {
    data: RwLock<SessionData>,
    path: Option<PathBuf>,
}

// Function to load the session from a JSON file
fn load_session(path: &Path) -> Result<SessionData, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(SessionData::default());
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

// Function to save the session to a JSON file
fn save_session(path: &Path, session: &SessionData) -> Result<(), Box<dyn std::error::Error>> {
    let parent_dir = path.parent().ok_or("Invalid path for session file")?;
    fs::create_dir_all(parent_dir)?;

    let data = serde_json::to_string_pretty(session)?;
    fs::write(path, data)?;
    Ok(())
}

impl Session {
    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A session stored as `session.json` inside `dir`. A missing or
    /// unreadable file starts a signed-out session.
    pub fn persistent(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(SESSION_FILE_NAME);
        let data = load_session(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "Could not load session file {}: {}. Starting signed out.",
                path.display(),
                e
            );
            SessionData::default()
        });
        Self {
            data: RwLock::new(data),
            path: Some(path),
        }
    }

    fn persist(&self, data: &SessionData) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = save_session(path, data) {
            tracing::error!("Error saving session to {}: {}", path.display(), e);
        }
    }

    /// Stores the token and user returned by the login endpoint.
    pub fn sign_in(&self, auth_token: String, user: SessionUser) {
        let mut data = self.data.write();
        data.auth_token = Some(auth_token);
        data.user = Some(user);
        self.persist(&data);
    }

    /// Forgets the token and user, including the stored copy.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = SessionData::default();
        if let Some(path) = &self.path {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    tracing::error!("Error removing session file {}: {}", path.display(), e);
                }
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.data.read().auth_token.clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.data.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.read().auth_token.is_some()
    }
}
