//! Authentication state
//!
//! Holds the bearer token and the cached current user. A session created
//! with [`Session::restore`] is backed by a JSON file so a login survives
//! between CLI invocations; [`Session::anonymous`] lives only in memory.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillcoach_common::api::{Token, User};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// On-disk session format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    token_type: String,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Shared auth state used by the API client
#[derive(Debug)]
pub struct Session {
    path: Option<PathBuf>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Empty, memory-only session
    pub fn anonymous() -> Self {
        Self {
            path: None,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Load a saved session from `path`; an absent file gives an empty session.
    ///
    /// An unreadable or corrupt file is logged and ignored (the user simply has
    /// to log in again).
    pub async fn restore(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut state = SessionState::default();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<StoredSession>(&content) {
                Ok(stored) => {
                    debug!(path = %path.display(), saved_at = %stored.saved_at, "Restored session");
                    state.token = Some(stored.access_token);
                    state.user = stored.user;
                }
                Err(e) => warn!("Ignoring corrupt session file {}: {}", path.display(), e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No saved session");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Admin console access, from the cached user
    pub async fn is_admin(&self) -> bool {
        self.state
            .read()
            .await
            .user
            .as_ref()
            .map(User::is_admin)
            .unwrap_or(false)
    }

    /// Store a freshly issued token; drops any cached user
    pub async fn set_token(&self, token: Token) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.token = Some(token.access_token);
            state.user = None;
        }
        self.persist().await
    }

    /// Cache the user returned by `/auth/me`
    pub async fn set_user(&self, user: User) -> Result<()> {
        self.state.write().await.user = Some(user);
        self.persist().await
    }

    /// Forget the token after the backend rejected it (HTTP 401).
    ///
    /// Only memory is cleared; the file is replaced on the next login.
    pub async fn expire(&self) {
        let mut state = self.state.write().await;
        if state.token.take().is_some() {
            info!("Session expired, please log in again");
        }
        state.user = None;
    }

    /// Log out: clear memory and delete the session file
    pub async fn clear(&self) -> Result<()> {
        *self.state.write().await = SessionState::default();
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed session file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stored = {
            let state = self.state.read().await;
            let Some(token) = state.token.clone() else {
                return Ok(());
            };
            StoredSession {
                access_token: token,
                token_type: "bearer".to_string(),
                saved_at: Utc::now(),
                user: state.user.clone(),
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(&stored)?).await?;
        restrict_permissions(path).await?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
