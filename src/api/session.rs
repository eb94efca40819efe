//! The identity provider: who is signed in, and the bearer token used to call the API on their
//! behalf.
//!
//! The core never looks the session up on its own. Commands receive an `IdentityProvider`,
//! read the current user from it, and hand the token to the `Gateway`.

use crate::api::File;
use crate::error::{tagged, ErrorType};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }
}

/// What the rest of the app gets to know about the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    user: Option<User>,
    is_loading: bool,
    last_error: Option<String>,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the signed-in user or an `Unauthenticated` error.
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or_else(|| {
            tagged(
                ErrorType::Unauthenticated,
                "Nobody is signed in, run 'fintrack login' first",
            )
        })
    }
}

/// A source of the current user, with actions to sign in and out.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    fn state(&self) -> &SessionState;

    /// The bearer token of the signed-in user, if any.
    fn token(&self) -> Option<String>;

    async fn sign_in(&mut self, user: User, token: String) -> Result<()>;

    async fn sign_out(&mut self) -> Result<()>;
}

/// The on-disk format of the session file.
///
/// Example:
/// ```json
/// {
///   "user": { "uid": "Xk2pQ9", "displayName": "Maria", "email": "maria@example.com" },
///   "token": "eyJhbGciOiJSUzI1NiIs..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionFile {
    user: User,
    token: String,
}

/// An `IdentityProvider` that remembers the signed-in user in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
    state: SessionState,
    token: Option<String>,
}

impl FileSession {
    /// Reads the session from `path`. A missing file means nobody is signed in. An unreadable file
    /// also means nobody is signed in, and the reason is kept in `last_error`.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut session = Self {
            path,
            state: SessionState::default(),
            token: None,
        };
        if !session.path.is_file() {
            debug!("No session file at {}", session.path.display());
            return session;
        }
        match File::<SessionFile>::load(&session.path).await {
            Ok(file) => {
                let data = file.data().clone();
                session.state.user = Some(data.user);
                session.token = Some(data.token);
            }
            Err(e) => {
                warn!("Ignoring the unreadable session file: {e:#}");
                session.state.last_error = Some(format!("{e:#}"));
            }
        }
        session
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FileSession {
    fn state(&self) -> &SessionState {
        &self.state
    }

    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn sign_in(&mut self, user: User, token: String) -> Result<()> {
        self.state.is_loading = true;
        let file = File::new(
            &self.path,
            SessionFile {
                user: user.clone(),
                token: token.clone(),
            },
        );
        let result = file.save().await.context("Unable to save the session");
        self.state.is_loading = false;
        match result {
            Ok(()) => {
                self.state.user = Some(user);
                self.state.last_error = None;
                self.token = Some(token);
                Ok(())
            }
            Err(e) => {
                self.state.last_error = Some(format!("{e:#}"));
                Err(e)
            }
        }
    }

    async fn sign_out(&mut self) -> Result<()> {
        self.state.is_loading = true;
        let result = if self.path.is_file() {
            tokio::fs::remove_file(&self.path)
                .await
                .with_context(|| format!("Unable to remove {}", self.path.display()))
        } else {
            Ok(())
        };
        self.state.is_loading = false;
        match result {
            Ok(()) => {
                self.state.user = None;
                self.state.last_error = None;
                self.token = None;
                Ok(())
            }
            Err(e) => {
                self.state.last_error = Some(format!("{e:#}"));
                Err(e)
            }
        }
    }
}
