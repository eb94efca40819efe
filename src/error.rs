//! The crate error type and the tags used to tell user-facing failures apart.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure that reached the user. Presentation uses this to decide between an error
/// panel with a retry, a transient notification, or an inline form message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Loading transactions, a summary or a history failed.
    FetchFailed,
    /// The gateway refused or failed a delete.
    DeleteFailed,
    /// The gateway refused or failed a create.
    CreateFailed,
    /// Local validation rejected the input before any network call.
    ValidationFailed,
    /// There is no signed-in user.
    Unauthenticated,
    /// The home directory or its configuration is missing or invalid.
    Config,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error that carries an `ErrorType` alongside its message.
#[derive(Debug)]
pub struct TaggedError {
    error_type: ErrorType,
    message: String,
}

impl TaggedError {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for TaggedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TaggedError {}

/// Attaches an `ErrorType` to a failed result so callers further up can recover it with
/// `error_type`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let e: anyhow::Error = e.into();
            // Keep the whole chain in the message since the tag replaces the root cause.
            anyhow::Error::new(TaggedError::new(error_type, format!("{e:#}")))
        })
    }
}

/// Creates a tagged error from a message.
pub fn tagged(error_type: ErrorType, message: impl Into<String>) -> Error {
    anyhow::Error::new(TaggedError::new(error_type, message))
}

/// Finds the `ErrorType` attached anywhere in the chain of `err`, if any.
pub fn error_type(err: &Error) -> Option<ErrorType> {
    err.chain()
        .find_map(|e| e.downcast_ref::<TaggedError>())
        .map(TaggedError::error_type)
}
