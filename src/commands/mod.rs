//! Command handlers for the fintrack CLI.
//!
//! This module contains implementations for all CLI subcommands. Each one returns an `Out` that
//! `main` prints.

mod auth;
mod browse;
mod dashboard;
mod init;
mod render;
mod transactions;

use crate::api::{self, FileSession, Gateway, IdentityProvider, Mode};
use crate::args::PeriodArgs;
use crate::model::PeriodCursor;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

pub use auth::{login, logout, whoami};
pub use browse::{browse, browse_with};
pub use dashboard::dashboard;
pub use init::init;
pub use transactions::{categories, create, delete, transactions};

/// The output type for a command. This allows the command to return a consistent message,
/// optionally structured data, and optionally a table meant for the terminal.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// A rendering of the data for humans, printed to stdout.
    #[serde(skip)]
    table: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            table: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            table: None,
        }
    }

    pub fn with_table(mut self, table: String) -> Self {
        self.table = Some(table);
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Print the table (if it exists) to stdout, the message to `info!` and the structured data
    /// (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        if let Some(table) = self.table() {
            println!("{table}");
        }
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the session, requires a signed-in user and creates the gateway that acts on their
/// behalf.
async fn signed_in_gateway(config: &Config, mode: Mode) -> Result<Arc<dyn Gateway>> {
    let session = FileSession::load(config.session_path()).await;
    let user = session.state().require_user()?;
    debug!("Signed in as {}", user.uid());
    api::gateway(config, session.token(), mode)
}

/// Starts at today's month, then applies whatever the arguments select.
fn cursor_for(args: &PeriodArgs) -> Result<PeriodCursor> {
    let mut cursor = PeriodCursor::now();
    if let Some(year) = args.year() {
        cursor.set_year(year);
    }
    if let Some(month) = args.month() {
        cursor.set_month(month)?;
    }
    Ok(cursor)
}

/// Writes `question` and reads a yes or no answer from `input`. Anything but yes is a no,
/// including the end of input.
async fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(output, "{question} [s/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).await?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    ))
}
