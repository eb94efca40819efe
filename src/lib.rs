//! fintrack: the client core of a personal finance tracker.
//!
//! The `controller` module holds the stateful pieces (the transaction list, the dashboard and the
//! transaction form) that talk to the finance API through the `api::Gateway` trait. The
//! `commands` module drives them from the CLI.

pub mod api;
pub mod args;
pub mod commands;
mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod model;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use controller::{Dashboard, TransactionForm, TransactionList, Tracker};
pub use error::Error;
pub use error::Result;
