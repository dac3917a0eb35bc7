//! CLI module
//!
//! Thin command-line driver over [`Client`](crate::Client).
//!
//! # Commands
//!
//! - `fetch` - Stream every result of a query as JSON lines
//! - `validate` - Check a client config file and print it with defaults applied

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
