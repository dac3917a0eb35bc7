// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagewise
//!
//! A resilient client core for paginated HTTP APIs: client-side pacing,
//! retries with backoff, and pagination flattened into one lazy stream.
//!
//! ## Features
//!
//! - **Pacing**: a minimum gap between request starts, shared by every query on a client
//! - **Retries**: 5xx, throttling and transport failures retried with backoff; 4xx never
//! - **Pagination**: offset, page number, cursor and next-URL/Link-header APIs
//! - **Typed pages**: items decoded with serde, invalid bodies surfaced as protocol errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use pagewise::{Client, ClientConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder("https://api.example.com/v1")
//!         .page_size(50)
//!         .min_request_interval(std::time::Duration::from_millis(250))
//!         .build()?;
//!     let client = Client::new(config)?;
//!
//!     let query = client.get("/orgs/{org}/repos")?.path_param("org", "rust-lang");
//!     let mut repos = client.results::<serde_json::Value>(&query, 0);
//!     while let Some(repo) = repos.next().await {
//!         println!("{}", repo?["name"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client ──▶ Paginator ──▶ RequestExecutor ──▶ RateLimiter (gate)
//!                │                │
//!           PageDecoder           ├──▶ Transport (reqwest)
//!                                 └──▶ RetryPolicy (decide / sleep via Clock)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Time source used for pacing and backoff
pub mod clock;

/// Credentials applied to outbound requests
pub mod auth;

/// Transport, rate limiting, retry and request execution
pub mod http;

/// Page decoding
pub mod decode;

/// Pagination strategies and the paginator
pub mod pagination;

/// Client configuration
pub mod config;

/// Client facade
pub mod client;

/// Path template rendering
pub mod template;

/// Scripted transport and dataset doubles
pub mod testing;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{Client, Query};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use decode::{JsonPageDecoder, Page, PageDecoder};
pub use http::{Endpoint, RequestExecutor, RetryPolicy};
pub use pagination::{PageCursor, PageFetch, PaginationConfig, Paginator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
