//! Page decoder module
//!
//! # Overview
//!
//! Turns a successful [`Response`](crate::http::Response) into a typed
//! [`Page`]: the items of that page, an optional next-page cursor and an
//! optional total result count. The paginator never looks at raw bodies; it
//! only sees what a [`PageDecoder`] hands back.

mod decoders;
mod types;

pub use decoders::{extract_path, parse_link_header, JsonPageDecoder};
pub use types::{DecoderConfig, Page, PageDecoder};
