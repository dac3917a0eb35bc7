//! Decoder types and traits

use crate::error::Result;
use crate::http::Response;
use serde::{Deserialize, Serialize};

/// One decoded page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in server order
    pub items: Vec<T>,
    /// Opaque cursor or URL for the next page, if the server sent one
    pub next_cursor: Option<String>,
    /// Total number of results across all pages, if reported
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            total: None,
        }
    }

    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decodes a successful response into a page
///
/// Return [`Error::Protocol`](crate::Error::Protocol) for bodies that do not
/// have the expected shape; those are never retried.
pub trait PageDecoder<T>: Send + Sync {
    fn decode(&self, response: &Response) -> Result<Page<T>>;
}

impl<T, F> PageDecoder<T> for F
where
    F: Fn(&Response) -> Result<Page<T>> + Send + Sync,
{
    fn decode(&self, response: &Response) -> Result<Page<T>> {
        self(response)
    }
}

/// Where a JSON page keeps its parts
///
/// Paths use dot notation with optional array indexing, e.g. `data.items`
/// or `meta.pages[0].next`. A leading `$.` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Path to the item array; `None` means the body itself is the array
    #[serde(default = "default_items_path")]
    pub items_path: Option<String>,
    /// Path to the next-page cursor or URL
    #[serde(default = "default_next_cursor_path")]
    pub next_cursor_path: Option<String>,
    /// Path to the total result count
    #[serde(default = "default_total_path")]
    pub total_path: Option<String>,
    /// Fall back to `Link: <...>; rel="next"` when the body has no cursor
    #[serde(default)]
    pub next_link_header: bool,
}

fn default_items_path() -> Option<String> {
    Some("items".to_string())
}

fn default_next_cursor_path() -> Option<String> {
    Some("next_cursor".to_string())
}

fn default_total_path() -> Option<String> {
    Some("total".to_string())
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            items_path: default_items_path(),
            next_cursor_path: default_next_cursor_path(),
            total_path: default_total_path(),
            next_link_header: false,
        }
    }
}

impl DecoderConfig {
    /// The body is a bare JSON array; no cursor or total in the body
    pub fn bare_array() -> Self {
        Self {
            items_path: None,
            next_cursor_path: None,
            total_path: None,
            next_link_header: false,
        }
    }

    #[must_use]
    pub fn with_items_path(mut self, path: impl Into<String>) -> Self {
        self.items_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_next_cursor_path(mut self, path: impl Into<String>) -> Self {
        self.next_cursor_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_total_path(mut self, path: impl Into<String>) -> Self {
        self.total_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_link_header(mut self) -> Self {
        self.next_link_header = true;
        self
    }
}
