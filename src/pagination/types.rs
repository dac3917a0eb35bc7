//! Pagination types
//!
//! A [`PageCursor`] says where page `index` starts. It is produced by the
//! paginator after each successful fetch and is only valid for fetching the
//! page right after the last one fetched.

use super::strategies::{
    CursorPagination, NextUrlPagination, OffsetPagination, PageNumberPagination,
    PaginationStrategy,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a page starts, in the vocabulary of one pagination strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Position {
    /// Absolute item offset
    Offset(u64),
    /// Page number
    Page(u64),
    /// Opaque server token
    Token(String),
    /// Fully-formed URL of the next page
    Url(String),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "offset {offset}"),
            Self::Page(page) => write!(f, "page {page}"),
            Self::Token(token) => write!(f, "cursor {token}"),
            Self::Url(url) => write!(f, "url {url}"),
        }
    }
}

/// Where the first request starts for a caller-level skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPoint {
    /// Position of the first page; `None` asks for the server's first page
    pub position: Option<Position>,
    /// Absolute index of the first item on that page
    pub seen: u64,
    /// Leading items still to drop from that page onward
    pub discard: u64,
}

/// What the strategy needs to know about a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo<'a> {
    /// Items on the page
    pub count: u64,
    /// Cursor or URL the server sent for the next page
    pub next_cursor: Option<&'a str>,
    /// Reported total result count
    pub total: Option<u64>,
}

/// Resume point for page `index`
///
/// Opaque to callers: obtain one from [`Paginator::first_cursor`] or from the
/// `next` field of the previous [`PageFetch`].
///
/// [`Paginator::first_cursor`]: super::Paginator::first_cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub(crate) index: u64,
    pub(crate) position: Option<Position>,
    pub(crate) seen: u64,
}

impl PageCursor {
    /// Zero-based page index this cursor fetches
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Absolute index of the first item on the page
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

/// One page fetched through [`Paginator::fetch_page`](super::Paginator::fetch_page)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch<T> {
    /// Zero-based page index
    pub index: u64,
    /// Items on the page, with any caller-level skip already applied
    pub items: Vec<T>,
    /// Cursor for the next page; `None` once the result set is exhausted
    pub next: Option<PageCursor>,
    /// Reported total result count
    pub total: Option<u64>,
}

impl<T> PageFetch<T> {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// How an API pages its results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// `?offset=20&limit=10`
    Offset {
        #[serde(default = "default_offset_param")]
        offset_param: String,
        #[serde(default = "default_limit_param")]
        limit_param: String,
    },

    /// `?page=3&per_page=10`
    PageNumber {
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default = "default_size_param")]
        size_param: Option<String>,
        /// First page number (usually 0 or 1)
        #[serde(default = "default_start_page")]
        start_page: u64,
    },

    /// `?cursor=<token from the previous page>&limit=10`
    Cursor {
        #[serde(default = "default_cursor_param")]
        cursor_param: String,
        #[serde(default = "default_cursor_limit_param")]
        limit_param: Option<String>,
    },

    /// Follow the next-page URL from the body or the `Link` header
    NextUrl {
        /// Page size parameter sent on the first request only
        #[serde(default)]
        size_param: Option<String>,
    },
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_size_param() -> Option<String> {
    Some("per_page".to_string())
}

fn default_start_page() -> u64 {
    1
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

fn default_cursor_limit_param() -> Option<String> {
    Some("limit".to_string())
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::Offset {
            offset_param: default_offset_param(),
            limit_param: default_limit_param(),
        }
    }
}

impl PaginationConfig {
    /// Offset pagination with the default parameter names
    pub fn offset() -> Self {
        Self::default()
    }

    /// Page number pagination with the default parameter names
    pub fn page_number() -> Self {
        Self::PageNumber {
            page_param: default_page_param(),
            size_param: default_size_param(),
            start_page: default_start_page(),
        }
    }

    /// Cursor pagination with the default parameter names
    pub fn cursor() -> Self {
        Self::Cursor {
            cursor_param: default_cursor_param(),
            limit_param: default_cursor_limit_param(),
        }
    }

    /// Next URL pagination
    pub fn next_url() -> Self {
        Self::NextUrl { size_param: None }
    }

    /// Build the strategy this config describes
    pub fn build(&self) -> Arc<dyn PaginationStrategy> {
        match self {
            Self::Offset {
                offset_param,
                limit_param,
            } => Arc::new(OffsetPagination::new(offset_param, limit_param)),
            Self::PageNumber {
                page_param,
                size_param,
                start_page,
            } => Arc::new(PageNumberPagination {
                page_param: page_param.clone(),
                size_param: size_param.clone(),
                start_page: *start_page,
            }),
            Self::Cursor {
                cursor_param,
                limit_param,
            } => Arc::new(CursorPagination {
                cursor_param: cursor_param.clone(),
                limit_param: limit_param.clone(),
            }),
            Self::NextUrl { size_param } => Arc::new(NextUrlPagination {
                size_param: size_param.clone(),
            }),
        }
    }
}
