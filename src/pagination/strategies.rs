//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern. A strategy only knows
//! how to turn a [`Position`] into request parameters and how to find the
//! next position; exhaustion and validation live in the paginator.

use super::types::{PageInfo, Position, StartPoint};
use crate::error::{Error, Result};
use crate::http::RequestSpec;
use std::fmt::Debug;

/// One API's pagination convention
pub trait PaginationStrategy: Send + Sync + Debug {
    /// Where to start for a caller that wants to skip `skip` items
    fn start(&self, skip: u64, page_size: u32) -> StartPoint;

    /// Put `position` and the page size onto a freshly built request
    fn apply(&self, position: Option<&Position>, page_size: u32, request: &mut RequestSpec)
        -> Result<()>;

    /// Position of the page after `current`, if the strategy can tell
    fn next(&self, current: Option<&Position>, page: &PageInfo<'_>) -> Option<Position>;

    /// Whether the server is told the page size, so a short page means the end
    fn honors_page_size(&self) -> bool {
        true
    }
}

fn unexpected(strategy: &str, position: &Position) -> Error {
    Error::precondition(format!("{strategy} pagination cannot resume from {position}"))
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination (e.g., SQL-style pagination)
///
/// Common patterns:
/// - `?offset=100&limit=50`
/// - `?skip=100&take=50`
///
/// Seeks directly to the page-aligned offset at or below the caller's skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPagination {
    /// Query parameter name for offset
    pub offset_param: String,
    /// Query parameter name for limit
    pub limit_param: String,
}

impl OffsetPagination {
    pub fn new(offset_param: impl Into<String>, limit_param: impl Into<String>) -> Self {
        Self {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
        }
    }
}

impl PaginationStrategy for OffsetPagination {
    fn start(&self, skip: u64, page_size: u32) -> StartPoint {
        let aligned = skip - skip % u64::from(page_size);
        StartPoint {
            position: Some(Position::Offset(aligned)),
            seen: aligned,
            discard: skip - aligned,
        }
    }

    fn apply(
        &self,
        position: Option<&Position>,
        page_size: u32,
        request: &mut RequestSpec,
    ) -> Result<()> {
        let offset = match position {
            None => 0,
            Some(Position::Offset(offset)) => *offset,
            Some(other) => return Err(unexpected("offset", other)),
        };
        request
            .query
            .insert(self.offset_param.clone(), offset.to_string());
        request
            .query
            .insert(self.limit_param.clone(), page_size.to_string());
        Ok(())
    }

    fn next(&self, current: Option<&Position>, page: &PageInfo<'_>) -> Option<Position> {
        let offset = match current {
            Some(Position::Offset(offset)) => *offset,
            _ => 0,
        };
        Some(Position::Offset(offset + page.count))
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Common patterns:
/// - `?page=2`
/// - `?page=2&per_page=100`
///
/// Seeks to the page holding the caller's skip only when the page size is
/// sent; otherwise skipped items are discarded from the leading pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumberPagination {
    /// Query parameter name for page number
    pub page_param: String,
    /// Optional page size parameter name
    pub size_param: Option<String>,
    /// First page number (usually 0 or 1)
    pub start_page: u64,
}

impl PaginationStrategy for PageNumberPagination {
    fn start(&self, skip: u64, page_size: u32) -> StartPoint {
        // The server's page size is unknown, so there is nothing to seek by
        if self.size_param.is_none() {
            return StartPoint {
                position: Some(Position::Page(self.start_page)),
                seen: 0,
                discard: skip,
            };
        }

        let pages = skip / u64::from(page_size);
        let aligned = pages * u64::from(page_size);
        StartPoint {
            position: Some(Position::Page(self.start_page + pages)),
            seen: aligned,
            discard: skip - aligned,
        }
    }

    fn apply(
        &self,
        position: Option<&Position>,
        page_size: u32,
        request: &mut RequestSpec,
    ) -> Result<()> {
        let page = match position {
            None => self.start_page,
            Some(Position::Page(page)) => *page,
            Some(other) => return Err(unexpected("page number", other)),
        };
        request
            .query
            .insert(self.page_param.clone(), page.to_string());
        if let Some(ref param) = self.size_param {
            request.query.insert(param.clone(), page_size.to_string());
        }
        Ok(())
    }

    fn next(&self, current: Option<&Position>, _page: &PageInfo<'_>) -> Option<Position> {
        let page = match current {
            Some(Position::Page(page)) => *page,
            _ => self.start_page,
        };
        Some(Position::Page(page + 1))
    }

    fn honors_page_size(&self) -> bool {
        self.size_param.is_some()
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination (e.g., Stripe, Slack)
///
/// Uses a cursor value from the previous page to fetch the next one. Cannot
/// seek, so a caller-level skip is discarded from the leading pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPagination {
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// Optional page size parameter name
    pub limit_param: Option<String>,
}

impl PaginationStrategy for CursorPagination {
    fn start(&self, skip: u64, _page_size: u32) -> StartPoint {
        StartPoint {
            position: None,
            seen: 0,
            discard: skip,
        }
    }

    fn apply(
        &self,
        position: Option<&Position>,
        page_size: u32,
        request: &mut RequestSpec,
    ) -> Result<()> {
        match position {
            None => {}
            Some(Position::Token(token)) => {
                request.query.insert(self.cursor_param.clone(), token.clone());
            }
            Some(other) => return Err(unexpected("cursor", other)),
        }
        if let Some(ref param) = self.limit_param {
            request.query.insert(param.clone(), page_size.to_string());
        }
        Ok(())
    }

    fn next(&self, _current: Option<&Position>, page: &PageInfo<'_>) -> Option<Position> {
        page.next_cursor.map(|token| Position::Token(token.to_string()))
    }

    fn honors_page_size(&self) -> bool {
        self.limit_param.is_some()
    }
}

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Next URL pagination
///
/// The decoded page's cursor is the full URL of the next page, taken from a
/// body field or the `Link` header. Common patterns:
/// - `{ "next": "https://api.example.com/items?page=2" }`
/// - `Link: <https://api.example.com/items?page=2>; rel="next"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUrlPagination {
    /// Page size parameter sent on the first request only
    pub size_param: Option<String>,
}

impl PaginationStrategy for NextUrlPagination {
    fn start(&self, skip: u64, _page_size: u32) -> StartPoint {
        StartPoint {
            position: None,
            seen: 0,
            discard: skip,
        }
    }

    fn apply(
        &self,
        position: Option<&Position>,
        page_size: u32,
        request: &mut RequestSpec,
    ) -> Result<()> {
        match position {
            None => {
                if let Some(ref param) = self.size_param {
                    request.query.insert(param.clone(), page_size.to_string());
                }
            }
            Some(Position::Url(next)) => {
                // The next URL already carries every parameter the server needs.
                request.url = request
                    .url
                    .join(next)
                    .map_err(|e| Error::protocol(format!("invalid next page URL '{next}': {e}")))?;
                request.query.clear();
            }
            Some(other) => return Err(unexpected("next URL", other)),
        }
        Ok(())
    }

    fn next(&self, _current: Option<&Position>, page: &PageInfo<'_>) -> Option<Position> {
        page.next_cursor.map(|url| Position::Url(url.to_string()))
    }

    fn honors_page_size(&self) -> bool {
        self.size_param.is_some()
    }
}
