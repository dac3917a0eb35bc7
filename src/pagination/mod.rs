//! Pagination module
//!
//! Supports: Offset, Page Number, Cursor, Next URL (body field or Link header)
//!
//! # Overview
//!
//! A [`PaginationStrategy`] knows one API's paging convention. The
//! [`Paginator`] drives the request executor with it, decides when the result
//! set is exhausted, validates page sizes against the reported total and
//! flattens the pages into a single lazy stream of items.
//!
//! A page is the last one when it is empty, when it holds fewer items than
//! the page size, when it reaches the reported total, or when the strategy
//! finds no next position. Without a total, a result set that is an exact
//! multiple of the page size costs one extra request answered by an empty
//! page.

mod paginator;
mod strategies;
mod types;

pub use paginator::Paginator;
pub use strategies::{
    CursorPagination, NextUrlPagination, OffsetPagination, PageNumberPagination,
    PaginationStrategy,
};
pub use types::{PageCursor, PageFetch, PageInfo, PaginationConfig, Position, StartPoint};

#[cfg(test)]
mod tests;
