//! Paginator driver
//!
//! Drives the executor page by page and flattens the pages into one lazy
//! stream. Pages are requested strictly in order: page `n + 1` is never
//! requested before page `n` has been fetched, decoded and validated.

use super::strategies::PaginationStrategy;
use super::types::{PageCursor, PageFetch, PageInfo};
use crate::client::Query;
use crate::decode::{Page, PageDecoder};
use crate::error::{Error, Result};
use crate::http::{RequestExecutor, Response};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Iteration state of a result stream
enum State<T> {
    Fetching(PageCursor),
    HasPage {
        items: VecDeque<T>,
        next: Option<PageCursor>,
    },
    Exhausted,
}

/// Fetches the pages of one query
///
/// Finite and not restartable: build a new paginator to scan again.
pub struct Paginator<T> {
    executor: Arc<RequestExecutor>,
    query: Query,
    strategy: Arc<dyn PaginationStrategy>,
    decoder: Arc<dyn PageDecoder<T>>,
    page_size: u32,
    skip: u64,
    discard: u64,
    next_index: u64,
}

impl<T: Send + 'static> Paginator<T> {
    /// Create a paginator that skips `skip` leading items
    pub fn new(
        executor: Arc<RequestExecutor>,
        query: Query,
        strategy: Arc<dyn PaginationStrategy>,
        decoder: Arc<dyn PageDecoder<T>>,
        page_size: u32,
        skip: u64,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::precondition("page size must be positive"));
        }
        let discard = strategy.start(skip, page_size).discard;
        Ok(Self {
            executor,
            query,
            strategy,
            decoder,
            page_size,
            skip,
            discard,
            next_index: 0,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Cursor for the first page
    pub fn first_cursor(&self) -> PageCursor {
        let start = self.strategy.start(self.skip, self.page_size);
        PageCursor {
            index: 0,
            position: start.position,
            seen: start.seen,
        }
    }

    /// Fetch the page `cursor` points at
    ///
    /// `cursor` must be the next one in sequence: the first cursor, or the
    /// `next` of the last page fetched. Anything else is a precondition
    /// violation and sends no request. A failed fetch may be repeated with
    /// the same cursor.
    pub async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<PageFetch<T>> {
        if cursor.index != self.next_index {
            return Err(Error::precondition(format!(
                "cursor for page {} used when page {} is next",
                cursor.index, self.next_index
            )));
        }

        let index = cursor.index;
        let page = self.load(cursor).await.map_err(|e| Error::Page {
            index,
            source: Box::new(e),
        })?;

        let count = page.items.len() as u64;
        let seen = cursor.seen + count;
        let next = if self.is_last(&page, seen) {
            None
        } else {
            let info = PageInfo {
                count,
                next_cursor: page.next_cursor.as_deref(),
                total: page.total,
            };
            self.strategy
                .next(cursor.position.as_ref(), &info)
                .filter(|position| Some(position) != cursor.position.as_ref())
                .map(|position| PageCursor {
                    index: index + 1,
                    position: Some(position),
                    seen,
                })
        };

        let total = page.total;
        let mut items = page.items;
        if self.discard > 0 {
            let n = usize::try_from(self.discard).map_or(items.len(), |d| d.min(items.len()));
            items.drain(..n);
            self.discard -= n as u64;
        }

        self.next_index += 1;
        debug!(
            page = index,
            items = items.len(),
            last = next.is_none(),
            "Fetched page of {}",
            self.query.endpoint()
        );

        Ok(PageFetch {
            index,
            items,
            next,
            total,
        })
    }

    /// Flatten every remaining page into one stream of items
    ///
    /// A failure is yielded once, in place of the items of the failing page,
    /// and ends the stream. Dropping the stream stops all further requests.
    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        let start = State::Fetching(self.first_cursor());

        stream::try_unfold((self, start), |(paginator, state)| paginator.advance(state)).boxed()
    }

    /// Produce the next item, fetching pages as needed
    async fn advance(mut self, mut state: State<T>) -> Result<Option<(T, (Self, State<T>))>> {
        loop {
            state = match state {
                State::Exhausted => return Ok(None),
                State::HasPage { mut items, next } => match items.pop_front() {
                    Some(item) => return Ok(Some((item, (self, State::HasPage { items, next })))),
                    None => next.map_or(State::Exhausted, State::Fetching),
                },
                State::Fetching(cursor) => {
                    let fetch = self.fetch_page(&cursor).await?;
                    if fetch.is_last() {
                        info!(
                            pages = fetch.index + 1,
                            "Finished paging {}",
                            self.query.endpoint()
                        );
                    }
                    State::HasPage {
                        items: fetch.items.into(),
                        next: fetch.next,
                    }
                }
            };
        }
    }

    async fn load(&self, cursor: &PageCursor) -> Result<Page<T>> {
        let build = || {
            let mut request = self.query.build_request()?;
            self.strategy
                .apply(cursor.position.as_ref(), self.page_size, &mut request)?;
            Ok(request)
        };

        let decode = |response: &Response| {
            let page = self.decoder.decode(response)?;
            self.check_page(&page, cursor.seen)?;
            Ok(page)
        };

        self.executor
            .execute(self.query.endpoint(), build, decode)
            .await
    }

    /// A page is last if it is empty, short, reaches the total, or has no
    /// successor.
    fn is_last(&self, page: &Page<T>, seen: u64) -> bool {
        let count = page.items.len() as u64;
        count == 0
            || (self.strategy.honors_page_size() && count < u64::from(self.page_size))
            || page.total.is_some_and(|total| seen >= total)
    }

    /// Reject an interior page that holds fewer items than the total implies
    fn check_page(&self, page: &Page<T>, seen: u64) -> Result<()> {
        if !self.strategy.honors_page_size() {
            return Ok(());
        }
        let Some(total) = page.total else {
            return Ok(());
        };
        if seen >= total {
            return Ok(());
        }

        let expected = (total - seen).min(u64::from(self.page_size));
        let actual = page.items.len() as u64;
        if actual < expected {
            return Err(Error::UnexpectedPage { expected, actual });
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("query", &self.query)
            .field("strategy", &self.strategy)
            .field("page_size", &self.page_size)
            .field("skip", &self.skip)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}
