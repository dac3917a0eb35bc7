//! Tests for the pagination module

use super::*;
use crate::client::Query;
use crate::clock::MockClock;
use crate::decode::{DecoderConfig, JsonPageDecoder, PageDecoder};
use crate::error::{Error, Result};
use crate::http::{Endpoint, Headers, RequestExecutor, RequestSpec, Response, RetryPolicy};
use crate::testing::{MockDataset, MockTransport};
use crate::types::Method;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Item {
    id: u64,
}

struct Harness {
    transport: Arc<MockTransport>,
    clock: Arc<MockClock>,
    executor: Arc<RequestExecutor>,
}

impl Harness {
    fn new(build: impl FnOnce(Arc<MockClock>) -> MockTransport) -> Self {
        let clock = Arc::new(MockClock::new());
        let transport = Arc::new(build(clock.clone()));
        let executor = Arc::new(
            RequestExecutor::new(transport.clone(), clock.clone())
                .with_policy(RetryPolicy::new(3, Duration::from_secs(1))),
        );
        Self {
            transport,
            clock,
            executor,
        }
    }

    fn dataset(dataset: MockDataset) -> Self {
        Self::new(|clock| dataset.into_transport(clock))
    }

    fn paginator(
        &self,
        config: &PaginationConfig,
        decoder: DecoderConfig,
        page_size: u32,
        skip: u64,
    ) -> Paginator<Item> {
        let decoder: Arc<dyn PageDecoder<Item>> = Arc::new(JsonPageDecoder::<Item>::new(decoder));
        Paginator::new(
            self.executor.clone(),
            query(),
            config.build(),
            decoder,
            page_size,
            skip,
        )
        .unwrap()
    }

    fn offsets(&self) -> Vec<Option<String>> {
        self.transport
            .requests()
            .iter()
            .map(|r| r.query("offset").map(str::to_string))
            .collect()
    }
}

fn query() -> Query {
    Query::new(Endpoint::get("http://mock.local", "/items").unwrap())
}

fn ids(items: &[Item]) -> Vec<u64> {
    items.iter().map(|item| item.id).collect()
}

async fn collect(paginator: Paginator<Item>) -> Result<Vec<u64>> {
    let items: Vec<Result<Item>> = paginator.into_stream().collect().await;
    items.into_iter().map(|r| r.map(|item| item.id)).collect()
}

fn request() -> RequestSpec {
    RequestSpec::new(Method::GET, Url::parse("http://mock.local/items").unwrap())
}

// ============================================================================
// Strategies
// ============================================================================

#[test]
fn test_offset_start_is_page_aligned() {
    let strategy = OffsetPagination::new("offset", "limit");
    assert_eq!(
        strategy.start(25, 10),
        StartPoint {
            position: Some(Position::Offset(20)),
            seen: 20,
            discard: 5,
        }
    );
    assert_eq!(strategy.start(0, 10).discard, 0);
    assert_eq!(strategy.start(7, 1).position, Some(Position::Offset(7)));
}

#[test]
fn test_offset_apply_and_next() {
    let strategy = OffsetPagination::new("skip", "take");
    let mut req = request();
    strategy
        .apply(Some(&Position::Offset(30)), 15, &mut req)
        .unwrap();

    assert_eq!(req.query.get("skip").map(String::as_str), Some("30"));
    assert_eq!(req.query.get("take").map(String::as_str), Some("15"));

    let info = PageInfo {
        count: 15,
        next_cursor: None,
        total: None,
    };
    assert_eq!(
        strategy.next(Some(&Position::Offset(30)), &info),
        Some(Position::Offset(45))
    );
}

#[test]
fn test_page_number_start_and_next() {
    let strategy = PaginationConfig::page_number().build();
    let start = strategy.start(25, 10);
    assert_eq!(start.position, Some(Position::Page(3)));
    assert_eq!(start.seen, 20);
    assert_eq!(start.discard, 5);

    let info = PageInfo {
        count: 10,
        next_cursor: None,
        total: None,
    };
    assert_eq!(
        strategy.next(Some(&Position::Page(3)), &info),
        Some(Position::Page(4))
    );

    let mut req = request();
    strategy.apply(None, 10, &mut req).unwrap();
    assert_eq!(req.query.get("page").map(String::as_str), Some("1"));
    assert_eq!(req.query.get("per_page").map(String::as_str), Some("10"));
}

fn page_number_without_size() -> PaginationConfig {
    PaginationConfig::PageNumber {
        page_param: "page".to_string(),
        size_param: None,
        start_page: 1,
    }
}

#[test]
fn test_page_number_without_size_param_does_not_seek() {
    let strategy = page_number_without_size().build();
    assert_eq!(
        strategy.start(25, 10),
        StartPoint {
            position: Some(Position::Page(1)),
            seen: 0,
            discard: 25,
        }
    );
    assert!(!strategy.honors_page_size());

    let mut req = request();
    strategy.apply(None, 10, &mut req).unwrap();
    assert_eq!(req.query.get("page").map(String::as_str), Some("1"));
    assert_eq!(req.query.len(), 1);
}

#[test]
fn test_cursor_start_discards_everything() {
    let strategy = PaginationConfig::cursor().build();
    let start = strategy.start(25, 10);
    assert_eq!(start.position, None);
    assert_eq!(start.seen, 0);
    assert_eq!(start.discard, 25);

    let info = PageInfo {
        count: 10,
        next_cursor: Some("tok_2"),
        total: None,
    };
    assert_eq!(
        strategy.next(None, &info),
        Some(Position::Token("tok_2".to_string()))
    );

    let info = PageInfo {
        next_cursor: None,
        ..info
    };
    assert_eq!(strategy.next(None, &info), None);
}

#[test]
fn test_next_url_apply_replaces_url() {
    let strategy = NextUrlPagination {
        size_param: Some("per_page".to_string()),
    };

    let mut first = request().query("q", "rust");
    strategy.apply(None, 50, &mut first).unwrap();
    assert_eq!(
        first.full_url().as_str(),
        "http://mock.local/items?per_page=50&q=rust"
    );

    let mut next = request().query("q", "rust");
    strategy
        .apply(
            Some(&Position::Url("/items?page=2&per_page=50&q=rust".to_string())),
            50,
            &mut next,
        )
        .unwrap();
    assert_eq!(
        next.full_url().as_str(),
        "http://mock.local/items?page=2&per_page=50&q=rust"
    );
}

#[test]
fn test_mismatched_position_is_precondition_violation() {
    let strategy = OffsetPagination::new("offset", "limit");
    let err = strategy
        .apply(Some(&Position::Token("abc".to_string())), 10, &mut request())
        .unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { .. }));
}

#[test]
fn test_pagination_config_from_yaml() {
    let config: PaginationConfig =
        serde_yaml::from_str("type: cursor\ncursor_param: starting_after\n").unwrap();
    assert_eq!(
        config,
        PaginationConfig::Cursor {
            cursor_param: "starting_after".to_string(),
            limit_param: Some("limit".to_string()),
        }
    );
    assert_eq!(PaginationConfig::default(), PaginationConfig::offset());
}

// ============================================================================
// Manual paging
// ============================================================================

#[tokio::test]
async fn test_manual_stepping() {
    let h = Harness::dataset(MockDataset::new(25));
    let mut paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let mut cursor = Some(paginator.first_cursor());
    let mut pages = Vec::new();
    while let Some(current) = cursor {
        let fetch = paginator.fetch_page(&current).await.unwrap();
        assert_eq!(fetch.total, Some(25));
        pages.push((fetch.index, fetch.items.len()));
        cursor = fetch.next;
    }

    assert_eq!(pages, vec![(0, 10), (1, 10), (2, 5)]);
    assert_eq!(
        h.offsets(),
        vec![
            Some("0".to_string()),
            Some("10".to_string()),
            Some("20".to_string())
        ]
    );
}

#[tokio::test]
async fn test_reused_cursor_fails_fast() {
    let h = Harness::dataset(MockDataset::new(25));
    let mut paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let first = paginator.first_cursor();
    let fetch = paginator.fetch_page(&first).await.unwrap();
    assert!(!fetch.is_last());

    let err = paginator.fetch_page(&first).await.unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { .. }));
    assert!(!err.is_retryable());
    assert_eq!(h.transport.call_count(), 1);
}

#[tokio::test]
async fn test_cursor_from_the_future_fails_fast() {
    let h = Harness::dataset(MockDataset::new(25));
    let mut paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let first = paginator.first_cursor();
    let second = paginator.fetch_page(&first).await.unwrap().next.unwrap();
    let third = paginator.fetch_page(&second).await.unwrap().next.unwrap();

    let mut other = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);
    let err = other.fetch_page(&third).await.unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { .. }));
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn test_failed_page_can_be_refetched() {
    let h = Harness::dataset(MockDataset::new(5));
    h.transport.push_status(404);
    let mut paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let first = paginator.first_cursor();
    let err = paginator.fetch_page(&first).await.unwrap_err();
    assert!(matches!(err, Error::Page { index: 0, .. }));
    assert!(matches!(err.root(), Error::Http { status: 404, .. }));

    let fetch = paginator.fetch_page(&first).await.unwrap();
    assert_eq!(ids(&fetch.items), vec![0, 1, 2, 3, 4]);
    assert!(fetch.is_last());
}

#[test]
fn test_zero_page_size_rejected() {
    let h = Harness::dataset(MockDataset::new(5));
    let decoder: Arc<dyn PageDecoder<Item>> = Arc::new(JsonPageDecoder::<Item>::default());
    let err = Paginator::new(
        h.executor.clone(),
        query(),
        PaginationConfig::offset().build(),
        decoder,
        0,
        0,
    )
    .unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { .. }));
}

// ============================================================================
// Exhaustion and validation
// ============================================================================

#[tokio::test]
async fn test_exact_multiple_with_total_stops_on_total() {
    let h = Harness::dataset(MockDataset::new(20));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    assert_eq!(collect(paginator).await.unwrap().len(), 20);
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn test_exact_multiple_without_total_costs_one_empty_page() {
    let h = Harness::dataset(MockDataset::new(20).without_total());
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    assert_eq!(collect(paginator).await.unwrap().len(), 20);
    assert_eq!(h.transport.call_count(), 3);
}

#[tokio::test]
async fn test_short_interior_page_is_retried() {
    let h = Harness::dataset(MockDataset::new(25));
    h.transport
        .push_json(&json!({"items": [{"id": 0}, {"id": 1}, {"id": 2}], "total": 25}));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let ids = collect(paginator).await.unwrap();

    assert_eq!(ids, (0..25).collect::<Vec<_>>());
    assert_eq!(h.transport.call_count(), 4);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn test_short_last_page_is_not_an_error() {
    let h = Harness::dataset(MockDataset::new(3));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    assert_eq!(collect(paginator).await.unwrap(), vec![0, 1, 2]);
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_offset_past_total_issues_one_request() {
    let h = Harness::dataset(MockDataset::new(10));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 4, 11);

    assert!(collect(paginator).await.unwrap().is_empty());
    assert_eq!(h.transport.call_count(), 1);
    assert_eq!(h.offsets(), vec![Some("8".to_string())]);
}

#[tokio::test]
async fn test_repeated_cursor_ends_stream() {
    let h = Harness::new(|clock| {
        MockTransport::new(clock).with_handler(|_| {
            let body = json!({"items": [{"id": 1}, {"id": 2}], "next_cursor": "same"});
            Ok(Response::json_ok(&body))
        })
    });
    let paginator = h.paginator(&PaginationConfig::cursor(), DecoderConfig::default(), 2, 0);

    assert_eq!(collect(paginator).await.unwrap(), vec![1, 2, 1, 2]);
    assert_eq!(h.transport.call_count(), 2);
}

// ============================================================================
// Strategies end to end
// ============================================================================

#[tokio::test]
async fn test_cursor_pagination_discards_skip_across_pages() {
    let h = Harness::dataset(MockDataset::new(25));
    let paginator = h.paginator(&PaginationConfig::cursor(), DecoderConfig::default(), 10, 15);

    assert_eq!(collect(paginator).await.unwrap(), (15..25).collect::<Vec<_>>());

    let cursors: Vec<Option<String>> = h
        .transport
        .requests()
        .iter()
        .map(|r| r.query("cursor").map(str::to_string))
        .collect();
    assert_eq!(
        cursors,
        vec![None, Some("10".to_string()), Some("20".to_string())]
    );
}

#[tokio::test]
async fn test_page_number_pagination() {
    let h = Harness::new(|clock| {
        MockTransport::new(clock).with_handler(|request| {
            let page: u64 = request.query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            let size: u64 = request.query.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);
            let start = (page - 1) * size;
            let items: Vec<_> = (start..(start + size).min(7)).map(|id| json!({"id": id})).collect();
            Ok(Response::json_ok(&json!({"items": items})))
        })
    });
    let paginator = h.paginator(&PaginationConfig::page_number(), DecoderConfig::default(), 3, 4);

    assert_eq!(collect(paginator).await.unwrap(), vec![4, 5, 6]);
    let pages: Vec<Option<String>> = h
        .transport
        .requests()
        .iter()
        .map(|r| r.query("page").map(str::to_string))
        .collect();
    assert_eq!(pages, vec![Some("2".to_string()), Some("3".to_string())]);
}

#[tokio::test]
async fn test_page_number_skip_with_server_chosen_page_size() {
    // Server pages by 3 regardless of the client's page size of 5
    let h = Harness::new(|clock| {
        MockTransport::new(clock).with_handler(|request| {
            let page: u64 = request.query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            let start = (page - 1) * 3;
            let items: Vec<_> = (start..(start + 3).min(10)).map(|id| json!({"id": id})).collect();
            Ok(Response::json_ok(&json!({"items": items, "total": 10})))
        })
    });
    let paginator = h.paginator(&page_number_without_size(), DecoderConfig::default(), 5, 6);

    assert_eq!(collect(paginator).await.unwrap(), vec![6, 7, 8, 9]);
    let pages: Vec<Option<String>> = h
        .transport
        .requests()
        .iter()
        .map(|r| r.query("page").map(str::to_string))
        .collect();
    assert_eq!(
        pages,
        ["1", "2", "3", "4"].map(|p| Some(p.to_string())).to_vec()
    );
}

#[tokio::test]
async fn test_next_url_from_link_header() {
    let h = Harness::new(|clock| {
        MockTransport::new(clock).with_handler(|request| {
            let url = request.full_url();
            let page = url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .map_or(1, |(_, v)| v.parse::<u64>().unwrap_or(1));

            let mut headers = Headers::new();
            if page < 3 {
                headers.insert(
                    "Link",
                    format!("<http://mock.local/items?page={}>; rel=\"next\"", page + 1),
                );
            }
            let body = json!([{"id": page * 10}, {"id": page * 10 + 1}]);
            Ok(Response::new(200, headers, body.to_string()))
        })
    });
    let paginator = h.paginator(
        &PaginationConfig::next_url(),
        DecoderConfig::bare_array().with_link_header(),
        2,
        0,
    );

    assert_eq!(
        collect(paginator).await.unwrap(),
        vec![10, 11, 20, 21, 30, 31]
    );
    assert_eq!(h.transport.call_count(), 3);
}

// ============================================================================
// Streams
// ============================================================================

#[tokio::test]
async fn test_error_surfaces_after_prior_items() {
    let h = Harness::dataset(MockDataset::new(25));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);
    let transport = h.transport.clone();
    let mut stream = paginator.into_stream();

    let mut seen = Vec::new();
    for _ in 0..10 {
        seen.push(stream.next().await.unwrap().unwrap().id);
    }
    // Page 1 is answered by the script instead of the dataset
    transport.push_status(400);

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Page { index: 1, .. }));
    assert!(matches!(err.root(), Error::Http { status: 400, .. }));
    assert!(stream.next().await.is_none());
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_dropping_stream_stops_requests() {
    let h = Harness::dataset(MockDataset::new(100));
    let paginator = h.paginator(&PaginationConfig::offset(), DecoderConfig::default(), 10, 0);

    let first: Vec<Result<Item>> = paginator.into_stream().take(12).collect().await;
    assert_eq!(first.len(), 12);
    assert_eq!(h.transport.call_count(), 2);
}
