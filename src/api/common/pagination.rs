//
//  enterprise-cli
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination engine
//!
//! Every listing endpoint of the four services returns one page at a time,
//! each with its own continuation scheme:
//!
//! | Service | Endpoint family | Cursor |
//! |---------|-----------------|--------|
//! | Jira | `search/jql` | `nextPageToken` ([`PageCursor::Token`]) |
//! | Jira | project/board/sprint/comment/user listings | `startAt` ([`PageCursor::Offset`]) |
//! | Confluence | content search, spaces | `start` or `cursor` from `_links.next` |
//! | Slack | `conversations.*` | `response_metadata.next_cursor` ([`PageCursor::Token`]) |
//! | Slack | `search.messages` | `page` ([`PageCursor::Page`]) |
//! | GitLab | all listings | `X-Next-Page` header ([`PageCursor::Page`]) |
//!
//! A [`PageSource`] hides those differences: it knows how to build the
//! request for a cursor and how to pull records plus the next cursor out of
//! a response. The [`Paginator`] drives it, one page at a time, strictly in
//! sequence.
//!
//! # Termination
//!
//! A paginator stops requesting pages when any of these holds:
//!
//! - the source reported no next cursor
//! - a page returned fewer records than were requested
//! - a page was empty
//! - the consumer's result limit has been reached
//!
//! The page size requested is `min(page_size, remaining_limit)`, so a capped
//! listing never asks for more than it will yield.

use std::collections::VecDeque;

use tracing::debug;

use super::{ApiError, ApiRequest, ApiResponse, Record};
use crate::api::client::HttpClient;

/// Opaque continuation state for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Zero-based record offset (`startAt`, `start`)
    Offset(u64),
    /// Server-issued continuation token (`nextPageToken`, `next_cursor`)
    Token(String),
    /// One-based page number (`page`)
    Page(u64),
}

/// One page of normalized records and the cursor of the page after it.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in the order the service returned them
    pub records: Vec<Record>,
    /// `None` when the service signalled the end of the listing
    pub next: Option<PageCursor>,
}

impl Page {
    /// Creates a page.
    pub fn new(records: Vec<Record>, next: Option<PageCursor>) -> Self {
        Self { records, next }
    }

    /// Creates a page for offset-based listings, deriving the next offset
    /// from the current one and the number of records received.
    ///
    /// `is_last` is the service's own end-of-listing flag when it has one
    /// (Jira's `isLast`); services without it pass `false` and rely on the
    /// short-page rule.
    pub fn offset(records: Vec<Record>, cursor: Option<&PageCursor>, is_last: bool) -> Self {
        let start = match cursor {
            Some(PageCursor::Offset(start)) => *start,
            _ => 0,
        };
        let next = if is_last || records.is_empty() {
            None
        } else {
            Some(PageCursor::Offset(start + records.len() as u64))
        };
        Self { records, next }
    }
}

/// Adapter-supplied knowledge of one listing endpoint.
///
/// Implementations must be cheap to call repeatedly: a restarted listing calls
/// [`PageSource::request`] again with `None`.
pub trait PageSource: Send + Sync {
    /// Builds the request for the page at `cursor` (`None` for the first page)
    /// asking for `page_size` records.
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest;

    /// Extracts the page's records and the next cursor from a response.
    fn extract(
        &self,
        response: &ApiResponse,
        cursor: Option<&PageCursor>,
    ) -> Result<Page, ApiError>;

    /// Whether a page shorter than requested marks the end of the listing.
    ///
    /// Slack's `conversations.*` methods may return short pages mid-listing,
    /// so their sources rely on the cursor alone.
    fn stops_on_short_page(&self) -> bool {
        true
    }
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn request(&self, cursor: Option<&PageCursor>, page_size: u32) -> ApiRequest {
        (**self).request(cursor, page_size)
    }

    fn extract(
        &self,
        response: &ApiResponse,
        cursor: Option<&PageCursor>,
    ) -> Result<Page, ApiError> {
        (**self).extract(response, cursor)
    }

    fn stops_on_short_page(&self) -> bool {
        (**self).stops_on_short_page()
    }
}

/// A lazy, finite, strictly sequential sequence of records.
///
/// Pages are fetched only when the consumer asks for a record that is not
/// already buffered. Creating a new paginator over the same source restarts
/// the listing from the first page.
///
/// # Example
///
/// ```rust,ignore
/// let mut pages = Paginator::new(&client, source, 50).limit(Some(5));
/// while let Some(record) = pages.next().await? {
///     println!("{}", record.text("key"));
/// }
/// ```
pub struct Paginator<'a> {
    client: &'a HttpClient,
    source: Box<dyn PageSource + 'a>,
    page_size: u32,
    limit: Option<usize>,
    buffer: VecDeque<Record>,
    cursor: Option<PageCursor>,
    yielded: usize,
    pages_fetched: u32,
    exhausted: bool,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator positioned before the first page.
    ///
    /// # Parameters
    ///
    /// * `client` - The HTTP client used for every page request
    /// * `source` - The endpoint's request builder and page extractor
    /// * `page_size` - Records per page to request (at least 1)
    pub fn new(client: &'a HttpClient, source: impl PageSource + 'a, page_size: u32) -> Self {
        Self {
            client,
            source: Box::new(source),
            page_size: page_size.max(1),
            limit: None,
            buffer: VecDeque::new(),
            cursor: None,
            yielded: 0,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Bounds the number of records this paginator yields.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Returns the next record, fetching the next page when the buffer is empty.
    ///
    /// # Returns
    ///
    /// `Ok(None)` once the listing is exhausted or the limit is reached.
    ///
    /// # Errors
    ///
    /// Any failure of a page request, after the HTTP client's own retries.
    pub async fn next(&mut self) -> Result<Option<Record>, ApiError> {
        loop {
            if self.limit_reached() {
                return Ok(None);
            }
            if let Some(record) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(record));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drains the paginator into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<Record>, ApiError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    fn limit_reached(&self) -> bool {
        matches!(self.limit, Some(limit) if self.yielded >= limit)
    }

    async fn fetch_page(&mut self) -> Result<(), ApiError> {
        let requested = match self.limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(self.yielded);
                (remaining.min(self.page_size as usize) as u32).max(1)
            }
            None => self.page_size,
        };

        let request = self.source.request(self.cursor.as_ref(), requested);
        debug!(
            page = self.pages_fetched + 1,
            size = requested,
            request = %request.describe(),
            "Fetching page"
        );

        let response = self.client.execute(&request).await?;
        let page = self.source.extract(&response, self.cursor.as_ref())?;
        self.pages_fetched += 1;

        let received = page.records.len();
        let short = self.source.stops_on_short_page() && received < requested as usize;
        self.exhausted = page.next.is_none() || short || received == 0;
        self.cursor = page.next;
        self.buffer.extend(page.records);

        debug!(received, exhausted = self.exhausted, "Page received");
        Ok(())
    }
}
