// Source Fetch Stream
//
// Wraps one adapter with its token bucket and retry policy and exposes the
// source as a lazy, finite stream of events. Dropping the stream stops
// fetching; calling `into_stream` again re-reads the source from scratch.

use super::cancellation::CancellationToken;
use super::rate_limiter::{Throttled, TokenBucket};
use super::retry::{RetryDecision, RetryPolicy};
use crate::domain::{PageCursor, RawPosting, SourceQuery};
use crate::port::{FetchError, SourceAdapter};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A page that could not be fetched after all retries
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub page: u32,
    pub attempts: u32,
    pub error: FetchError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// One parsed entry, in fetch order
    Entry(RawPosting),
    /// An entry the adapter could not parse; the rest of the page continues
    Malformed { page: u32, reason: String },
    /// Retries exhausted; fetching stops with what was read so far
    PageFailed(PageFailure),
    /// No rate-limit token within the allowed wait; skipped for this cycle
    Throttled(Throttled),
    /// Cancellation observed between calls
    Cancelled,
}

pub struct SourceFetcher {
    adapter: Arc<dyn SourceAdapter>,
    limiter: Arc<TokenBucket>,
    retry: RetryPolicy,
    acquire_timeout: Duration,
    max_pages: u32,
    cancel: CancellationToken,
}

struct FetchState {
    query: SourceQuery,
    cursor: Option<PageCursor>,
    pages_read: u32,
    pending: VecDeque<FetchEvent>,
    done: bool,
}

enum PageOutcome {
    Fetched(crate::domain::Page),
    Stop(FetchEvent),
}

impl SourceFetcher {
    pub fn new(
        adapter: Arc<dyn SourceAdapter>,
        limiter: Arc<TokenBucket>,
        retry: RetryPolicy,
        acquire_timeout: Duration,
        max_pages: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            adapter,
            limiter,
            retry,
            acquire_timeout,
            max_pages: max_pages.max(1),
            cancel,
        }
    }

    /// Lazy event stream starting at `start` (the first page when `None`)
    pub fn into_stream(
        self,
        query: SourceQuery,
        start: Option<PageCursor>,
    ) -> impl Stream<Item = FetchEvent> + Send {
        let state = FetchState {
            query,
            cursor: start,
            pages_read: 0,
            pending: VecDeque::new(),
            done: false,
        };

        stream::unfold((self, state), |(fetcher, mut state)| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Some((event, (fetcher, state)));
                }
                if state.done || state.pages_read >= fetcher.max_pages {
                    return None;
                }
                if fetcher.cancel.is_cancelled() {
                    state.done = true;
                    return Some((FetchEvent::Cancelled, (fetcher, state)));
                }

                match fetcher.fetch_with_retry(&state.query, state.cursor).await {
                    PageOutcome::Fetched(page) => {
                        let page_no = state.cursor.unwrap_or_else(PageCursor::first).page;
                        state.pages_read += 1;
                        state.done = page.next.is_none();
                        state.cursor = page.next;

                        debug!(
                            source = %fetcher.adapter.source_name(),
                            page = page_no,
                            entries = page.entries.len(),
                            "Fetched page"
                        );

                        for entry in &page.entries {
                            let event = match fetcher.adapter.parse_entry(entry) {
                                Ok(raw) => FetchEvent::Entry(raw),
                                Err(err) => {
                                    warn!(
                                        source = %fetcher.adapter.source_name(),
                                        page = page_no,
                                        error = %err,
                                        "Dropping malformed entry"
                                    );
                                    FetchEvent::Malformed {
                                        page: page_no,
                                        reason: err.to_string(),
                                    }
                                }
                            };
                            state.pending.push_back(event);
                        }
                    }
                    PageOutcome::Stop(event) => {
                        state.done = true;
                        return Some((event, (fetcher, state)));
                    }
                }
            }
        })
    }

    /// Acquire a token and call the adapter, retrying transient failures
    async fn fetch_with_retry(&self, query: &SourceQuery, cursor: Option<PageCursor>) -> PageOutcome {
        let source = self.adapter.source_name();
        let page_no = cursor.unwrap_or_else(PageCursor::first).page;
        let mut attempts = 0u32;

        loop {
            let acquired = tokio::select! {
                acquired = self.limiter.acquire(self.acquire_timeout) => acquired,
                _ = self.cancel.cancelled() => return PageOutcome::Stop(FetchEvent::Cancelled),
            };
            if let Err(throttled) = acquired {
                warn!(source = %source, waited_ms = throttled.waited_ms, "Rate limit wait exceeded, skipping source");
                return PageOutcome::Stop(FetchEvent::Throttled(throttled));
            }

            let result = tokio::select! {
                result = self.adapter.fetch_page(query, cursor) => result,
                _ = self.cancel.cancelled() => return PageOutcome::Stop(FetchEvent::Cancelled),
            };

            let error = match result {
                Ok(page) => return PageOutcome::Fetched(page),
                Err(error) => error,
            };
            attempts += 1;

            match self.retry.should_retry(source, attempts, &error) {
                RetryDecision::Retry(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.cancel.cancelled() => return PageOutcome::Stop(FetchEvent::Cancelled),
                    }
                }
                RetryDecision::GiveUp => {
                    return PageOutcome::Stop(FetchEvent::PageFailed(PageFailure {
                        page: page_no,
                        attempts,
                        error,
                    }));
                }
            }
        }
    }
}
