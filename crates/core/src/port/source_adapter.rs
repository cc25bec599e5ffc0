// Source Adapter Port
// One adapter instance per configured source, built with its own injected client

use crate::domain::{Page, PageCursor, RawPosting, SourceConfig, SourceQuery};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while fetching or parsing a source page
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unparseable page: {0}")]
    Parse(String),

    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Permanent failure: {0}")]
    Permanent(String),
}

impl FetchError {
    /// Whether retrying the same page may succeed.
    ///
    /// Throttling (429) and server errors (5xx) are transient; other 4xx
    /// responses and malformed entries are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Parse(_) => true,
            FetchError::Http { status, .. } => *status == 429 || *status >= 500,
            FetchError::Malformed(_) | FetchError::Permanent(_) => false,
        }
    }
}

/// Capability contract shared by API, RSS and scrape adapters.
///
/// `fetch_page` with no cursor starts from the beginning, so a source can be
/// re-read from scratch at any time; the resulting sequence is finite because
/// the last page returns `next: None`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch one page of unparsed entries
    async fn fetch_page(
        &self,
        query: &SourceQuery,
        cursor: Option<PageCursor>,
    ) -> Result<Page, FetchError>;

    /// Turn one page entry into a raw record (fails with `FetchError::Malformed`)
    fn parse_entry(&self, entry: &Value) -> Result<RawPosting, FetchError>;
}

/// Errors building an adapter from configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterBuildError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Client construction failed: {0}")]
    Client(String),
}

/// Selects and constructs the adapter variant for a source config
pub trait AdapterFactory: Send + Sync {
    fn build(&self, config: &SourceConfig) -> Result<Arc<dyn SourceAdapter>, AdapterBuildError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted page response
    #[derive(Debug, Clone)]
    pub enum ScriptedPage {
        Entries(Vec<Value>),
        Fail(FetchError),
    }

    /// Adapter replaying scripted pages in order.
    ///
    /// Entries must be JSON objects; anything else is reported as malformed.
    /// Once a script runs out, every further call returns its last step, so a
    /// single `Fail` models a source that stays unreachable.
    pub struct ScriptedAdapter {
        name: String,
        pages: Vec<Vec<ScriptedPage>>,
        calls: Mutex<HashMap<u32, usize>>,
        total_calls: AtomicUsize,
    }

    impl ScriptedAdapter {
        /// One script per page; each script lists successive responses for that page
        pub fn new(name: impl Into<String>, pages: Vec<Vec<ScriptedPage>>) -> Self {
            Self {
                name: name.into(),
                pages,
                calls: Mutex::new(HashMap::new()),
                total_calls: AtomicUsize::new(0),
            }
        }

        /// Convenience: pages that always succeed
        pub fn with_pages(name: impl Into<String>, pages: Vec<Vec<Value>>) -> Self {
            Self::new(
                name,
                pages
                    .into_iter()
                    .map(|entries| vec![ScriptedPage::Entries(entries)])
                    .collect(),
            )
        }

        /// Convenience: a source whose first page always fails
        pub fn unreachable(name: impl Into<String>) -> Self {
            Self::new(
                name,
                vec![vec![ScriptedPage::Fail(FetchError::Network(
                    "connection refused".to_string(),
                ))]],
            )
        }

        pub fn call_count(&self) -> usize {
            self.total_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        fn source_name(&self) -> &str {
            &self.name
        }

        async fn fetch_page(
            &self,
            _query: &SourceQuery,
            cursor: Option<PageCursor>,
        ) -> Result<Page, FetchError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            let page = cursor.unwrap_or_else(PageCursor::first);

            let Some(script) = self.pages.get(page.page as usize) else {
                return Ok(Page::default());
            };

            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                let counter = calls.entry(page.page).or_insert(0);
                let current = *counter;
                *counter += 1;
                current
            };

            let step = script
                .get(attempt)
                .or_else(|| script.last())
                .cloned()
                .unwrap_or(ScriptedPage::Entries(vec![]));

            match step {
                ScriptedPage::Entries(entries) => {
                    let next = (page.page as usize + 1 < self.pages.len()).then(|| page.next());
                    Ok(Page { entries, next })
                }
                ScriptedPage::Fail(err) => Err(err),
            }
        }

        fn parse_entry(&self, entry: &Value) -> Result<RawPosting, FetchError> {
            match entry {
                Value::Object(fields) => Ok(RawPosting::new(self.name.clone(), fields.clone())),
                other => Err(FetchError::Malformed(format!("expected object, got {other}"))),
            }
        }
    }

    /// Factory handing out pre-built adapters by source name
    #[derive(Default)]
    pub struct StaticAdapterFactory {
        adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    }

    impl StaticAdapterFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
            self.adapters
                .insert(adapter.source_name().to_string(), adapter);
            self
        }
    }

    impl AdapterFactory for StaticAdapterFactory {
        fn build(
            &self,
            config: &SourceConfig,
        ) -> Result<Arc<dyn SourceAdapter>, AdapterBuildError> {
            self.adapters.get(&config.name).cloned().ok_or_else(|| {
                AdapterBuildError::InvalidConfig(format!("no adapter for '{}'", config.name))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::Timeout(5000).is_transient());
        assert!(FetchError::Http { status: 503, message: String::new() }.is_transient());
        assert!(FetchError::Http { status: 429, message: String::new() }.is_transient());
        assert!(!FetchError::Http { status: 404, message: String::new() }.is_transient());
        assert!(!FetchError::Malformed("x".into()).is_transient());
        assert!(!FetchError::Permanent("x".into()).is_transient());
    }
}
