// Adapter selection by source kind

use crate::api::ApiAdapter;
use crate::rss::RssAdapter;
use crate::scrape::ScrapeAdapter;
use jobmatch_core::domain::{AdapterKind, SourceConfig};
use jobmatch_core::port::{AdapterBuildError, AdapterFactory, SourceAdapter};
use std::sync::Arc;
use tracing::debug;

/// Builds one HTTP-backed adapter (with its own client) per source
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpAdapterFactory;

impl HttpAdapterFactory {
    pub fn new() -> Self {
        Self
    }
}

impl AdapterFactory for HttpAdapterFactory {
    fn build(&self, config: &SourceConfig) -> Result<Arc<dyn SourceAdapter>, AdapterBuildError> {
        debug!(source = %config.name, kind = %config.kind, "Building source adapter");
        let adapter: Arc<dyn SourceAdapter> = match config.kind {
            AdapterKind::Api => Arc::new(ApiAdapter::new(config)?),
            AdapterKind::Rss => Arc::new(RssAdapter::new(config)?),
            AdapterKind::Scrape => Arc::new(ScrapeAdapter::new(config)?),
        };
        Ok(adapter)
    }
}
