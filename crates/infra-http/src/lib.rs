// Jobmatch Infrastructure - HTTP Source Adapters
// Implements: SourceAdapter (JSON API, RSS, HTML scrape), AdapterFactory

mod api;
mod client;
mod factory;
mod rss;
mod scrape;
mod text;

pub use api::ApiAdapter;
pub use client::{SourceClient, DEFAULT_USER_AGENT};
pub use factory::HttpAdapterFactory;
pub use rss::RssAdapter;
pub use scrape::ScrapeAdapter;
pub use text::{html_to_text, split_title};
