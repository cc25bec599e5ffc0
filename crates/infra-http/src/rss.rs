// RSS feed adapter
//
// Each configured feed URL is one page. Entries are the feed's <item>
// elements; titles like "Role at Company" provide the company when the feed
// has no dedicated field.

use crate::client::{parse_url, SourceClient};
use crate::text::{collapse_whitespace, html_to_text, split_title};
use async_trait::async_trait;
use jobmatch_core::domain::{Page, PageCursor, RawPosting, SourceConfig, SourceQuery};
use jobmatch_core::port::{AdapterBuildError, FetchError, SourceAdapter};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

/// One <item>, as found in the feed
#[derive(Debug, Default, Deserialize, Serialize)]
struct FeedItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

pub struct RssAdapter {
    name: String,
    client: SourceClient,
    feeds: Vec<Url>,
}

impl RssAdapter {
    pub fn new(config: &SourceConfig) -> Result<Self, AdapterBuildError> {
        let feeds = config
            .connection
            .feed_urls()
            .into_iter()
            .map(parse_url)
            .collect::<Result<Vec<_>, _>>()?;
        if feeds.is_empty() {
            return Err(AdapterBuildError::InvalidConfig(
                "rss source needs at least one feed url".into(),
            ));
        }

        Ok(Self {
            name: config.name.clone(),
            client: SourceClient::from_params(&config.connection)?,
            feeds,
        })
    }
}

/// Parse an RSS document into one JSON object per item
pub(crate) fn parse_feed(xml: &str) -> Result<Vec<Value>, FetchError> {
    let rss: Rss = quick_xml::de::from_str(xml)
        .map_err(|e| FetchError::Parse(format!("invalid rss: {e}")))?;

    rss.channel
        .items
        .into_iter()
        .map(|item| serde_json::to_value(item).map_err(|e| FetchError::Parse(e.to_string())))
        .collect()
}

/// Turn a feed item object into normalizer-ready fields
pub(crate) fn item_fields(entry: &Value) -> Result<Map<String, Value>, FetchError> {
    let item: FeedItem = serde_json::from_value(entry.clone())
        .map_err(|e| FetchError::Malformed(format!("not a feed item: {e}")))?;

    let raw_title = item
        .title
        .as_deref()
        .map(html_to_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FetchError::Malformed("feed item without a title".into()))?;

    let explicit_company = item
        .company
        .as_deref()
        .map(collapse_whitespace)
        .filter(|c| !c.is_empty());
    let (title, parsed_company) = match explicit_company {
        Some(_) => (raw_title, None),
        None => split_title(&raw_title),
    };

    let mut fields = Map::new();
    fields.insert("title".into(), Value::String(title));
    if let Some(company) = explicit_company.or(parsed_company) {
        fields.insert("company".into(), Value::String(company));
    }
    if let Some(location) = item.location.or(item.region) {
        fields.insert("location".into(), Value::String(collapse_whitespace(&location)));
    }
    if let Some(description) = item.description {
        fields.insert("description".into(), Value::String(html_to_text(&description)));
    }
    if !item.categories.is_empty() {
        fields.insert(
            "categories".into(),
            Value::Array(item.categories.into_iter().map(Value::String).collect()),
        );
    }
    if let Some(pub_date) = item.pub_date {
        fields.insert("pub_date".into(), Value::String(pub_date.trim().to_string()));
    }
    if let Some(link) = item.link {
        fields.insert("link".into(), Value::String(link.trim().to_string()));
    }
    Ok(fields)
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        &self,
        _query: &SourceQuery,
        cursor: Option<PageCursor>,
    ) -> Result<Page, FetchError> {
        let cursor = cursor.unwrap_or_else(PageCursor::first);
        let Some(feed) = self.feeds.get(cursor.page as usize) else {
            return Ok(Page::default());
        };

        let body = self.client.get_text(feed, &[]).await?;
        let entries = parse_feed(&body)?;
        let next = (cursor.page as usize + 1 < self.feeds.len()).then(|| cursor.next());

        Ok(Page { entries, next })
    }

    fn parse_entry(&self, entry: &Value) -> Result<RawPosting, FetchError> {
        Ok(RawPosting::new(self.name.clone(), item_fields(entry)?))
    }
}
