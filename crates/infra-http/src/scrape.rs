// HTML scrape adapter
//
// A configured card selector yields one entry per listing; field selectors
// are evaluated inside each card.

use crate::client::{parse_url, SourceClient};
use crate::text::collapse_whitespace;
use async_trait::async_trait;
use jobmatch_core::domain::{
    ConnectionParams, Page, PageCursor, RawPosting, ScrapeSelectors, SourceConfig, SourceQuery,
};
use jobmatch_core::port::{AdapterBuildError, FetchError, SourceAdapter};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

pub struct ScrapeAdapter {
    name: String,
    client: SourceClient,
    url: Url,
    selectors: ScrapeSelectors,
    params: ConnectionParams,
}

impl ScrapeAdapter {
    pub fn new(config: &SourceConfig) -> Result<Self, AdapterBuildError> {
        let params = &config.connection;
        let raw_url = params
            .url
            .as_deref()
            .ok_or_else(|| AdapterBuildError::InvalidConfig("scrape source needs a url".into()))?;
        let selectors = params.selectors.clone().ok_or_else(|| {
            AdapterBuildError::InvalidConfig("scrape source needs selectors".into())
        })?;

        // Fail at build time rather than on every page
        CardSelectors::compile(&selectors)
            .map_err(|e| AdapterBuildError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            client: SourceClient::from_params(params)?,
            url: parse_url(raw_url)?,
            selectors,
            params: params.clone(),
        })
    }

    fn request_params(&self, query: &SourceQuery, cursor: PageCursor) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .params
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(param) = &self.params.keyword_param {
            if query.has_keywords() {
                params.push((param.clone(), query.terms().collect::<Vec<_>>().join(" ")));
            }
        }
        if let (Some(param), Some(location)) = (&self.params.location_param, &query.location) {
            params.push((param.clone(), location.clone()));
        }
        if let Some(param) = &self.params.page_param {
            params.push((param.clone(), (cursor.page + 1).to_string()));
        }
        params
    }
}

struct CardSelectors {
    card: Selector,
    title: Selector,
    company: Option<Selector>,
    location: Option<Selector>,
    description: Option<Selector>,
    link: Option<Selector>,
    posted_at: Option<Selector>,
}

impl CardSelectors {
    fn compile(raw: &ScrapeSelectors) -> Result<Self, FetchError> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| FetchError::Permanent(format!("bad selector '{css}': {e}")))
        };
        let optional = |css: &Option<String>| css.as_deref().map(parse).transpose();

        Ok(Self {
            card: parse(&raw.card)?,
            title: parse(&raw.title)?,
            company: optional(&raw.company)?,
            location: optional(&raw.location)?,
            description: optional(&raw.description)?,
            link: optional(&raw.link)?,
            posted_at: optional(&raw.posted_at)?,
        })
    }
}

fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
}

/// Extract one JSON object per card. Runs synchronously: `Html` is not `Send`.
pub(crate) fn extract_cards(
    html: &str,
    base: &Url,
    raw: &ScrapeSelectors,
) -> Result<Vec<Value>, FetchError> {
    let selectors = CardSelectors::compile(raw)?;
    let document = Html::parse_document(html);

    let cards = document
        .select(&selectors.card)
        .map(|card| {
            let mut fields = Map::new();
            let mut put = |key: &str, value: Option<String>| {
                if let Some(value) = value {
                    fields.insert(key.to_string(), Value::String(value));
                }
            };

            put("title", first_text(&card, &selectors.title));
            for (key, selector) in [
                ("company", &selectors.company),
                ("location", &selectors.location),
                ("description", &selectors.description),
            ] {
                put(key, selector.as_ref().and_then(|s| first_text(&card, s)));
            }

            let link = selectors
                .link
                .as_ref()
                .and_then(|s| card.select(s).next())
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| base.join(href).ok())
                .map(String::from);
            put("link", link);

            let posted_at = selectors.posted_at.as_ref().and_then(|s| {
                card.select(s).next().and_then(|el| {
                    el.value()
                        .attr("datetime")
                        .map(str::to_string)
                        .or_else(|| first_text(&card, s))
                })
            });
            put("posted_at", posted_at);

            Value::Object(fields)
        })
        .collect();

    Ok(cards)
}

#[async_trait]
impl SourceAdapter for ScrapeAdapter {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        &self,
        query: &SourceQuery,
        cursor: Option<PageCursor>,
    ) -> Result<Page, FetchError> {
        let cursor = cursor.unwrap_or_else(PageCursor::first);
        let body = self
            .client
            .get_text(&self.url, &self.request_params(query, cursor))
            .await?;

        let entries = extract_cards(&body, &self.url, &self.selectors)?;
        let next = (self.params.page_param.is_some() && !entries.is_empty()).then(|| cursor.next());

        Ok(Page { entries, next })
    }

    fn parse_entry(&self, entry: &Value) -> Result<RawPosting, FetchError> {
        let fields = match entry {
            Value::Object(fields) => fields,
            _ => return Err(FetchError::Malformed("expected a card object".into())),
        };
        if !fields.contains_key("title") {
            return Err(FetchError::Malformed("card without a title".into()));
        }
        Ok(RawPosting::new(self.name.clone(), fields.clone()))
    }
}
