// JSON API adapter

use crate::client::{parse_url, SourceClient};
use async_trait::async_trait;
use jobmatch_core::domain::raw::resolve_path;
use jobmatch_core::domain::{ConnectionParams, Page, PageCursor, RawPosting, SourceConfig, SourceQuery};
use jobmatch_core::port::{AdapterBuildError, FetchError, SourceAdapter};
use reqwest::Url;
use serde_json::Value;

pub struct ApiAdapter {
    name: String,
    client: SourceClient,
    url: Url,
    params: ConnectionParams,
}

impl ApiAdapter {
    pub fn new(config: &SourceConfig) -> Result<Self, AdapterBuildError> {
        let raw_url = config
            .connection
            .url
            .as_deref()
            .ok_or_else(|| AdapterBuildError::InvalidConfig("api source needs a url".into()))?;

        Ok(Self {
            name: config.name.clone(),
            client: SourceClient::from_params(&config.connection)?,
            url: parse_url(raw_url)?,
            params: config.connection.clone(),
        })
    }

    /// Query string for one page
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
            params.push((param.clone(), page_value(cursor, self.params.page_size)));
        }
        params
    }
}

/// Offset when a page size is configured, otherwise a 1-based page number
fn page_value(cursor: PageCursor, page_size: Option<u32>) -> String {
    match page_size {
        Some(size) => (u64::from(cursor.page) * u64::from(size)).to_string(),
        None => (cursor.page + 1).to_string(),
    }
}

/// Pull the entry array out of a response body
pub(crate) fn extract_entries(
    body: &str,
    items_path: Option<&str>,
    skip: usize,
) -> Result<Vec<Value>, FetchError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(format!("invalid json: {e}")))?;

    let items = resolve_path(&document, items_path.unwrap_or(""))
        .ok_or_else(|| FetchError::Permanent(format!("no value at '{}'", items_path.unwrap_or(""))))?;

    match items {
        Value::Array(entries) => Ok(entries.iter().skip(skip).cloned().collect()),
        other => Err(FetchError::Permanent(format!(
            "expected an array of entries, got {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl SourceAdapter for ApiAdapter {
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

        // Only the first page carries the leading metadata entries
        let skip = if cursor.page == 0 { self.params.skip_entries } else { 0 };
        let entries = extract_entries(&body, self.params.items_path.as_deref(), skip)?;

        let full_page = self
            .params
            .page_size
            .map_or(true, |size| entries.len() >= size as usize);
        let next = (self.params.page_param.is_some() && !entries.is_empty() && full_page)
            .then(|| cursor.next());

        Ok(Page { entries, next })
    }

    fn parse_entry(&self, entry: &Value) -> Result<RawPosting, FetchError> {
        match entry {
            Value::Object(fields) => Ok(RawPosting::new(self.name.clone(), fields.clone())),
            other => Err(FetchError::Malformed(format!(
                "expected an object entry, got {}",
                kind_of(other)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::domain::AdapterKind;
    use serde_json::json;

    fn adapter(params: ConnectionParams) -> ApiAdapter {
        let mut config = SourceConfig::new("remote-api", AdapterKind::Api);
        config.connection = ConnectionParams {
            url: Some("https://jobs.example.com/api".into()),
            ..params
        };
        ApiAdapter::new(&config).unwrap()
    }

    #[test]
    fn test_extract_entries_with_path_and_skip() {
        let body = include_str!("../tests/fixtures/api_response.json");

        let entries = extract_entries(body, Some("data.jobs"), 1).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["position"], "Senior Rust Engineer");
    }

    #[test]
    fn test_extract_entries_errors() {
        assert!(matches!(extract_entries("{", None, 0), Err(FetchError::Parse(_))));
        assert!(matches!(
            extract_entries(r#"{"data": 1}"#, Some("data"), 0),
            Err(FetchError::Permanent(_))
        ));
        assert!(matches!(
            extract_entries(r#"{"data": []}"#, Some("missing"), 0),
            Err(FetchError::Permanent(_))
        ));
        assert_eq!(extract_entries("[1, 2]", None, 0).unwrap().len(), 2);
    }

    #[test]
    fn test_request_params() {
        let adapter = adapter(ConnectionParams {
            query: [("format".to_string(), "json".to_string())].into(),
            keyword_param: Some("q".into()),
            location_param: Some("where".into()),
            page_param: Some("offset".into()),
            page_size: Some(50),
            ..Default::default()
        });
        let query = SourceQuery {
            keywords: vec!["rust".into(), "backend".into()],
            location: Some("Berlin".into()),
            limit: None,
        };

        let params = adapter.request_params(&query, PageCursor { page: 2 });

        assert_eq!(
            params,
            vec![
                ("format".to_string(), "json".to_string()),
                ("q".to_string(), "rust backend".to_string()),
                ("where".to_string(), "Berlin".to_string()),
                ("offset".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_numbers_are_one_based_without_page_size() {
        assert_eq!(page_value(PageCursor::first(), None), "1");
        assert_eq!(page_value(PageCursor { page: 3 }, None), "4");
    }

    #[test]
    fn test_parse_entry_requires_object() {
        let adapter = adapter(ConnectionParams::default());

        let raw = adapter.parse_entry(&json!({"position": "Dev"})).unwrap();
        assert_eq!(raw.source, "remote-api");
        assert!(matches!(
            adapter.parse_entry(&json!("legal notice")),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let config = SourceConfig::new("api", AdapterKind::Api);
        assert!(matches!(
            ApiAdapter::new(&config),
            Err(AdapterBuildError::InvalidConfig(_))
        ));
    }
}
