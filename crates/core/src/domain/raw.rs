// Raw Source Records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single source record before normalization.
///
/// Fields are kept as JSON so every adapter variant emits the same shape
/// and the normalizer reads them only through the source's field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPosting {
    pub source: String,
    pub fields: Map<String, Value>,
}

impl RawPosting {
    pub fn new(source: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            source: source.into(),
            fields,
        }
    }

    /// Resolve a dotted path (`"company.name"`, `"tags.0"`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = lookup(current, segment)?;
        }
        Some(current)
    }
}

/// Resolve a dotted path against an arbitrary JSON value
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(value, lookup)
}

fn lookup<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Opaque position in a source's result set (page number or feed index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub page: u32,
}

impl PageCursor {
    pub fn first() -> Self {
        Self { page: 0 }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
        }
    }
}

/// One fetched page of unparsed entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub entries: Vec<Value>,
    pub next: Option<PageCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_path_lookup() {
        let Value::Object(fields) = json!({
            "position": "Rust Engineer",
            "company": {"name": "Acme"},
            "tags": ["rust", "tokio"]
        }) else {
            unreachable!()
        };
        let raw = RawPosting::new("api", fields);

        assert_eq!(raw.get("position"), Some(&json!("Rust Engineer")));
        assert_eq!(raw.get("company.name"), Some(&json!("Acme")));
        assert_eq!(raw.get("tags.1"), Some(&json!("tokio")));
        assert_eq!(raw.get("tags.9"), None);
        assert_eq!(raw.get("missing"), None);
    }

    #[test]
    fn test_resolve_path_root() {
        let value = json!({"data": {"jobs": [1, 2]}});
        assert_eq!(resolve_path(&value, ""), Some(&value));
        assert_eq!(resolve_path(&value, "data.jobs"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_cursor_advances() {
        assert_eq!(PageCursor::first().next().page, 1);
    }
}
