// JSON value coercions used by field mappings

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Epoch values above this are milliseconds, below are seconds (year 5138 in seconds)
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Non-empty trimmed text; numbers are stringified, string arrays joined
pub fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Positive whole amount; zero means "not disclosed"
pub fn as_amount(value: &Value) -> Option<i64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    let rounded = amount.round();
    (rounded.is_finite() && rounded > 0.0).then_some(rounded as i64)
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "remote" => Some(true),
            "false" | "no" | "n" | "0" | "onsite" | "on-site" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Skill list from an array (strings or `{"name": ..}` objects) or a delimited string
pub fn as_skill_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split([',', ';', '|'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Epoch milliseconds from RFC 3339, RFC 2822, plain dates or unix timestamps
pub fn as_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().map(epoch_to_millis),
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn epoch_to_millis(epoch: i64) -> i64 {
    if epoch.abs() >= MILLIS_THRESHOLD {
        epoch
    } else {
        epoch * 1000
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(epoch) = s.parse::<i64>() {
        return Some(epoch_to_millis(epoch));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(&json!("  Acme ")), Some("Acme".into()));
        assert_eq!(as_text(&json!("   ")), None);
        assert_eq!(as_text(&json!(42)), Some("42".into()));
        assert_eq!(as_text(&json!(["Berlin", "Remote"])), Some("Berlin, Remote".into()));
        assert_eq!(as_text(&json!(null)), None);
    }

    #[test]
    fn test_as_amount() {
        assert_eq!(as_amount(&json!(90000)), Some(90_000));
        assert_eq!(as_amount(&json!("$120,000")), Some(120_000));
        assert_eq!(as_amount(&json!(0)), None);
        assert_eq!(as_amount(&json!("n/a")), None);
    }

    #[test]
    fn test_as_skill_list() {
        assert_eq!(as_skill_list(&json!(["Rust", "SQL"])), vec!["Rust", "SQL"]);
        assert_eq!(as_skill_list(&json!("python, aws; docker")), vec!["python", "aws", "docker"]);
        assert_eq!(as_skill_list(&json!([{"name": "Go"}, 3])), vec!["Go"]);
    }

    #[test]
    fn test_timestamps() {
        let expected = 1_704_067_200_000; // 2024-01-01T00:00:00Z
        assert_eq!(as_timestamp(&json!("2024-01-01T00:00:00Z")), Some(expected));
        assert_eq!(as_timestamp(&json!("2024-01-01T02:00:00+02:00")), Some(expected));
        assert_eq!(as_timestamp(&json!("Mon, 01 Jan 2024 00:00:00 +0000")), Some(expected));
        assert_eq!(as_timestamp(&json!("2024-01-01")), Some(expected));
        assert_eq!(as_timestamp(&json!(1_704_067_200)), Some(expected));
        assert_eq!(as_timestamp(&json!(expected)), Some(expected));
        assert_eq!(as_timestamp(&json!("yesterday")), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!("Yes")), Some(true));
        assert_eq!(as_bool(&json!("maybe")), None);
    }
}
