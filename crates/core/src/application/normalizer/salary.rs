// Free-text salary parsing ("$80,000 - $120,000", "80k-100k", "R$ 10.000/month")

use crate::application::constants::HOURS_PER_YEAR;
use crate::domain::SalaryRange;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Amounts below this are not salaries ("$5 off", "2 years")
const MIN_PLAUSIBLE_SALARY: i64 = 1000;

const AMOUNT: &str = r"\d{1,3}(?:[.,]\d{3})+|\d+(?:\.\d+)?";
const SYMBOL: &str = r"R\$|US\$|\$|€|£";
const CODE: &str = r"USD|EUR|GBP|BRL";

static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)(?:(?P<sym>{SYMBOL})|\b(?P<pre>{CODE})\b)?\s*(?P<lo>{AMOUNT})\s*(?P<k1>k\b)?(?:\s*(?:-|–|to)\s*(?:{SYMBOL})?\s*(?P<hi>{AMOUNT})\s*(?P<k2>k\b)?)?(?:\s*\b(?P<post>{CODE})\b)?(?:\s*(?:/|per|an?)\s*(?P<period>hour|hr|month|mo|year|yr|annum))?"
    );
    Regex::new(&pattern).expect("salary pattern is a valid regex")
});

static THOUSANDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$").expect("thousands pattern is a valid regex")
});

const CONTEXT_WORDS: &[&str] = &["salary", "compensation", "pay", "salário"];

/// Parse the first plausible salary mention in `text`.
///
/// A number only counts when it carries a currency, a `k` suffix or directly
/// follows a salary keyword. Hourly and monthly figures are annualized.
pub fn parse_salary_text(text: &str) -> Option<SalaryRange> {
    SALARY_RE
        .captures_iter(text)
        .filter(|caps| has_salary_context(text, caps))
        .find_map(|caps| to_range(&caps))
}

fn has_salary_context(text: &str, caps: &Captures<'_>) -> bool {
    let explicit = ["sym", "pre", "post", "k1", "k2"]
        .iter()
        .any(|name| caps.name(name).is_some());
    if explicit {
        return true;
    }

    let start = caps.get(0).map_or(0, |m| m.start());
    let before = text[..start]
        .trim_end()
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase();
    CONTEXT_WORDS.iter().any(|word| before.ends_with(word))
}

fn to_range(caps: &Captures<'_>) -> Option<SalaryRange> {
    let k1 = caps.name("k1").is_some();
    let k2 = caps.name("k2").is_some();

    let mut lo = parse_amount(caps.name("lo")?.as_str())?;
    let mut hi = match caps.name("hi") {
        Some(m) => Some(parse_amount(m.as_str())?),
        None => None,
    };

    // "80-100k": the suffix on the upper bound applies to both
    if k1 || (k2 && lo < 1000.0) {
        lo *= 1000.0;
    }
    if let Some(h) = hi.as_mut() {
        if k2 {
            *h *= 1000.0;
        }
    }

    let multiplier = match caps
        .name("period")
        .map(|m| m.as_str().to_lowercase())
        .as_deref()
    {
        Some("hour") | Some("hr") => HOURS_PER_YEAR as f64,
        Some("month") | Some("mo") => 12.0,
        _ => 1.0,
    };

    let lo = (lo * multiplier).round() as i64;
    let hi = hi.map_or(lo, |h| (h * multiplier).round() as i64);
    let (min, max) = if lo <= hi { (lo, hi) } else { (hi, lo) };

    if max < MIN_PLAUSIBLE_SALARY {
        return None;
    }

    Some(SalaryRange::new(Some(min), Some(max), currency(caps)))
}

fn parse_amount(raw: &str) -> Option<f64> {
    if THOUSANDS_RE.is_match(raw) {
        raw.replace([',', '.'], "").parse().ok()
    } else {
        raw.parse().ok()
    }
}

fn currency(caps: &Captures<'_>) -> Option<String> {
    if let Some(code) = caps.name("pre").or_else(|| caps.name("post")) {
        return Some(code.as_str().to_uppercase());
    }
    let code = match caps.name("sym")?.as_str() {
        "R$" => "BRL",
        "€" => "EUR",
        "£" => "GBP",
        _ => "USD",
    };
    Some(code.to_string())
}
