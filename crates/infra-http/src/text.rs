// Text helpers shared by the feed and scrape adapters

use scraper::Html;

/// Strip markup and collapse whitespace
pub fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return collapse_whitespace(fragment);
    }
    let parsed = Html::parse_fragment(fragment);
    let text: Vec<&str> = parsed.root_element().text().collect();
    collapse_whitespace(&text.join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a feed title into (role, company).
///
/// Recognized forms: "Role at Company", "Company: Role", "Company - Role".
/// Anything else is a bare role.
pub fn split_title(title: &str) -> (String, Option<String>) {
    let title = collapse_whitespace(title);

    if let Some((role, company)) = title.rsplit_once(" at ") {
        return pair(role, company);
    }
    if let Some((company, role)) = title.split_once(": ") {
        return pair(role, company);
    }
    if let Some((company, role)) = title
        .split_once(" - ")
        .or_else(|| title.split_once(" – "))
    {
        return pair(role, company);
    }
    (title, None)
}

fn pair(role: &str, company: &str) -> (String, Option<String>) {
    let (role, company) = (role.trim(), company.trim());
    if role.is_empty() || company.is_empty() {
        let whole = format!("{role} {company}");
        return (whole.trim().to_string(), None);
    }
    (role.to_string(), Some(company.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<p>Build <b>Rust</b>\n services</p><ul><li>Tokio</li></ul>"),
            "Build Rust services Tokio"
        );
        assert_eq!(html_to_text("plain   text"), "plain text");
        assert_eq!(html_to_text("R&amp;D team"), "R&D team");
    }

    #[test]
    fn test_split_title_forms() {
        assert_eq!(
            split_title("Senior Rust Engineer at Acme Corp"),
            ("Senior Rust Engineer".to_string(), Some("Acme Corp".to_string()))
        );
        assert_eq!(
            split_title("Globex: Data Engineer"),
            ("Data Engineer".to_string(), Some("Globex".to_string()))
        );
        assert_eq!(
            split_title("Initech - Backend Developer"),
            ("Backend Developer".to_string(), Some("Initech".to_string()))
        );
        assert_eq!(split_title("Platform Engineer"), ("Platform Engineer".to_string(), None));
    }
}
