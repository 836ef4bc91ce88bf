use askama::Template;
use shared::protocol::Fact;

use crate::links::safe_link_target;

pub const SOURCE_LINK_LABEL: &str = "[source]";

struct FactRow<'a> {
    fact: &'a str,
    href: &'a str,
    published_date: Option<&'a str>,
}

#[derive(Template)]
#[template(
    source = r#"<ul>{% for row in rows %}<li>{{ row.fact }} <a href="{{ row.href }}" target="_blank" rel="noopener noreferrer">{{ label }}</a>{% match row.published_date %}{% when Some with (date) %} <span class="date">({{ date }})</span>{% when None %}{% endmatch %}</li>{% endfor %}</ul>"#,
    ext = "html"
)]
struct FactsTemplate<'a> {
    rows: Vec<FactRow<'a>>,
    label: &'static str,
}

/// Renders facts as an unordered list, one item per fact in input order.
///
/// Each item carries the fact text, a link to its source that opens in a new
/// browsing context and, when the fact is dated, a trailing `(date)` span.
/// Sources with a script-capable scheme link to `#` instead.
pub fn render_facts(facts: &[Fact]) -> String {
    FactsTemplate {
        rows: facts
            .iter()
            .map(|fact| FactRow {
                fact: &fact.fact,
                href: safe_link_target(&fact.source_url),
                published_date: fact.published_date.as_deref(),
            })
            .collect(),
        label: SOURCE_LINK_LABEL,
    }
    .to_string()
}

#[cfg(test)]
#[path = "tests/facts_tests.rs"]
mod tests;
