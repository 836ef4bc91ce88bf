use askama::Template;

/// Snapshot of every element the results page exposes.
///
/// Text fields are escaped on render; `facts_markup` and `narrative_markup`
/// are trusted renderer output and embedded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>.hidden { display: none; } .date { color: #666; }</style>
</head>
<body>
<h1>{{ title }}</h1>
<form id="analyze-form">
<input id="topic-input" type="text" value="{{ topic_value }}">
<button id="submit-button" type="submit"{% if !trigger_enabled %} disabled{% endif %}>{{ trigger_label }}</button>
</form>
<div id="loading"{% if !loading_visible %} class="hidden"{% endif %}></div>
<p id="status">{{ status }}</p>
<div id="results-container"{% if !results_visible %} class="hidden"{% endif %}>
<section id="key-facts-content">{{ facts_markup|safe }}</section>
<section id="final-analysis-content">{{ narrative_markup|safe }}</section>
</div>
</body>
</html>
"#,
    ext = "html"
)]
pub struct PageDocument {
    pub title: String,
    pub topic_value: String,
    pub trigger_enabled: bool,
    pub trigger_label: String,
    pub loading_visible: bool,
    pub status: String,
    pub results_visible: bool,
    pub facts_markup: String,
    pub narrative_markup: String,
}

impl PageDocument {
    pub fn new(title: impl Into<String>, trigger_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            topic_value: String::new(),
            trigger_enabled: true,
            trigger_label: trigger_label.into(),
            loading_visible: false,
            status: String::new(),
            results_visible: false,
            facts_markup: String::new(),
            narrative_markup: String::new(),
        }
    }
}

pub fn render_page(doc: &PageDocument) -> Result<String, askama::Error> {
    doc.render()
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
