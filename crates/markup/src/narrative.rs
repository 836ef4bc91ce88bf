use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::links::{is_safe_link, BLOCKED_LINK_TARGET};

/// Text-to-markup capability used for the narrative block.
///
/// Implementations own escaping and sanitizing; callers hand over the raw
/// narrative and display whatever comes back.
pub trait MarkupDelegate: Send + Sync {
    fn to_markup(&self, source: &str) -> String;
}

impl<F> MarkupDelegate for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn to_markup(&self, source: &str) -> String {
        self(source)
    }
}

/// CommonMark renderer. Raw HTML in the source is emitted as escaped text and
/// link or image targets with a script-capable scheme are replaced by `#`.
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkDelegate {
    options: Options,
}

impl Default for CommonMarkDelegate {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }
}

impl MarkupDelegate for CommonMarkDelegate {
    fn to_markup(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: neutralize_target(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: neutralize_target(dest_url),
                title,
                id,
            }),
            other => other,
        });
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

fn neutralize_target(dest_url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_link(&dest_url) {
        dest_url
    } else {
        CowStr::Borrowed(BLOCKED_LINK_TARGET)
    }
}

pub fn render_narrative(delegate: &dyn MarkupDelegate, final_analysis: &str) -> String {
    delegate.to_markup(final_analysis)
}

#[cfg(test)]
#[path = "tests/narrative_tests.rs"]
mod tests;
