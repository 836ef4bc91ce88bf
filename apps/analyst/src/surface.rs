//! Results page kept in memory and written to disk as a standalone HTML file.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::Context;
use client_core::{PageSurface, IDLE_TRIGGER_LABEL};
use markup::{render_page, PageDocument};

pub struct HtmlPageSurface {
    document: Mutex<PageDocument>,
}

impl HtmlPageSurface {
    pub fn new(title: &str) -> Self {
        Self {
            document: Mutex::new(PageDocument::new(title, IDLE_TRIGGER_LABEL)),
        }
    }

    pub fn set_topic_value(&self, topic: &str) {
        self.lock().topic_value = topic.to_string();
    }

    pub fn document(&self) -> PageDocument {
        self.lock().clone()
    }

    pub fn render(&self) -> anyhow::Result<String> {
        render_page(&self.lock()).context("failed to render results page")
    }

    pub async fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let html = self.render()?;
        tokio::fs::write(path, html)
            .await
            .with_context(|| format!("failed to write results page '{}'", path.display()))
    }

    fn lock(&self) -> MutexGuard<'_, PageDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PageSurface for HtmlPageSurface {
    fn set_trigger(&self, enabled: bool, label: &str) {
        let mut doc = self.lock();
        doc.trigger_enabled = enabled;
        doc.trigger_label = label.to_string();
    }

    fn set_loading(&self, visible: bool) {
        self.lock().loading_visible = visible;
    }

    fn set_status(&self, message: &str) {
        self.lock().status = message.to_string();
    }

    fn set_results_visible(&self, visible: bool) {
        self.lock().results_visible = visible;
    }

    fn set_facts_markup(&self, markup: &str) {
        self.lock().facts_markup = markup.to_string();
    }

    fn set_narrative_markup(&self, markup: &str) {
        self.lock().narrative_markup = markup.to_string();
    }
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
