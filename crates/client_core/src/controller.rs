//! Submit-and-render lifecycle for one results page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use markup::{render_facts, render_narrative, MarkupDelegate};
use shared::{
    domain::{AnalysisRequest, Phase},
    protocol::AnalysisResult,
};
use tracing::{debug, info, warn};

use crate::{error::AnalyzeError, transport::AnalysisService};

pub const STARTING_STATUS: &str = "Starting agents...";
pub const IDLE_TRIGGER_LABEL: &str = "Analyze";
pub const BUSY_TRIGGER_LABEL: &str = "Working...";

/// Page elements the controller drives. Implementations are the display;
/// they never call back into the controller.
pub trait PageSurface: Send + Sync {
    fn set_trigger(&self, enabled: bool, label: &str);
    fn set_loading(&self, visible: bool);
    fn set_status(&self, message: &str);
    fn set_results_visible(&self, visible: bool);
    fn set_facts_markup(&self, markup: &str);
    fn set_narrative_markup(&self, markup: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub phase: Phase,
    pub status_message: String,
    pub last_result: Option<AnalysisResult>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            status_message: String::new(),
            last_result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyTopic,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Succeeded { facts: usize },
    Failed(AnalyzeError),
}

pub struct RequestController {
    service: Arc<dyn AnalysisService>,
    surface: Arc<dyn PageSurface>,
    delegate: Arc<dyn MarkupDelegate>,
    state: Mutex<UiState>,
}

impl RequestController {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        surface: Arc<dyn PageSurface>,
        delegate: Arc<dyn MarkupDelegate>,
    ) -> Self {
        surface.set_trigger(true, IDLE_TRIGGER_LABEL);
        surface.set_loading(false);
        surface.set_results_visible(false);
        Self {
            service,
            surface,
            delegate,
            state: Mutex::new(UiState::default()),
        }
    }

    pub fn state(&self) -> UiState {
        self.lock_state().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Runs one submission to completion. Empty topics and submits issued
    /// while another one is in flight are dropped without touching state.
    pub async fn submit(&self, raw_topic: &str) -> SubmitOutcome {
        let Ok(request) = AnalysisRequest::new(raw_topic) else {
            debug!("ignoring submit with empty topic");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyTopic);
        };

        {
            let mut state = self.lock_state();
            if state.phase.is_busy() {
                debug!(topic = request.topic(), "ignoring submit while busy");
                return SubmitOutcome::Ignored(IgnoreReason::Busy);
            }
            state.phase = Phase::Submitting;
            state.status_message = STARTING_STATUS.to_string();
        }
        let guard = SubmissionGuard { controller: self };

        self.surface.set_trigger(false, BUSY_TRIGGER_LABEL);
        self.surface.set_results_visible(false);
        self.surface.set_loading(true);
        self.surface.set_status(STARTING_STATUS);
        info!(topic = request.topic(), "submitting analysis request");

        let outcome = match self.service.analyze(&request).await {
            Ok(result) => self.settle_success(result),
            Err(err) => self.settle_failure(err),
        };

        drop(guard);
        outcome
    }

    fn settle_success(&self, result: AnalysisResult) -> SubmitOutcome {
        let facts_markup = render_facts(&result.key_facts);
        let narrative_markup = render_narrative(self.delegate.as_ref(), &result.final_analysis);
        let facts = result.key_facts.len();

        {
            let mut state = self.lock_state();
            state.phase = Phase::Success;
            state.status_message.clear();
            state.last_result = Some(result);
        }

        self.surface.set_status("");
        self.surface.set_facts_markup(&facts_markup);
        self.surface.set_narrative_markup(&narrative_markup);
        self.surface.set_results_visible(true);
        info!(facts, "analysis rendered");
        SubmitOutcome::Succeeded { facts }
    }

    fn settle_failure(&self, err: AnalyzeError) -> SubmitOutcome {
        let message = err.status_message();
        {
            let mut state = self.lock_state();
            state.phase = Phase::Error;
            state.status_message = message.clone();
        }

        self.surface.set_status(&message);
        warn!(status = ?err.http_status(), error = %err, "analysis request failed");
        SubmitOutcome::Failed(err)
    }

    fn lock_state(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores the trigger and loading indicator once a submission settles,
/// and leaves the phase at `Idle` if the submit future was dropped mid-call.
struct SubmissionGuard<'a> {
    controller: &'a RequestController,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.controller.lock_state();
            let busy = state.phase.is_busy();
            if busy {
                state.phase = Phase::Idle;
                state.status_message.clear();
            }
            busy
        };
        if abandoned {
            self.controller.surface.set_status("");
        }
        self.controller.surface.set_loading(false);
        self.controller.surface.set_trigger(true, IDLE_TRIGGER_LABEL);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
