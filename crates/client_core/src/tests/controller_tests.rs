use super::*;
use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Router};
use markup::CommonMarkDelegate;
use shared::protocol::{Fact, HealthStatus};
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::{net::TcpListener, sync::Notify};

use crate::{error::GENERIC_SERVER_ERROR, transport::AnalysisClient};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SurfaceSnapshot {
    trigger_enabled: bool,
    trigger_label: String,
    loading_visible: bool,
    status: String,
    results_visible: bool,
    facts_markup: String,
    narrative_markup: String,
}

#[derive(Default)]
struct RecordingSurface {
    current: Mutex<SurfaceSnapshot>,
    updates: AtomicUsize,
}

impl RecordingSurface {
    fn snapshot(&self) -> SurfaceSnapshot {
        self.current.lock().expect("surface lock").clone()
    }

    fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn apply(&self, change: impl FnOnce(&mut SurfaceSnapshot)) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut current = self.current.lock().expect("surface lock");
        change(&mut *current);
    }
}

impl PageSurface for RecordingSurface {
    fn set_trigger(&self, enabled: bool, label: &str) {
        self.apply(|s| {
            s.trigger_enabled = enabled;
            s.trigger_label = label.to_string();
        });
    }

    fn set_loading(&self, visible: bool) {
        self.apply(|s| s.loading_visible = visible);
    }

    fn set_status(&self, message: &str) {
        self.apply(|s| s.status = message.to_string());
    }

    fn set_results_visible(&self, visible: bool) {
        self.apply(|s| s.results_visible = visible);
    }

    fn set_facts_markup(&self, markup: &str) {
        self.apply(|s| s.facts_markup = markup.to_string());
    }

    fn set_narrative_markup(&self, markup: &str) {
        self.apply(|s| s.narrative_markup = markup.to_string());
    }
}

struct ScriptedService {
    responses: Mutex<VecDeque<Result<AnalysisResult, AnalyzeError>>>,
    topics: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    fn new(responses: Vec<Result<AnalysisResult, AnalyzeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            topics: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(responses: Vec<Result<AnalysisResult, AnalyzeError>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(responses)
        }
    }

    fn topics(&self) -> Vec<String> {
        self.topics.lock().expect("topics lock").clone()
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError> {
        self.topics
            .lock()
            .expect("topics lock")
            .push(request.topic().to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(AnalyzeError::Transport("no scripted response".to_string())))
    }

    async fn health(&self) -> Result<HealthStatus, AnalyzeError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
        })
    }
}

fn climate_result() -> AnalysisResult {
    AnalysisResult {
        topic: Some("climate policy".to_string()),
        key_facts: vec![Fact {
            fact: "CO2 rose 2%".to_string(),
            source_url: "https://x.test".to_string(),
            published_date: Some("2024-01-01".to_string()),
        }],
        final_analysis: "# Summary\nRising.".to_string(),
    }
}

fn controller_with(
    service: Arc<dyn AnalysisService>,
) -> (RequestController, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::default());
    let controller = RequestController::new(
        service,
        surface.clone(),
        Arc::new(CommonMarkDelegate::default()),
    );
    (controller, surface)
}

#[test]
fn starts_idle_with_enabled_trigger() {
    let (controller, surface) = controller_with(Arc::new(ScriptedService::new(Vec::new())));

    assert_eq!(controller.state(), UiState::default());
    assert_eq!(controller.phase(), Phase::Idle);
    let snapshot = surface.snapshot();
    assert!(snapshot.trigger_enabled);
    assert_eq!(snapshot.trigger_label, IDLE_TRIGGER_LABEL);
    assert!(!snapshot.loading_visible);
    assert!(!snapshot.results_visible);
}

#[tokio::test]
async fn whitespace_topic_is_ignored_without_calls_or_updates() {
    let service = Arc::new(ScriptedService::new(vec![Ok(climate_result())]));
    let (controller, surface) = controller_with(service.clone());
    let updates_before = surface.update_count();

    for topic in ["", "  ", "\t\n"] {
        assert_eq!(
            controller.submit(topic).await,
            SubmitOutcome::Ignored(IgnoreReason::EmptyTopic)
        );
    }

    assert!(service.topics().is_empty());
    assert_eq!(surface.update_count(), updates_before);
    assert_eq!(controller.state(), UiState::default());
}

#[tokio::test]
async fn successful_submit_renders_facts_and_narrative() {
    let service = Arc::new(ScriptedService::new(vec![Ok(climate_result())]));
    let (controller, surface) = controller_with(service.clone());

    let outcome = controller.submit("climate policy").await;

    assert_eq!(outcome, SubmitOutcome::Succeeded { facts: 1 });
    assert_eq!(service.topics(), vec!["climate policy".to_string()]);

    let state = controller.state();
    assert_eq!(state.phase, Phase::Success);
    assert_eq!(state.status_message, "");
    assert_eq!(state.last_result, Some(climate_result()));

    let snapshot = surface.snapshot();
    assert!(snapshot.results_visible);
    assert!(!snapshot.loading_visible);
    assert!(snapshot.trigger_enabled);
    assert_eq!(snapshot.trigger_label, IDLE_TRIGGER_LABEL);
    assert_eq!(snapshot.facts_markup.matches("<li>").count(), 1);
    assert!(snapshot.facts_markup.contains("(2024-01-01)"));
    assert!(snapshot.facts_markup.contains("href=\"https://x.test\""));
    assert_eq!(
        snapshot.narrative_markup,
        "<h1>Summary</h1>\n<p>Rising.</p>\n"
    );
}

#[tokio::test]
async fn server_detail_becomes_prefixed_status() {
    let service = Arc::new(ScriptedService::new(vec![Err(AnalyzeError::ServerRejected {
        status: 500,
        detail: "rate limited".to_string(),
    })]));
    let (controller, surface) = controller_with(service);

    let outcome = controller.submit("climate policy").await;

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    let state = controller.state();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.status_message, "Error: rate limited");

    let snapshot = surface.snapshot();
    assert_eq!(snapshot.status, "Error: rate limited");
    assert!(!snapshot.results_visible);
    assert!(!snapshot.loading_visible);
    assert!(snapshot.trigger_enabled);
}

#[tokio::test]
async fn failure_after_success_keeps_results_hidden_and_controller_usable() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(climate_result()),
        Err(AnalyzeError::ServerRejectedNoDetail { status: 503 }),
        Ok(AnalysisResult {
            topic: None,
            key_facts: Vec::new(),
            final_analysis: String::new(),
        }),
    ]));
    let (controller, surface) = controller_with(service.clone());

    assert_eq!(
        controller.submit("first").await,
        SubmitOutcome::Succeeded { facts: 1 }
    );
    assert!(matches!(
        controller.submit("second").await,
        SubmitOutcome::Failed(AnalyzeError::ServerRejectedNoDetail { status: 503 })
    ));

    let state = controller.state();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.status_message, format!("Error: {GENERIC_SERVER_ERROR}"));
    assert!(!surface.snapshot().results_visible);

    assert_eq!(
        controller.submit("third").await,
        SubmitOutcome::Succeeded { facts: 0 }
    );
    let state = controller.state();
    assert_eq!(state.phase, Phase::Success);
    assert_eq!(
        state.last_result.map(|result| result.key_facts.len()),
        Some(0)
    );
    let snapshot = surface.snapshot();
    assert_eq!(snapshot.facts_markup, "<ul></ul>");
    assert_eq!(snapshot.narrative_markup, "");
    assert!(snapshot.results_visible);
    assert_eq!(service.topics(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn overlapping_submit_is_dropped_while_busy() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(
        vec![Ok(climate_result())],
        gate.clone(),
    ));
    let (controller, surface) = controller_with(service.clone());

    let first = controller.submit("climate policy");
    let second = async {
        assert_eq!(controller.phase(), Phase::Submitting);
        assert_eq!(controller.state().status_message, STARTING_STATUS);
        let snapshot = surface.snapshot();
        assert!(!snapshot.trigger_enabled);
        assert_eq!(snapshot.trigger_label, BUSY_TRIGGER_LABEL);
        assert!(snapshot.loading_visible);
        assert!(!snapshot.results_visible);

        let outcome = controller.submit("another topic").await;
        gate.notify_one();
        outcome
    };

    let (first, second) = futures::join!(first, second);

    assert_eq!(first, SubmitOutcome::Succeeded { facts: 1 });
    assert_eq!(second, SubmitOutcome::Ignored(IgnoreReason::Busy));
    assert_eq!(service.topics(), vec!["climate policy".to_string()]);
    assert_eq!(controller.phase(), Phase::Success);
}

#[tokio::test]
async fn dropped_submission_does_not_leave_controller_busy() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(
        vec![Ok(climate_result())],
        gate,
    ));
    let (controller, surface) = controller_with(service);

    let pending = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        controller.submit("climate policy"),
    )
    .await;

    assert!(pending.is_err());
    assert_eq!(controller.phase(), Phase::Idle);
    assert_eq!(controller.state().status_message, "");
    let snapshot = surface.snapshot();
    assert!(snapshot.trigger_enabled);
    assert_eq!(snapshot.trigger_label, IDLE_TRIGGER_LABEL);
    assert!(!snapshot.loading_visible);
    assert_eq!(snapshot.status, "");
}

async fn spawn_analysis_server(status: StatusCode, body: &'static str) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new().route(
        "/analyze",
        post(move || async move {
            (
                status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn http_controller(server_url: String) -> (RequestController, Arc<RecordingSurface>) {
    controller_with(Arc::new(
        AnalysisClient::new(server_url).expect("client"),
    ))
}

#[tokio::test]
async fn end_to_end_success_over_http() {
    let server_url = spawn_analysis_server(
        StatusCode::OK,
        r##"{"key_facts":[{"fact":"CO2 rose 2%","source_url":"https://x.test","published_date":"2024-01-01"}],"final_analysis":"# Summary\nRising."}"##,
    )
    .await;
    let (controller, surface) = http_controller(server_url);

    assert_eq!(
        controller.submit("climate policy").await,
        SubmitOutcome::Succeeded { facts: 1 }
    );
    assert_eq!(controller.phase(), Phase::Success);
    let snapshot = surface.snapshot();
    assert!(snapshot.facts_markup.contains("CO2 rose 2%"));
    assert!(snapshot.facts_markup.contains("(2024-01-01)"));
    assert!(snapshot.narrative_markup.contains("<h1>Summary</h1>"));
    assert!(snapshot.results_visible);
}

#[tokio::test]
async fn end_to_end_server_detail_over_http() {
    let server_url =
        spawn_analysis_server(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"rate limited"}"#)
            .await;
    let (controller, surface) = http_controller(server_url);

    controller.submit("climate policy").await;

    let state = controller.state();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.status_message, "Error: rate limited");
    assert!(!surface.snapshot().results_visible);
}

#[tokio::test]
async fn end_to_end_non_json_failure_uses_generic_message() {
    for body in ["", "Internal Server Error"] {
        let server_url = spawn_analysis_server(StatusCode::INTERNAL_SERVER_ERROR, body).await;
        let (controller, _surface) = http_controller(server_url);

        controller.submit("climate policy").await;

        let state = controller.state();
        assert_eq!(state.phase, Phase::Error);
        assert_eq!(state.status_message, format!("Error: {GENERIC_SERVER_ERROR}"));
    }
}

#[tokio::test]
async fn end_to_end_unreachable_host_reports_transport_text() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let (controller, surface) = http_controller(format!("http://{addr}"));

    let outcome = controller.submit("climate policy").await;

    let description = match outcome {
        SubmitOutcome::Failed(AnalyzeError::Transport(description)) => description,
        other => panic!("expected transport failure, got {other:?}"),
    };
    let state = controller.state();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.status_message, format!("Error: {description}"));
    let snapshot = surface.snapshot();
    assert!(snapshot.trigger_enabled);
    assert_eq!(snapshot.trigger_label, IDLE_TRIGGER_LABEL);
    assert!(!snapshot.results_visible);
}
