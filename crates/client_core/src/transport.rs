use std::{error::Error as _, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::AnalysisRequest,
    error::ErrorBody,
    protocol::{AnalysisResult, HealthStatus},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AnalyzeError, ClientBuildError};

pub const ANALYZE_PATH: &str = "analyze";
pub const HEALTH_PATH: &str = "health";

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError>;
    async fn health(&self) -> Result<HealthStatus, AnalyzeError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    /// `None` leaves the transport's own defaults in place.
    pub request_timeout: Option<Duration>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: None,
        }
    }
}

pub struct AnalysisClient {
    http: Client,
    analyze_url: Url,
    health_url: Url,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_options(ClientOptions::new(base_url))
    }

    pub fn with_options(options: ClientOptions) -> Result<Self, ClientBuildError> {
        let base = parse_base_url(&options.base_url)?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|source| ClientBuildError::InvalidBaseUrl {
                    url: options.base_url.clone(),
                    source,
                })
        };
        let analyze_url = join(ANALYZE_PATH)?;
        let health_url = join(HEALTH_PATH)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            analyze_url,
            health_url,
        })
    }

    pub fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientBuildError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|source| ClientBuildError::InvalidBaseUrl {
        url: trimmed.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientBuildError::UnsupportedBaseUrl {
            url: trimmed.to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Flattens a reqwest error and its causes into one line.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError> {
        let response = self
            .http
            .post(self.analyze_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| AnalyzeError::Transport(describe_transport_error(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.detail_message().map(str::to_string));
            warn!(
                status = status.as_u16(),
                has_detail = detail.is_some(),
                "analysis service rejected request"
            );
            return Err(match detail {
                Some(detail) => AnalyzeError::ServerRejected {
                    status: status.as_u16(),
                    detail,
                },
                None => AnalyzeError::ServerRejectedNoDetail {
                    status: status.as_u16(),
                },
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AnalyzeError::Transport(describe_transport_error(&err)))?;
        let result = serde_json::from_slice::<AnalysisResult>(&body)
            .map_err(|err| AnalyzeError::MalformedResponse(err.to_string()))?;
        debug!(
            status = status.as_u16(),
            facts = result.key_facts.len(),
            "analysis response decoded"
        );
        Ok(result)
    }

    async fn health(&self) -> Result<HealthStatus, AnalyzeError> {
        let response = self
            .http
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|err| AnalyzeError::Transport(describe_transport_error(&err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzeError::ServerRejectedNoDetail {
                status: status.as_u16(),
            });
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|err| AnalyzeError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
