use thiserror::Error;

/// Fallback shown when the service fails without a usable `detail`.
pub const GENERIC_SERVER_ERROR: &str = "The server returned an error";

/// Why a single `/analyze` call did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzeError {
    #[error("{detail}")]
    ServerRejected { status: u16, detail: String },
    #[error("{}", GENERIC_SERVER_ERROR)]
    ServerRejectedNoDetail { status: u16 },
    #[error("{0}")]
    Transport(String),
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl AnalyzeError {
    pub fn status_message(&self) -> String {
        format!("Error: {self}")
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } | Self::ServerRejectedNoDetail { status } => {
                Some(*status)
            }
            Self::Transport(_) | Self::MalformedResponse(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid analysis service url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported analysis service url '{url}': expected an http or https base")]
    UnsupportedBaseUrl { url: String },
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
