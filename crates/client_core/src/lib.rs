//! Client side of the topic analysis service: the HTTP client and the
//! controller that drives a results page through one submission at a time.

pub mod controller;
pub mod error;
pub mod transport;

pub use controller::{
    IgnoreReason, PageSurface, RequestController, SubmitOutcome, UiState, BUSY_TRIGGER_LABEL,
    IDLE_TRIGGER_LABEL, STARTING_STATUS,
};
pub use error::{AnalyzeError, ClientBuildError, GENERIC_SERVER_ERROR};
pub use transport::{AnalysisClient, AnalysisService, ClientOptions};
