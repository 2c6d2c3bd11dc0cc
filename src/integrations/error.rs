use std::path::PathBuf;

use super::platform::Platform;

/// A failure scoped to one platform call or one integrator operation.
///
/// None of these are fatal to the caller; they are returned as values and
/// each fan-out slot carries its own.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("{0} API key not configured")]
    MissingCredential(Platform),

    #[error("{platform} request failed: {source}")]
    Http {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} returned HTTP {status}")]
    Status { platform: Platform, status: u16 },

    #[error("{platform} response malformed: {detail}")]
    MalformedResponse { platform: Platform, detail: String },

    #[error("{platform} query task failed: {detail}")]
    TaskFailed { platform: Platform, detail: String },

    #[error("handoff write to {} failed: {source}", path.display())]
    Handoff {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
