use std::time::Duration;

/// Rejected trigger description. Returned straight to the registering caller.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("unknown frequency '{0}' (expected daily, hourly, every, or weekly)")]
    UnknownFrequency(String),

    #[error("invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("invalid day '{0}'")]
    InvalidDay(String),

    #[error("invalid interval '{0}' (expected e.g. 6, 6h or 30m)")]
    InvalidInterval(String),
}

/// Why a job run did not complete. Every variant is handled by the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl From<crate::integrations::IntegrationError> for JobError {
    fn from(e: crate::integrations::IntegrationError) -> Self {
        match e {
            crate::integrations::IntegrationError::Store(inner) => Self::Store(inner),
            other => Self::Failed(other.to_string()),
        }
    }
}
