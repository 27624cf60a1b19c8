use crate::request::Request;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no matching recording found for {} {}", .0.method(), .0.uri())]
    NoMatchingRecordingFound(Box<Request>),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// The request that failed to match, when this is a replay miss.
    pub fn unmatched_request(&self) -> Option<&Request> {
        match self {
            Self::NoMatchingRecordingFound(request) => Some(request),
            _ => None,
        }
    }
}
