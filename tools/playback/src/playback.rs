//! The `record` / `replay` / `play` orchestrator.
//!
//! Every equivalence class of requests (as decided by the matcher) is either
//! unseen or recorded. `record` stores unconditionally, `replay` only reads
//! and fails for an unseen class, and `play` reads or, on a miss, forwards
//! once through the transport and stores the live pair before returning it.

use crate::config::PlaybackConfig;
use crate::errors::PlaybackError;
use crate::logging::{append_run_log, JsonlLogger, LogEvent};
use crate::matcher::{default_matcher, RequestMatcher};
use crate::recording::body_fingerprint;
use crate::repository::{InMemoryRecordingRepository, RecordingRepository};
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;
use crate::types::PlaybackMode;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct Playback {
    mode: PlaybackMode,
    repository: Mutex<Box<dyn RecordingRepository>>,
    matcher: Arc<dyn RequestMatcher>,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<JsonlLogger>,
    // Held across find -> forward -> save so concurrent `play` calls for
    // one unseen class forward once.
    forward_gate: Mutex<()>,
}

impl Playback {
    pub fn builder() -> PlaybackBuilder {
        PlaybackBuilder::default()
    }

    /// Builds the repository, matcher and logger named by `config`. The
    /// logger belongs to this instance; the process-wide run log is untouched.
    pub fn from_config(
        config: &PlaybackConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, PlaybackError> {
        let repository = config.open_repository()?;
        let playback = Self {
            mode: config.playback.mode,
            repository: Mutex::new(repository),
            matcher: Arc::new(config.matcher()),
            transport,
            logger: config.logger(),
            forward_gate: Mutex::new(()),
        };
        playback.log(
            "info",
            "playback.configured",
            json!({
                "mode": config.playback.mode.as_str(),
                "backend": config.recordings.backend.as_str(),
                "significant_headers": config.matching.significant_headers,
                "transport": playback.transport.is_some(),
            }),
        );
        Ok(playback)
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn record(&self, request: Request, response: Response) -> Result<(), PlaybackError> {
        let summary = exchange_summary(&request, &response);
        self.repository()?.save(request, response)?;
        self.log("info", "playback.record", summary);
        Ok(())
    }

    pub fn replay(&self, request: &Request) -> Result<Response, PlaybackError> {
        match self.lookup(request)? {
            Some(response) => {
                self.log(
                    "debug",
                    "playback.replay.hit",
                    exchange_summary(request, &response),
                );
                Ok(response)
            }
            None => {
                self.log("warn", "playback.replay.miss", request_summary(request));
                Err(PlaybackError::NoMatchingRecordingFound(Box::new(
                    request.clone(),
                )))
            }
        }
    }

    /// Answers from the recordings, or forwards exactly once per unseen
    /// equivalence class and stores the live response whatever its status.
    /// A transport error is returned unchanged and nothing is stored.
    pub fn play(&self, request: &Request) -> Result<Response, PlaybackError> {
        let _gate = self
            .forward_gate
            .lock()
            .map_err(|_| PlaybackError::Io("forward gate lock poisoned".to_string()))?;

        if let Some(response) = self.lookup(request)? {
            self.log(
                "debug",
                "playback.play.hit",
                exchange_summary(request, &response),
            );
            return Ok(response);
        }

        let response = self.forward(request)?;
        self.repository()?.save(request.clone(), response.clone())?;
        self.log(
            "info",
            "playback.play.recorded",
            exchange_summary(request, &response),
        );
        Ok(response)
    }

    /// Dispatches on the configured mode. `Record` forwards live and stores
    /// the pair even when an equivalent recording already exists.
    pub fn execute(&self, request: &Request) -> Result<Response, PlaybackError> {
        match self.mode {
            PlaybackMode::Replay => self.replay(request),
            PlaybackMode::Play => self.play(request),
            PlaybackMode::Record => {
                let response = self.forward(request)?;
                self.record(request.clone(), response.clone())?;
                Ok(response)
            }
        }
    }

    pub fn recording_count(&self) -> Result<usize, PlaybackError> {
        self.repository()?.len()
    }

    fn lookup(&self, request: &Request) -> Result<Option<Response>, PlaybackError> {
        self.repository()?.find(request, self.matcher.as_ref())
    }

    fn forward(&self, request: &Request) -> Result<Response, PlaybackError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            PlaybackError::InvalidConfig(format!(
                "no transport configured to forward {} {}",
                request.method(),
                request.uri()
            ))
        })?;
        self.log("info", "playback.play.forward", request_summary(request));
        match transport.execute(request) {
            Ok(response) => Ok(response),
            Err(error) => {
                self.log(
                    "error",
                    "playback.play.forward.failed",
                    json!({
                        "method": request.method().as_str(),
                        "uri": request.uri().to_string(),
                        "error": error.to_string(),
                    }),
                );
                Err(error)
            }
        }
    }

    /// Writes to this instance's logger, or to the run log when it has none.
    fn log(&self, level: &str, event_type: &str, payload: Value) {
        match &self.logger {
            Some(logger) => {
                let _ = logger.append(&LogEvent {
                    level,
                    event_type,
                    payload,
                });
            }
            None => append_run_log(level, event_type, payload),
        }
    }

    fn repository(&self) -> Result<MutexGuard<'_, Box<dyn RecordingRepository>>, PlaybackError> {
        self.repository
            .lock()
            .map_err(|_| PlaybackError::Io("repository lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback")
            .field("mode", &self.mode)
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct PlaybackBuilder {
    mode: Option<PlaybackMode>,
    matcher: Option<Arc<dyn RequestMatcher>>,
    repository: Option<Box<dyn RecordingRepository>>,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<JsonlLogger>,
}

impl PlaybackBuilder {
    pub fn mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn matcher(mut self, matcher: impl RequestMatcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn repository(mut self, repository: impl RecordingRepository + 'static) -> Self {
        self.repository = Some(Box::new(repository));
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn logger(mut self, logger: JsonlLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Unset parts default to replay mode, the default matcher, an in-memory
    /// repository, no transport and the process-wide run log.
    pub fn build(self) -> Playback {
        Playback {
            mode: self.mode.unwrap_or_default(),
            repository: Mutex::new(
                self.repository
                    .unwrap_or_else(|| Box::new(InMemoryRecordingRepository::new())),
            ),
            matcher: self
                .matcher
                .unwrap_or_else(|| Arc::new(default_matcher())),
            transport: self.transport,
            logger: self.logger,
            forward_gate: Mutex::new(()),
        }
    }
}

fn request_summary(request: &Request) -> Value {
    json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "body": body_fingerprint(request.body()),
    })
}

fn exchange_summary(request: &Request, response: &Response) -> Value {
    json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "request_body": body_fingerprint(request.body()),
        "status_code": response.status_code(),
        "response_body": body_fingerprint(response.body()),
    })
}
