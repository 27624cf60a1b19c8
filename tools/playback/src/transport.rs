use crate::errors::PlaybackError;
use crate::request::Request;
use crate::response::Response;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// The live HTTP call behind `play`. Timeouts and retries belong here, not
/// in the orchestrator.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> Result<Response, PlaybackError>;
}

/// Test double that answers from a queue and remembers every request.
#[derive(Default, Clone)]
pub struct FakeTransport {
    responses: Arc<Mutex<VecDeque<Result<Response, PlaybackError>>>>,
    executed: Arc<Mutex<Vec<Request>>>,
}

impl FakeTransport {
    pub fn push_response(&self, response: Result<Response, PlaybackError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
    }

    pub fn executed(&self) -> Vec<Request> {
        self.executed.lock().expect("executed lock").clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executed.lock().expect("executed lock").len()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: &Request) -> Result<Response, PlaybackError> {
        self.executed
            .lock()
            .expect("executed lock")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(PlaybackError::Transport(
                    "no fake response queued".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{FakeTransport, Transport};
    use crate::errors::PlaybackError;
    use crate::request::Request;
    use crate::response::Response;

    #[test]
    fn fake_transport_answers_in_fifo_order() {
        let transport = FakeTransport::default();
        transport.push_response(Ok(Response::ok().body("one").build().expect("build")));
        transport.push_response(Err(PlaybackError::Transport("down".to_string())));

        let request = Request::get("/").build().expect("build");
        let first = transport.execute(&request).expect("first");
        assert_eq!(first.body_as_string(), "one");
        assert!(matches!(
            transport.execute(&request),
            Err(PlaybackError::Transport(message)) if message == "down"
        ));
        assert!(transport.execute(&request).is_err());
        assert_eq!(transport.execution_count(), 3);
        assert_eq!(transport.executed()[0], request);
    }
}
