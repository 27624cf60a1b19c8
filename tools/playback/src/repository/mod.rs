//! Storage of (request, response) pairs with matcher-driven lookup.
//!
//! Every repository keeps recordings in insertion order and `find` returns
//! the first recording whose request the matcher accepts. `save` never
//! deduplicates, so a later equivalent recording is shadowed by the
//! earlier one.

pub mod in_memory;
pub mod jsonl;
pub mod sqlite;

pub use in_memory::InMemoryRecordingRepository;
pub use jsonl::JsonlRecordingRepository;
pub use sqlite::SqliteRecordingRepository;

use crate::errors::PlaybackError;
use crate::matcher::RequestMatcher;
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub request: Request,
    pub response: Response,
}

pub trait RecordingRepository: Send {
    fn save(&mut self, request: Request, response: Response) -> Result<(), PlaybackError>;

    fn find(
        &self,
        request: &Request,
        matcher: &dyn RequestMatcher,
    ) -> Result<Option<Response>, PlaybackError>;

    fn len(&self) -> Result<usize, PlaybackError>;

    fn is_empty(&self) -> Result<bool, PlaybackError> {
        Ok(self.len()? == 0)
    }
}

pub(crate) fn first_match<'a>(
    recordings: impl IntoIterator<Item = &'a Recording>,
    request: &Request,
    matcher: &dyn RequestMatcher,
) -> Option<Response> {
    recordings
        .into_iter()
        .find(|recording| matcher.matches(request, &recording.request).is_match())
        .map(|recording| recording.response.clone())
}
