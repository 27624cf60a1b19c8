use crate::errors::PlaybackError;
use crate::matcher::RequestMatcher;
use crate::repository::{first_match, Recording, RecordingRepository};
use crate::request::Request;
use crate::response::Response;

/// Ordered list scanned linearly; lookups never index by a derived key.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordingRepository {
    recordings: Vec<Recording>,
}

impl InMemoryRecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }
}

impl RecordingRepository for InMemoryRecordingRepository {
    fn save(&mut self, request: Request, response: Response) -> Result<(), PlaybackError> {
        self.recordings.push(Recording { request, response });
        Ok(())
    }

    fn find(
        &self,
        request: &Request,
        matcher: &dyn RequestMatcher,
    ) -> Result<Option<Response>, PlaybackError> {
        Ok(first_match(&self.recordings, request, matcher))
    }

    fn len(&self) -> Result<usize, PlaybackError> {
        Ok(self.recordings.len())
    }
}
