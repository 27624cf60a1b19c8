//! Record HTTP exchanges once and replay them deterministically in tests.
//!
//! A [`Playback`] holds a [`RecordingRepository`], a [`RequestMatcher`] and,
//! optionally, a live [`Transport`]. `record` stores pairs, `replay` answers
//! only from what was stored, and `play` forwards at most once per
//! equivalence class of requests before answering from the store.

pub mod config;
pub mod errors;
pub mod headers;
pub mod logging;
pub mod matcher;
pub mod media_type;
pub mod playback;
pub mod recording;
pub mod repository;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;
pub mod url_decoder;

pub use errors::PlaybackError;
pub use http::{Method, StatusCode};
pub use matcher::{default_matcher, MatchResult, RequestMatcher};
pub use media_type::MediaType;
pub use playback::{Playback, PlaybackBuilder};
pub use repository::{Recording, RecordingRepository};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
pub use transport::{FakeTransport, Transport};
pub use types::{PlaybackMode, RepositoryBackend};
