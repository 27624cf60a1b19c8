use crate::errors::PlaybackError;
use crate::logging::append_run_log;
use crate::matcher::RequestMatcher;
use crate::recording::{RecordingRecord, RequestRecord, ResponseRecord};
use crate::repository::{first_match, Recording, RecordingRepository};
use crate::request::Request;
use crate::response::Response;
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Append-only JSONL file, one `RecordingRecord` per line.
///
/// Existing lines are loaded on open and kept in memory for lookups; each
/// `save` appends a line before the recording becomes visible.
#[derive(Debug)]
pub struct JsonlRecordingRepository {
    path: PathBuf,
    recordings: Vec<Recording>,
}

impl JsonlRecordingRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlaybackError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PlaybackError::Io(e.to_string()))?;
        }
        let recordings = if path.exists() {
            load_recordings(&path)?
        } else {
            Vec::new()
        };
        append_run_log(
            "info",
            "repository.jsonl.open",
            json!({
                "path": path.display().to_string(),
                "recordings": recordings.len(),
            }),
        );
        Ok(Self { path, recordings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordingRepository for JsonlRecordingRepository {
    fn save(&mut self, request: Request, response: Response) -> Result<(), PlaybackError> {
        let record = RecordingRecord {
            request: RequestRecord::from(&request),
            response: ResponseRecord::from(&response),
            recorded_at_unix_ms: unix_ms(),
        };
        let line = serde_json::to_string(&record).map_err(|e| PlaybackError::Io(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PlaybackError::Io(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| PlaybackError::Io(e.to_string()))?;
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

fn load_recordings(path: &Path) -> Result<Vec<Recording>, PlaybackError> {
    let raw = fs::read_to_string(path).map_err(|e| PlaybackError::Io(e.to_string()))?;
    let mut recordings = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RecordingRecord = serde_json::from_str(line)
            .map_err(|e| PlaybackError::Io(format!("recording line {}: {e}", idx + 1)))?;
        let request = record
            .request
            .into_request()
            .map_err(|e| PlaybackError::Io(format!("recording line {}: {e}", idx + 1)))?;
        let response = record
            .response
            .into_response()
            .map_err(|e| PlaybackError::Io(format!("recording line {}: {e}", idx + 1)))?;
        recordings.push(Recording { request, response });
    }
    Ok(recordings)
}

pub(crate) fn unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::JsonlRecordingRepository;
    use crate::errors::PlaybackError;
    use crate::matcher::default_matcher;
    use crate::repository::RecordingRepository;
    use crate::request::Request;
    use crate::response::Response;

    #[test]
    fn recordings_survive_reopen_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tapes").join("recordings.jsonl");
        let request = Request::get("/a").build().expect("build");
        {
            let mut repo = JsonlRecordingRepository::open(&path).expect("open");
            repo.save(request.clone(), Response::ok().body("first").build().expect("build"))
                .expect("save");
            repo.save(request.clone(), Response::ok().body("second").build().expect("build"))
                .expect("save");
        }

        let reopened = JsonlRecordingRepository::open(&path).expect("reopen");
        assert_eq!(reopened.len().expect("len"), 2);
        let found = reopened
            .find(&request, &default_matcher())
            .expect("find")
            .expect("present");
        assert_eq!(found.body_as_string(), "first");
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("recordings.jsonl");
        std::fs::write(&path, "\n{not json}\n").expect("write");
        match JsonlRecordingRepository::open(&path) {
            Err(PlaybackError::Io(message)) => assert!(message.contains("line 2")),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
