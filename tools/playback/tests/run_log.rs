use playback::config::PlaybackConfig;
use playback::logging::JsonlLogger;
use playback::repository::RecordingRepository;
use playback::{
    FakeTransport, Playback, PlaybackError, PlaybackMode, Request, RequestMatcher, Response,
    Transport,
};
use std::path::Path;
use std::sync::Arc;

fn event_types(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json line"))
        .map(|value| value["event_type"].as_str().unwrap_or_default().to_string())
        .collect()
}

struct ReadOnlyRepository;

impl RecordingRepository for ReadOnlyRepository {
    fn save(&mut self, _request: Request, _response: Response) -> Result<(), PlaybackError> {
        Err(PlaybackError::Io("read-only store".to_string()))
    }

    fn find(
        &self,
        _request: &Request,
        _matcher: &dyn RequestMatcher,
    ) -> Result<Option<Response>, PlaybackError> {
        Ok(None)
    }

    fn len(&self) -> Result<usize, PlaybackError> {
        Ok(0)
    }
}

#[test]
fn playback_events_land_in_the_run_log_without_bodies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("logs").join("playback.jsonl");
    let mut cfg = PlaybackConfig::default();
    cfg.playback.mode = PlaybackMode::Play;
    cfg.logging.path = Some(log_path.clone());

    let transport = FakeTransport::default();
    transport.push_response(Ok(Response::ok()
        .body("super secret body")
        .build()
        .expect("build")));
    let live: Arc<dyn Transport> = Arc::new(transport);
    let playback = Playback::from_config(&cfg, Some(live)).expect("configure");

    let request = Request::get("/logged").build().expect("build");
    playback.play(&request).expect("play");
    playback.play(&request).expect("play");
    let _ = playback.replay(&Request::get("/absent").build().expect("build"));

    let text = std::fs::read_to_string(&log_path).expect("read log");
    let events = event_types(&log_path);
    for expected in [
        "playback.configured",
        "playback.play.forward",
        "playback.play.recorded",
        "playback.play.hit",
        "playback.replay.miss",
    ] {
        assert!(events.iter().any(|e| e == expected), "missing {expected} in {events:?}");
    }
    assert!(!text.contains("super secret body"));
    assert!(text.contains("<sha256:"));
}

#[test]
fn failed_save_is_not_logged_as_recorded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("playback.jsonl");
    let playback = Playback::builder()
        .repository(ReadOnlyRepository)
        .logger(JsonlLogger::new(&log_path))
        .build();

    let result = playback.record(
        Request::get("/a").build().expect("build"),
        Response::ok().build().expect("build"),
    );
    assert!(matches!(result, Err(PlaybackError::Io(_))));
    assert!(!event_types(&log_path).iter().any(|e| e == "playback.record"));

    let healthy = Playback::builder().logger(JsonlLogger::new(&log_path)).build();
    healthy
        .record(
            Request::get("/a").build().expect("build"),
            Response::ok().build().expect("build"),
        )
        .expect("record");
    assert!(event_types(&log_path).iter().any(|e| e == "playback.record"));
}

#[test]
fn each_instance_writes_to_its_own_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first_log = dir.path().join("first.jsonl");
    let second_log = dir.path().join("second.jsonl");

    let mut first_cfg = PlaybackConfig::default();
    first_cfg.logging.path = Some(first_log.clone());
    let first = Playback::from_config(&first_cfg, None).expect("configure first");

    let mut second_cfg = PlaybackConfig::default();
    second_cfg.logging.path = Some(second_log.clone());
    let second = Playback::from_config(&second_cfg, None).expect("configure second");

    let _ = second.replay(&Request::get("/second").build().expect("build"));
    let _ = first.replay(&Request::get("/first").build().expect("build"));

    let first_text = std::fs::read_to_string(&first_log).expect("read first");
    let second_text = std::fs::read_to_string(&second_log).expect("read second");
    assert!(first_text.contains("/first") && !first_text.contains("/second"));
    assert!(second_text.contains("/second") && !second_text.contains("/first"));

    let silent = Playback::from_config(&PlaybackConfig::default(), None).expect("configure");
    silent
        .record(
            Request::get("/unlogged").build().expect("build"),
            Response::ok().build().expect("build"),
        )
        .expect("record");
    assert!(!std::fs::read_to_string(&first_log)
        .expect("read first")
        .contains("/unlogged"));
}
