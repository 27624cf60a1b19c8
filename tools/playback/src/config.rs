use crate::errors::PlaybackError;
use crate::logging::{JsonlLogger, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::matcher::{matcher_with_headers, CompositeMatcher, DEFAULT_SIGNIFICANT_HEADERS};
use crate::repository::{
    InMemoryRecordingRepository, JsonlRecordingRepository, RecordingRepository,
    SqliteRecordingRepository,
};
use crate::types::{PlaybackMode, RepositoryBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub mode: Option<PlaybackMode>,
    pub recordings_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub playback: ModeConfig,
    pub recordings: RecordingsConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeConfig {
    pub mode: PlaybackMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingsConfig {
    pub backend: RepositoryBackend,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingConfig {
    pub significant_headers: Vec<String>,
    pub ordered_query_values: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            playback: ModeConfig {
                mode: PlaybackMode::Replay,
            },
            recordings: RecordingsConfig {
                backend: RepositoryBackend::Memory,
                path: None,
            },
            matching: MatchingConfig {
                significant_headers: DEFAULT_SIGNIFICANT_HEADERS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
                ordered_query_values: false,
            },
            logging: LoggingConfig {
                path: None,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            },
        }
    }
}

impl PlaybackConfig {
    pub fn matcher(&self) -> CompositeMatcher {
        matcher_with_headers(
            self.matching.significant_headers.iter().cloned(),
            self.matching.ordered_query_values,
        )
    }

    pub fn open_repository(&self) -> Result<Box<dyn RecordingRepository>, PlaybackError> {
        let path = || {
            self.recordings.path.as_deref().ok_or_else(|| {
                PlaybackError::InvalidConfig(format!(
                    "recordings.path is required for the {} backend",
                    self.recordings.backend.as_str()
                ))
            })
        };
        let repository: Box<dyn RecordingRepository> = match self.recordings.backend {
            RepositoryBackend::Memory => Box::new(InMemoryRecordingRepository::new()),
            RepositoryBackend::Jsonl => Box::new(JsonlRecordingRepository::open(path()?)?),
            RepositoryBackend::Sqlite => Box::new(SqliteRecordingRepository::open(path()?)?),
        };
        Ok(repository)
    }

    pub fn logger(&self) -> Option<JsonlLogger> {
        self.logging.path.as_ref().map(|path| {
            let mut logger = JsonlLogger::new(path);
            logger.max_payload_bytes = self.logging.max_payload_bytes;
            logger
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialPlaybackConfig {
    playback: Option<PartialModeConfig>,
    recordings: Option<PartialRecordingsConfig>,
    matching: Option<PartialMatchingConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialModeConfig {
    mode: Option<PlaybackMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRecordingsConfig {
    backend: Option<RepositoryBackend>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialMatchingConfig {
    significant_headers: Option<Vec<String>>,
    ordered_query_values: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

/// Defaults, then the file named by `overrides.config_path`, then the
/// remaining overrides.
pub fn load_config(overrides: &ConfigOverrides) -> Result<PlaybackConfig, PlaybackError> {
    let mut cfg = PlaybackConfig::default();

    if let Some(path) = &overrides.config_path {
        let contents = read_config_file(path)?;
        merge_partial_config(&mut cfg, parse_partial(&contents)?);
    }

    apply_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn parse_config(contents: &str) -> Result<PlaybackConfig, PlaybackError> {
    let mut cfg = PlaybackConfig::default();
    merge_partial_config(&mut cfg, parse_partial(contents)?);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<String, PlaybackError> {
    std::fs::read_to_string(path)
        .map_err(|e| PlaybackError::Io(format!("{}: {e}", path.display())))
}

fn parse_partial(contents: &str) -> Result<PartialPlaybackConfig, PlaybackError> {
    toml::from_str(contents).map_err(|e| PlaybackError::ConfigParse(e.to_string()))
}

fn merge_partial_config(cfg: &mut PlaybackConfig, partial: PartialPlaybackConfig) {
    if let Some(playback) = partial.playback {
        if let Some(mode) = playback.mode {
            cfg.playback.mode = mode;
        }
    }

    if let Some(recordings) = partial.recordings {
        if let Some(backend) = recordings.backend {
            cfg.recordings.backend = backend;
        }
        if let Some(path) = recordings.path {
            cfg.recordings.path = Some(path);
        }
    }

    if let Some(matching) = partial.matching {
        if let Some(headers) = matching.significant_headers {
            cfg.matching.significant_headers = headers;
        }
        if let Some(ordered) = matching.ordered_query_values {
            cfg.matching.ordered_query_values = ordered;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(path) = logging.path {
            cfg.logging.path = Some(path);
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }
}

fn apply_overrides(cfg: &mut PlaybackConfig, overrides: &ConfigOverrides) {
    if let Some(mode) = overrides.mode {
        cfg.playback.mode = mode;
    }
    if let Some(path) = &overrides.recordings_path {
        cfg.recordings.path = Some(path.clone());
    }
    if let Some(path) = &overrides.log_path {
        cfg.logging.path = Some(path.clone());
    }
}

fn validate_config(cfg: &PlaybackConfig) -> Result<(), PlaybackError> {
    if cfg.recordings.backend != RepositoryBackend::Memory && cfg.recordings.path.is_none() {
        return Err(PlaybackError::InvalidConfig(format!(
            "recordings.path is required for the {} backend",
            cfg.recordings.backend.as_str()
        )));
    }

    if cfg
        .matching
        .significant_headers
        .iter()
        .any(|name| name.trim().is_empty())
    {
        return Err(PlaybackError::InvalidConfig(
            "matching.significant_headers must not contain empty names".to_string(),
        ));
    }

    if cfg.logging.max_payload_bytes == 0 {
        return Err(PlaybackError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_config, parse_config, ConfigOverrides, PlaybackConfig};
    use crate::errors::PlaybackError;
    use crate::types::{PlaybackMode, RepositoryBackend};
    use std::path::PathBuf;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").expect("parse");
        assert_eq!(cfg, PlaybackConfig::default());
        assert_eq!(cfg.matching.significant_headers, vec!["Accept".to_string()]);
        assert_eq!(cfg.playback.mode, PlaybackMode::Replay);
    }

    #[test]
    fn partial_tables_override_only_named_keys() {
        let cfg = parse_config(
            r#"
            [playback]
            mode = "play"

            [recordings]
            backend = "jsonl"
            path = "tapes/api.jsonl"

            [matching]
            ordered_query_values = true
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.playback.mode, PlaybackMode::Play);
        assert_eq!(cfg.recordings.backend, RepositoryBackend::Jsonl);
        assert_eq!(cfg.recordings.path, Some(PathBuf::from("tapes/api.jsonl")));
        assert!(cfg.matching.ordered_query_values);
        assert_eq!(cfg.matching.significant_headers, vec!["Accept".to_string()]);
    }

    #[test]
    fn durable_backend_without_path_is_invalid() {
        let result = parse_config("[recordings]\nbackend = \"sqlite\"\n");
        assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            parse_config("[playback\nmode = 1"),
            Err(PlaybackError::ConfigParse(_))
        ));
        assert!(matches!(
            parse_config("[playback]\nmode = \"rewind\"\n"),
            Err(PlaybackError::ConfigParse(_))
        ));
    }

    #[test]
    fn empty_header_names_are_rejected() {
        assert!(parse_config("[matching]\nsignificant_headers = [\"Accept\", \" \"]\n").is_err());
        assert!(parse_config("[logging]\nmax_payload_bytes = 0\n").is_err());
    }

    #[test]
    fn overrides_apply_after_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("playback.toml");
        std::fs::write(
            &config_path,
            "[playback]\nmode = \"record\"\n[recordings]\nbackend = \"sqlite\"\npath = \"a.sqlite\"\n",
        )
        .expect("write config");

        let cfg = load_config(&ConfigOverrides {
            config_path: Some(config_path),
            mode: Some(PlaybackMode::Play),
            recordings_path: Some(PathBuf::from("b.sqlite")),
            log_path: None,
        })
        .expect("load");
        assert_eq!(cfg.playback.mode, PlaybackMode::Play);
        assert_eq!(cfg.recordings.backend, RepositoryBackend::Sqlite);
        assert_eq!(cfg.recordings.path, Some(PathBuf::from("b.sqlite")));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let result = load_config(&ConfigOverrides {
            config_path: Some(PathBuf::from("/nonexistent/playback.toml")),
            ..ConfigOverrides::default()
        });
        assert!(matches!(result, Err(PlaybackError::Io(_))));
    }

    #[test]
    fn config_builds_matcher_and_repository() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = PlaybackConfig::default();
        cfg.matching.significant_headers = vec!["Accept".to_string(), "Authorization".to_string()];
        assert_eq!(cfg.matcher().len(), 5);

        cfg.recordings.backend = RepositoryBackend::Jsonl;
        cfg.recordings.path = Some(dir.path().join("tapes.jsonl"));
        let repo = cfg.open_repository().expect("open");
        assert_eq!(repo.len().expect("len"), 0);
        assert!(cfg.logger().is_none());
    }
}
