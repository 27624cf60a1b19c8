use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Forward live and store every exchange.
    Record,
    /// Answer only from recordings; never forward.
    #[default]
    Replay,
    /// Answer from recordings, forwarding and storing on a miss.
    Play,
}

impl PlaybackMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "record" => Some(Self::Record),
            "replay" => Some(Self::Replay),
            "play" => Some(Self::Play),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Replay => "replay",
            Self::Play => "play",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    #[default]
    Memory,
    Jsonl,
    Sqlite,
}

impl RepositoryBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Jsonl => "jsonl",
            Self::Sqlite => "sqlite",
        }
    }
}
