//! Media-type header values (`type/subtype; key=value; ...`).

use crate::errors::PlaybackError;
use encoding_rs::{Encoding, UTF_8};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub media_type: String,
    pub subtype: String,
    pub parameters: BTreeMap<String, String>,
}

impl MediaType {
    pub fn parse(value: &str) -> Result<Self, PlaybackError> {
        if value.trim().is_empty() {
            return Err(PlaybackError::InvalidInput(
                "'mediatype' must not be empty".to_string(),
            ));
        }

        let mut segments = value.split(';');
        let full_type = segments.next().unwrap_or_default().trim();
        let full_type = if full_type == "*" { "*/*" } else { full_type };

        // Only the first two `/` segments count: `text/plain/x` is `text/plain`.
        let mut type_segments = full_type.split('/');
        let media_type = type_segments.next().unwrap_or_default();
        let subtype = type_segments.next().ok_or_else(|| {
            PlaybackError::InvalidInput(format!("media type `{value}` has no subtype"))
        })?;

        let parameters = segments
            .filter_map(|segment| segment.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            media_type: media_type.to_string(),
            subtype: subtype.to_string(),
            parameters,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Charset named by the `charset` parameter, or UTF-8 when it is absent
    /// or not a known label.
    pub fn charset(&self) -> &'static Encoding {
        self.parameter("charset")
            .map(|label| label.trim_matches('"'))
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }
}
