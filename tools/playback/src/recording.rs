//! Serializable mirrors of `Request`/`Response` for durable stores.
//!
//! Bodies are stored as lowercase hex next to their SHA-256 digest; the
//! digest is checked when a record is turned back into a request or
//! response, so a damaged file fails loudly instead of replaying wrong
//! bytes.

use crate::errors::PlaybackError;
use crate::headers::Headers;
use crate::request::{parse_uri, QueryParams, Request};
use crate::response::Response;
use http::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub hex: String,
    pub sha256: String,
}

impl BodyRecord {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            hex: hex_bytes(bytes),
            sha256: hex_bytes(&Sha256::digest(bytes)),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PlaybackError> {
        let bytes = unhex(&self.hex)?;
        let digest = hex_bytes(&Sha256::digest(&bytes));
        if digest != self.sha256 {
            return Err(PlaybackError::Io(format!(
                "recorded body digest mismatch: expected {} got {digest}",
                self.sha256
            )));
        }
        Ok(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub query_params: QueryParams,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<BodyRecord>,
}

impl From<&Request> for RequestRecord {
    fn from(request: &Request) -> Self {
        Self {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            query_params: request.query_params().clone(),
            headers: request.headers().clone(),
            body: request.body().map(BodyRecord::from_bytes),
        }
    }
}

impl RequestRecord {
    pub fn into_request(self) -> Result<Request, PlaybackError> {
        let method = Method::from_bytes(self.method.as_bytes()).map_err(|e| {
            PlaybackError::InvalidInput(format!("recorded method `{}`: {e}", self.method))
        })?;
        let uri = parse_uri(&self.uri)?;
        let body = self.body.map(|body| body.to_bytes()).transpose()?;
        Ok(Request::from_parts(
            method,
            uri,
            self.query_params,
            self.headers,
            body,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status_code: String,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<BodyRecord>,
}

impl From<&Response> for ResponseRecord {
    fn from(response: &Response) -> Self {
        Self {
            status_code: response.status_code().to_string(),
            status_text: response.status_text().to_string(),
            headers: response.headers().clone(),
            body: response.body().map(BodyRecord::from_bytes),
        }
    }
}

impl ResponseRecord {
    pub fn into_response(self) -> Result<Response, PlaybackError> {
        let body = self.body.map(|body| body.to_bytes()).transpose()?;
        Ok(Response::from_parts(
            self.status_code,
            self.status_text,
            self.headers,
            body,
        ))
    }
}

/// One line of a JSONL recording file, or one row of the SQLite store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub request: RequestRecord,
    pub response: ResponseRecord,
    #[serde(default)]
    pub recorded_at_unix_ms: i64,
}

/// Short digest used in log payloads instead of raw body bytes.
pub fn body_fingerprint(body: Option<&[u8]>) -> String {
    match body {
        Some(bytes) => {
            let hash = Sha256::digest(bytes);
            format!("<sha256:{}>", hex_bytes(&hash[..8]))
        }
        None => "<none>".to_string(),
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(text: &str) -> Result<Vec<u8>, PlaybackError> {
    if text.len() % 2 != 0 {
        return Err(PlaybackError::Io("recorded body has odd hex length".to_string()));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| PlaybackError::Io(format!("recorded body has bad hex at {i}")))
        })
        .collect()
}
