use crate::errors::PlaybackError;
use crate::headers::{Headers, CONTENT_TYPE};
use crate::media_type::MediaType;
use encoding_rs::{Encoding, UTF_8};

/// A recorded or live HTTP response. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: String,
    status_text: String,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn ok() -> ResponseBuilder {
        Self::builder().status_code("200").status_text("OK")
    }

    pub(crate) fn from_parts(
        status_code: String,
        status_text: String,
        headers: Headers,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            status_code,
            status_text,
            headers,
            body,
        }
    }

    pub fn status_code(&self) -> &str {
        &self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Charset from the first `Content-Type` value; UTF-8 when the header is
    /// missing, unparseable, or names an unknown charset.
    pub fn charset(&self) -> &'static Encoding {
        self.headers
            .first(CONTENT_TYPE)
            .and_then(|value| MediaType::parse(value).ok())
            .map(|media_type| media_type.charset())
            .unwrap_or(UTF_8)
    }

    pub fn body_as_string(&self) -> String {
        match &self.body {
            Some(bytes) => {
                let (text, _) = self.charset().decode_without_bom_handling(bytes);
                text.into_owned()
            }
            None => String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status_code: String,
    status_text: String,
    headers: Headers,
    body: Option<Vec<u8>>,
    error: Option<PlaybackError>,
}

impl ResponseBuilder {
    pub fn status_code(mut self, status_code: &str) -> Self {
        let trimmed = status_code.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if self.error.is_none() {
                self.error = Some(PlaybackError::InvalidInput(format!(
                    "status code `{status_code}` is not numeric"
                )));
            }
        } else {
            self.status_code = trimmed.to_string();
        }
        self
    }

    pub fn status(self, status: http::StatusCode) -> Self {
        let text = status.canonical_reason().unwrap_or_default().to_string();
        self.status_code(status.as_str()).status_text(&text)
    }

    pub fn status_text(mut self, status_text: &str) -> Self {
        self.status_text = status_text.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if name.trim().is_empty() {
            if self.error.is_none() {
                self.error = Some(PlaybackError::InvalidInput(
                    "header name must not be empty".to_string(),
                ));
            }
        } else {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<Response, PlaybackError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Response {
            status_code: self.status_code,
            status_text: self.status_text,
            headers: self.headers,
            body: self.body,
        })
    }
}
