use crate::errors::PlaybackError;
use crate::headers::Headers;
use crate::url_decoder::query_pairs;
use http::{Method, Uri};
use std::collections::BTreeMap;

pub type QueryParams = BTreeMap<String, Vec<String>>;

/// An outgoing HTTP request as seen by the matcher. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: Uri,
    query_params: QueryParams,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn get(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::GET).uri(uri)
    }

    pub fn post(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::POST).uri(uri)
    }

    pub fn put(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::PUT).uri(uri)
    }

    pub fn delete(uri: &str) -> RequestBuilder {
        Self::builder().method(Method::DELETE).uri(uri)
    }

    /// Reassembles a request whose query parameters were already derived.
    pub(crate) fn from_parts(
        method: Method,
        uri: Uri,
        query_params: QueryParams,
        headers: Headers,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            method,
            uri,
            query_params,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&[String]> {
        self.query_params.get(name).map(Vec::as_slice)
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
}

/// Accumulates request fields; `build` validates and freezes them.
///
/// The first invalid argument is kept and reported by `build`, so calls can
/// be chained without intermediate `?`.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    query_params: QueryParams,
    headers: Headers,
    body: Option<Vec<u8>>,
    error: Option<PlaybackError>,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn method_name(mut self, method: &str) -> Self {
        match Method::from_bytes(method.as_bytes()) {
            Ok(method) => self.method = Some(method),
            Err(e) => self.fail(format!("invalid method `{method}`: {e}")),
        }
        self
    }

    /// An empty URI stands for `/`.
    pub fn uri(mut self, uri: &str) -> Self {
        match parse_uri(uri) {
            Ok(parsed) => self.uri = Some(parsed),
            Err(e) => self.error = self.error.take().or(Some(e)),
        }
        self
    }

    pub fn query_param(mut self, name: &str, value: &str) -> Self {
        self.query_params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn query_values<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.query_params
            .entry(name.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if name.trim().is_empty() {
            self.fail("header name must not be empty".to_string());
        } else {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<Request, PlaybackError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let uri = self.uri.unwrap_or_else(|| Uri::from_static("/"));
        let mut query_params = self.query_params;
        if let Some(raw_query) = uri.query() {
            for (name, value) in query_pairs(raw_query) {
                query_params.entry(name).or_default().push(value);
            }
        }
        Ok(Request {
            method: self.method.unwrap_or(Method::GET),
            uri,
            query_params,
            headers: self.headers,
            body: self.body,
        })
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(PlaybackError::InvalidInput(message));
        }
    }
}

/// Absolute URIs (`scheme://authority/...`) keep their scheme and authority.
/// Any other reference is a path relative to the root, so `items/1`,
/// `?x=1` and `a` become `/items/1`, `/?x=1` and `/a`. Fragments are never
/// sent to a server and are rejected.
pub(crate) fn parse_uri(uri: &str) -> Result<Uri, PlaybackError> {
    let trimmed = uri.trim();
    if trimmed.is_empty() {
        return Ok(Uri::from_static("/"));
    }
    if trimmed.contains('#') {
        return Err(PlaybackError::InvalidInput(format!(
            "invalid uri `{uri}`: fragments are not part of a request"
        )));
    }
    let normalized = if trimmed.contains("://") || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    normalized
        .parse::<Uri>()
        .map_err(|e| PlaybackError::InvalidInput(format!("invalid uri `{uri}`: {e}")))
}
