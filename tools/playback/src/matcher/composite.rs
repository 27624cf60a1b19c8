use crate::headers::ACCEPT;
use crate::matcher::builtin::{
    BodyMatcher, HeaderMatcher, MethodMatcher, QueryParamMatcher, UriMatcher,
};
use crate::matcher::{MatchResult, RequestMatcher};
use crate::request::Request;

/// Headers compared by the default matcher. Everything else is incidental.
pub const DEFAULT_SIGNIFICANT_HEADERS: &[&str] = &[ACCEPT];

/// Logical AND over a list of matchers. An empty composite matches
/// everything.
#[derive(Default)]
pub struct CompositeMatcher {
    matchers: Vec<Box<dyn RequestMatcher>>,
}

impl CompositeMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, matcher: impl RequestMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl RequestMatcher for CompositeMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        self.matchers
            .iter()
            .map(|matcher| matcher.matches(candidate, recorded))
            .find(|result| !result.is_match())
            .unwrap_or_else(MatchResult::matched)
    }
}

impl std::fmt::Debug for CompositeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMatcher")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}

/// Method AND URI AND query parameters AND significant headers AND body.
pub fn default_matcher() -> CompositeMatcher {
    matcher_with_headers(DEFAULT_SIGNIFICANT_HEADERS.iter().copied(), false)
}

pub fn matcher_with_headers<I, S>(
    significant_headers: I,
    ordered_query_values: bool,
) -> CompositeMatcher
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let query = if ordered_query_values {
        QueryParamMatcher::ordered()
    } else {
        QueryParamMatcher::unordered()
    };
    CompositeMatcher::new()
        .with(MethodMatcher)
        .with(UriMatcher)
        .with(query)
        .with(HeaderMatcher::new(significant_headers))
        .with(BodyMatcher)
}
