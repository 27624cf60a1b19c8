//! Request equivalence for playback lookups.
//!
//! A matcher compares a candidate request against a recorded one and says
//! whether they are "the same" for playback. Matchers never fail: a
//! difference is a `MatchResult` with `is_match() == false` and an optional
//! detail naming what differed. Matchers compose by logical AND through
//! [`CompositeMatcher`].

pub mod builtin;
pub mod composite;

pub use builtin::{BodyMatcher, HeaderMatcher, MethodMatcher, QueryParamMatcher, UriMatcher};
pub use composite::{
    default_matcher, matcher_with_headers, CompositeMatcher, DEFAULT_SIGNIFICANT_HEADERS,
};

use crate::request::Request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    matched: bool,
    detail: Option<String>,
}

impl MatchResult {
    pub fn matched() -> Self {
        Self {
            matched: true,
            detail: None,
        }
    }

    pub fn mismatch(detail: impl Into<String>) -> Self {
        Self {
            matched: false,
            detail: Some(detail.into()),
        }
    }

    pub fn of(matched: bool) -> Self {
        Self {
            matched,
            detail: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

pub trait RequestMatcher: Send + Sync {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult;
}

impl<F> RequestMatcher for F
where
    F: Fn(&Request, &Request) -> MatchResult + Send + Sync,
{
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        self(candidate, recorded)
    }
}
