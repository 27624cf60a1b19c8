use crate::matcher::{MatchResult, RequestMatcher};
use crate::request::{QueryParams, Request};

#[derive(Debug, Clone, Copy, Default)]
pub struct MethodMatcher;

impl RequestMatcher for MethodMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        if candidate.method() == recorded.method() {
            MatchResult::matched()
        } else {
            MatchResult::mismatch(format!(
                "method differs: {} vs {}",
                candidate.method(),
                recorded.method()
            ))
        }
    }
}

/// Scheme, authority and path. The query string is left to
/// [`QueryParamMatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UriMatcher;

impl RequestMatcher for UriMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        let (a, b) = (candidate.uri(), recorded.uri());
        if a.scheme() != b.scheme() {
            return MatchResult::mismatch(format!(
                "scheme differs: {:?} vs {:?}",
                a.scheme_str(),
                b.scheme_str()
            ));
        }
        if a.authority() != b.authority() {
            return MatchResult::mismatch(format!(
                "authority differs: {:?} vs {:?}",
                a.authority().map(|x| x.as_str()),
                b.authority().map(|x| x.as_str())
            ));
        }
        if a.path() != b.path() {
            return MatchResult::mismatch(format!(
                "path differs: {} vs {}",
                a.path(),
                b.path()
            ));
        }
        MatchResult::matched()
    }
}

/// Same parameter names, and per name the same values. Values are compared
/// as a multiset unless `ordered` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParamMatcher {
    ordered: bool,
}

impl QueryParamMatcher {
    pub fn unordered() -> Self {
        Self { ordered: false }
    }

    pub fn ordered() -> Self {
        Self { ordered: true }
    }

    fn normalized(&self, params: &QueryParams) -> QueryParams {
        if self.ordered {
            return params.clone();
        }
        params
            .iter()
            .map(|(name, values)| {
                let mut values = values.clone();
                values.sort();
                (name.clone(), values)
            })
            .collect()
    }
}

impl RequestMatcher for QueryParamMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        let a = self.normalized(candidate.query_params());
        let b = self.normalized(recorded.query_params());
        if a == b {
            return MatchResult::matched();
        }
        let differing = a
            .keys()
            .chain(b.keys())
            .find(|name| a.get(*name) != b.get(*name))
            .cloned()
            .unwrap_or_default();
        MatchResult::mismatch(format!(
            "query parameter `{differing}` differs: {:?} vs {:?}",
            a.get(&differing),
            b.get(&differing)
        ))
    }
}

/// Compares only the configured significant headers; names are matched
/// case-insensitively and values exactly, in order.
#[derive(Debug, Clone, Default)]
pub struct HeaderMatcher {
    significant: Vec<String>,
}

impl HeaderMatcher {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            significant: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn significant(&self) -> &[String] {
        &self.significant
    }
}

impl RequestMatcher for HeaderMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        for name in &self.significant {
            let (a, b) = (candidate.header(name), recorded.header(name));
            if a != b {
                return MatchResult::mismatch(format!(
                    "header `{name}` differs: {a:?} vs {b:?}"
                ));
            }
        }
        MatchResult::matched()
    }
}

/// Byte-exact bodies; a missing body equals an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyMatcher;

impl RequestMatcher for BodyMatcher {
    fn matches(&self, candidate: &Request, recorded: &Request) -> MatchResult {
        let a = candidate.body().unwrap_or_default();
        let b = recorded.body().unwrap_or_default();
        if a == b {
            MatchResult::matched()
        } else {
            MatchResult::mismatch(format!(
                "body differs: {} bytes vs {} bytes",
                a.len(),
                b.len()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BodyMatcher, HeaderMatcher, MethodMatcher, QueryParamMatcher, UriMatcher};
    use crate::matcher::RequestMatcher;
    use crate::request::Request;

    fn req(builder: crate::request::RequestBuilder) -> Request {
        builder.build().expect("build request")
    }

    #[test]
    fn method_matcher_compares_methods() {
        let get = req(Request::get("/"));
        let post = req(Request::post("/"));
        assert!(MethodMatcher.matches(&get, &get.clone()).is_match());
        let result = MethodMatcher.matches(&get, &post);
        assert!(!result.is_match());
        assert_eq!(result.detail(), Some("method differs: GET vs POST"));
    }

    #[test]
    fn uri_matcher_ignores_query_string() {
        let a = req(Request::get("http://api.test/a?x=1"));
        let b = req(Request::get("http://api.test/a?x=2"));
        let c = req(Request::get("http://api.test/b"));
        let d = req(Request::get("https://api.test/a"));
        let e = req(Request::get("http://other.test/a"));
        assert!(UriMatcher.matches(&a, &b).is_match());
        assert!(!UriMatcher.matches(&a, &c).is_match());
        assert!(!UriMatcher.matches(&a, &d).is_match());
        assert!(!UriMatcher.matches(&a, &e).is_match());
    }

    #[test]
    fn query_matcher_ignores_order_by_default() {
        let a = req(Request::get("/?id=1&id=2&tag=x"));
        let b = req(Request::get("/?tag=x&id=2&id=1"));
        assert!(QueryParamMatcher::default().matches(&a, &b).is_match());
        assert!(!QueryParamMatcher::ordered().matches(&a, &b).is_match());
    }

    #[test]
    fn query_matcher_reports_differing_name() {
        let a = req(Request::get("/").query_param("id", "1"));
        let b = req(Request::get("/").query_param("id", "2"));
        let result = QueryParamMatcher::unordered().matches(&a, &b);
        assert!(!result.is_match());
        assert!(result.detail().unwrap_or_default().contains("`id`"));

        let missing = req(Request::get("/"));
        assert!(!QueryParamMatcher::unordered().matches(&a, &missing).is_match());
    }

    #[test]
    fn header_matcher_only_looks_at_significant_headers() {
        let matcher = HeaderMatcher::new(["Accept"]);
        let a = req(Request::get("/")
            .header("accept", "application/json")
            .header("X-Trace-Id", "1"));
        let b = req(Request::get("/")
            .header("X-Trace-Id", "2")
            .header("ACCEPT", "application/json"));
        let c = req(Request::get("/").header("Accept", "application/xml"));
        let d = req(Request::get("/"));
        assert!(matcher.matches(&a, &b).is_match());
        assert!(!matcher.matches(&a, &c).is_match());
        assert!(!matcher.matches(&a, &d).is_match());
        assert!(HeaderMatcher::default().matches(&a, &c).is_match());
    }

    #[test]
    fn body_matcher_treats_missing_as_empty() {
        let none = req(Request::post("/x"));
        let empty = req(Request::post("/x").body(Vec::new()));
        let hello = req(Request::post("/x").body("hello"));
        let world = req(Request::post("/x").body("world"));
        assert!(BodyMatcher.matches(&none, &empty).is_match());
        assert!(BodyMatcher.matches(&hello, &hello.clone()).is_match());
        assert!(!BodyMatcher.matches(&hello, &world).is_match());
        assert!(!BodyMatcher.matches(&none, &hello).is_match());
    }
}
