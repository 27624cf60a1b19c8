use serde::{Deserialize, Serialize};

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Ordered multimap keyed by case-insensitive header name.
///
/// Names keep the casing they were first added with; values keep insertion
/// order within a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, values)) => values.push(value.to_string()),
            None => self
                .entries
                .push((name.to_string(), vec![value.to_string()])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Headers, CONTENT_TYPE};

    #[test]
    fn lookups_ignore_name_case_and_keep_value_order() {
        let mut headers = Headers::new();
        headers.append("content-type", "text/plain");
        headers.append("X-Trace", "a");
        headers.append(CONTENT_TYPE, "charset=utf-8");

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get("CONTENT-TYPE"),
            Some(&["text/plain".to_string(), "charset=utf-8".to_string()][..])
        );
        assert_eq!(headers.first("x-trace"), Some("a"));
        assert!(!headers.contains("Accept"));
        let names = headers.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec!["content-type", "X-Trace"]);
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("Set-Cookie", "b=2");
        let json = serde_json::to_string(&headers).expect("serialize");
        assert_eq!(json, r#"[["Set-Cookie",["a=1","b=2"]]]"#);
        let back: Headers = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, headers);
    }
}
