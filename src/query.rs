// Query strings for list endpoints. Keys keep insertion order, absent values are dropped.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    // Add key=value when there is a value, skip it otherwise
    pub fn push<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    // "/artists" + params -> "/artists?page=1&limit=8"
    pub fn append_to(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.to_query_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_exactly_the_given_pairs() {
        let query = QueryParams::new()
            .push("page", Some(2))
            .push("limit", Some(8))
            .push("status", Some("active"));
        assert_eq!(query.to_query_string(), "page=2&limit=8&status=active");
    }

    #[test]
    fn omits_absent_values() {
        let query = QueryParams::new()
            .push("page", Some(2))
            .push("limit", Some(8))
            .push("status", None::<&str>);
        assert_eq!(query.to_query_string(), "page=2&limit=8");
        assert!(!query.to_query_string().contains("status"));
    }

    #[test]
    fn encodes_values_and_skips_question_mark_when_empty() {
        let query = QueryParams::new().push("search", Some("ink & line"));
        assert_eq!(query.append_to("/artists"), "/artists?search=ink%20%26%20line");
        assert_eq!(QueryParams::new().append_to("/artists"), "/artists");
    }
}
