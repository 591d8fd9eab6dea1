//! Query parameter multi-map (`name -> values`) for the outgoing request.
use std::collections::BTreeMap;

use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    /// Parse a raw (`a=1&b=2&a=3`) query string. `None` yields an empty map.
    pub fn parse(query: Option<&str>) -> Self {
        let Some(query) = query else {
            return Self::default();
        };

        let mut params = Self::default();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            params.0.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as `application/x-www-form-urlencoded`. Empty map renders as `""`.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (k, values) in &self.0 {
            for v in values {
                out.append_pair(k, v);
            }
        }
        out.finish()
    }
}

impl FromIterator<(String, Vec<String>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
