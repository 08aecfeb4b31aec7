use reqwest::Url;

/// A value that may be sent as a query parameter. `None` and empty strings
/// are never sent.
pub trait QueryValue {
    fn into_query_value(self) -> Option<String>;
}

macro_rules! display_query_value {
    ($($ty:ty),*) => {
        $(impl QueryValue for $ty {
            fn into_query_value(self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

display_query_value!(u32, u64, i32, i64, usize, bool, f64);

impl QueryValue for &str {
    fn into_query_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl QueryValue for String {
    fn into_query_value(self) -> Option<String> {
        Some(self)
    }
}

impl<T: QueryValue> QueryValue for Option<T> {
    fn into_query_value(self) -> Option<String> {
        self.and_then(QueryValue::into_query_value)
    }
}

/// Ordered filter set. Names may carry comparison suffixes (`lap_number<=`).
/// Lists become repeated same-name pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar filter, replacing any earlier value under `name`.
    pub fn param(mut self, name: &str, value: impl QueryValue) -> Self {
        self.pairs.retain(|(key, _)| key != name);
        if let Some(value) = value.into_query_value().filter(|v| !v.is_empty()) {
            self.pairs.push((name.to_string(), value));
        }
        self
    }

    pub fn params<V: QueryValue>(mut self, name: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.pairs.retain(|(key, _)| key != name);
        for value in values {
            if let Some(value) = value.into_query_value().filter(|v| !v.is_empty()) {
                self.pairs.push((name.to_string(), value));
            }
        }
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs.iter());
    }
}
