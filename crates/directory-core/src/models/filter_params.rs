use crate::constants::FALSE_VALUE;
use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Characters left untouched when encoding a query component
/// (the unreserved set of `application/x-www-form-urlencoded`).
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryStringError {
    #[error("Query component is not valid UTF-8 after decoding: {0}")]
    InvalidUtf8(String),
}

/// Active filter parameters of one page, mirroring its URL query string.
///
/// A key is present only while its filter is active: setting a key to `None`
/// or to an empty string removes it, so the map never holds an "unset" sentinel.
/// Insertion order is kept for serialization; equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, String>",
    into = "IndexMap<String, String>"
)]
pub struct FilterParameters {
    entries: IndexMap<String, String>,
}

impl FilterParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set or remove a parameter. `None` and `""` both remove the key.
    /// Overwriting an existing key keeps its position.
    pub fn set(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) if !value.is_empty() => {
                self.entries.insert(key.to_string(), value.to_string());
            }
            _ => {
                self.entries.shift_remove(key);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Count the parameters that represent an active filter.
    pub fn active_count(&self, options: &FilterCountOptions<'_>) -> usize {
        self.iter()
            .filter(|(key, _)| !options.excluded.contains(*key))
            .filter(|(key, value)| match &options.predicate {
                Some(predicate) => predicate(key, value),
                None => is_active_value(value),
            })
            .count()
    }

    /// Parse a query string (with or without the leading `?`).
    ///
    /// `+` decodes to a space, pairs without a value are dropped and a
    /// repeated key keeps its last value.
    pub fn from_query_string(query: &str) -> Result<Self, QueryStringError> {
        let mut params = Self::new();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key)?;
            let value = decode_component(raw_value)?;
            if key.is_empty() {
                continue;
            }
            params.set(&key, Some(&value));
        }

        Ok(params)
    }

    /// Serialize to a query string without the leading `?`, in insertion order.
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for FilterParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K, V> FromIterator<(K, V)> for FilterParameters
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key.as_ref(), Some(value.as_ref()));
        }
        params
    }
}

impl From<IndexMap<String, String>> for FilterParameters {
    fn from(entries: IndexMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<FilterParameters> for IndexMap<String, String> {
    fn from(params: FilterParameters) -> Self {
        params.entries
    }
}

/// Default activity rule: non-empty and not a switched-off boolean toggle.
pub fn is_active_value(value: &str) -> bool {
    !value.is_empty() && value != FALSE_VALUE
}

fn encode_component(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT)
        .to_string()
        .replace("%20", "+")
}

fn decode_component(component: &str) -> Result<String, QueryStringError> {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| QueryStringError::InvalidUtf8(component.to_string()))
}

/// Options for [`FilterParameters::active_count`].
#[derive(Default)]
pub struct FilterCountOptions<'a> {
    excluded: HashSet<String>,
    predicate: Option<Box<dyn Fn(&str, &str) -> bool + 'a>>,
}

impl<'a> FilterCountOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never count these keys (pagination, sort order, view type...).
    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Replace the default activity rule with a per-key predicate.
    pub fn predicate(mut self, predicate: impl Fn(&str, &str) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl fmt::Debug for FilterCountOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCountOptions")
            .field("excluded", &self.excluded)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
