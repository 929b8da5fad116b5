use crate::constants::DEFAULT_ANALYTICS_DEBOUNCE_MS;
use crate::store::FilterChangeListener;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Per-domain settings for a [`FilterStore`](crate::store::FilterStore).
///
/// `tracked_params` is advisory: the store accepts any key and only logs
/// untracked ones.
#[derive(Clone)]
pub struct FilterStoreConfig {
    pub namespace: String,
    pub tracked_params: HashSet<String>,
    pub analytics_debounce: Duration,
    /// Keys skipped by [`FilterStore::active_filter_count`](crate::store::FilterStore::active_filter_count).
    pub count_excluded_params: HashSet<String>,
    pub on_filter_change: Option<Arc<dyn FilterChangeListener>>,
}

impl FilterStoreConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            tracked_params: HashSet::new(),
            analytics_debounce: Duration::from_millis(DEFAULT_ANALYTICS_DEBOUNCE_MS),
            count_excluded_params: HashSet::new(),
            on_filter_change: None,
        }
    }

    pub fn with_tracked_params<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked_params.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_count_excluded_params<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.count_excluded_params
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_analytics_debounce(mut self, delay: Duration) -> Self {
        self.analytics_debounce = delay;
        self
    }

    pub fn with_listener(mut self, listener: impl FilterChangeListener + 'static) -> Self {
        self.on_filter_change = Some(Arc::new(listener));
        self
    }

    pub fn tracks(&self, key: &str) -> bool {
        self.tracked_params.contains(key)
    }
}

impl fmt::Debug for FilterStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStoreConfig")
            .field("namespace", &self.namespace)
            .field("tracked_params", &self.tracked_params)
            .field("analytics_debounce", &self.analytics_debounce)
            .field("count_excluded_params", &self.count_excluded_params)
            .field("on_filter_change", &self.on_filter_change.is_some())
            .finish()
    }
}
