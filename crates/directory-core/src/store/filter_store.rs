use crate::config::FilterStoreConfig;
use crate::constants::CLEAR_ALL_KEY;
use crate::models::{FilterCountOptions, FilterParameters};
use crate::store::debounce::Debouncer;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

/// A filter change as reported to the analytics listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChange {
    /// Key passed to the last `set_param`, or `"*"` for a clear.
    pub key: String,
    pub value: Option<String>,
    /// Snapshot current when the report fired.
    pub params: Arc<FilterParameters>,
}

impl FilterChange {
    pub fn is_clear(&self) -> bool {
        self.key == CLEAR_ALL_KEY
    }
}

/// Receives debounced filter changes. Implemented for any matching closure.
///
/// Called from the tokio runtime the store was created on, so implementations
/// must be `Send + Sync`.
pub trait FilterChangeListener: Send + Sync {
    fn on_filter_change(&self, change: &FilterChange);
}

impl<F> FilterChangeListener for F
where
    F: Fn(&FilterChange) + Send + Sync,
{
    fn on_filter_change(&self, change: &FilterChange) {
        self(change)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&Arc<FilterParameters>) + Send + Sync>;

/// Last `set_param` arguments waiting for the debounce window to close.
struct PendingChange {
    key: String,
    value: Option<String>,
    /// Timer scheduled for this change; older timers must leave it alone.
    generation: u64,
}

/// State shared with the debounce task.
struct Shared {
    namespace: String,
    params: RwLock<Arc<FilterParameters>>,
    pending: Mutex<Option<PendingChange>>,
    next_generation: AtomicU64,
    listener: Option<Arc<dyn FilterChangeListener>>,
}

impl Shared {
    fn snapshot(&self) -> Arc<FilterParameters> {
        Arc::clone(&*self.params.read())
    }

    /// Report the pending change, if any, against the current snapshot.
    fn report_pending(&self) {
        let pending = self.pending.lock().take();
        if let Some(pending) = pending {
            self.report_change(pending);
        }
    }

    /// Timer callback. An aborted timer that was already running when a newer
    /// `set_param` came in finds a different generation and does nothing.
    fn report_scheduled(&self, generation: u64) {
        let pending = {
            let mut slot = self.pending.lock();
            let current = slot.as_ref().is_some_and(|p| p.generation == generation);
            if current {
                slot.take()
            } else {
                None
            }
        };
        if let Some(pending) = pending {
            self.report_change(pending);
        }
    }

    fn report_change(&self, pending: PendingChange) {
        self.report(FilterChange {
            key: pending.key,
            value: pending.value,
            params: self.snapshot(),
        });
    }

    fn report(&self, change: FilterChange) {
        if let Some(listener) = &self.listener {
            tracing::debug!(
                namespace = %self.namespace,
                key = %change.key,
                value = ?change.value,
                "reporting filter change"
            );
            listener.on_filter_change(&change);
        }
    }
}

/// Active filter parameters of one page or domain ("teams", "members", ...).
///
/// Every mutation installs a fresh [`FilterParameters`] snapshot, so consumers
/// can detect changes with [`Arc::ptr_eq`]. Subscribers are called
/// synchronously after each mutation. The analytics listener is debounced for
/// [`set_param`](Self::set_param) and called immediately for
/// [`clear_params`](Self::clear_params).
pub struct FilterStore {
    config: FilterStoreConfig,
    shared: Arc<Shared>,
    debouncer: Debouncer,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl FilterStore {
    /// Create a store whose debounce timer runs on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime, like `tokio::spawn`.
    pub fn new(config: FilterStoreConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    pub fn with_runtime(config: FilterStoreConfig, runtime: Handle) -> Self {
        let shared = Arc::new(Shared {
            namespace: config.namespace.clone(),
            params: RwLock::new(Arc::new(FilterParameters::new())),
            pending: Mutex::new(None),
            next_generation: AtomicU64::new(0),
            listener: config.on_filter_change.clone(),
        });
        Self {
            debouncer: Debouncer::new(config.analytics_debounce, runtime),
            config,
            shared,
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &FilterStoreConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Current snapshot. A later mutation never changes a returned snapshot.
    pub fn params(&self) -> Arc<FilterParameters> {
        self.shared.snapshot()
    }

    pub fn get_param(&self, key: &str) -> Option<String> {
        self.shared.params.read().get(key).map(str::to_string)
    }

    /// Set `key` to `value`, or remove it when `value` is `None` or empty.
    ///
    /// Restarts the analytics debounce window; when it closes the listener
    /// gets this key/value with the snapshot current at that moment.
    pub fn set_param(&self, key: &str, value: Option<&str>) {
        if !self.config.tracks(key) {
            tracing::debug!(namespace = %self.config.namespace, key, "setting untracked filter param");
        }

        let snapshot = self.replace_params(|params| {
            let mut next = FilterParameters::clone(params);
            next.set(key, value);
            next
        });
        self.notify_subscribers(&snapshot);

        if self.shared.listener.is_some() {
            self.debouncer.cancel();
            let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
            *self.shared.pending.lock() = Some(PendingChange {
                key: key.to_string(),
                value: value.map(str::to_string),
                generation,
            });
            let shared: Weak<Shared> = Arc::downgrade(&self.shared);
            self.debouncer.schedule(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.report_scheduled(generation);
                }
            });
        }
    }

    /// Remove every parameter and report the clear right away.
    ///
    /// A pending debounced report is dropped; the listener sees exactly one
    /// `("*", None, {})` change, even when the store was already empty.
    pub fn clear_params(&self) {
        self.discard_pending();

        let snapshot = self.replace_params(|_| FilterParameters::new());
        self.notify_subscribers(&snapshot);

        self.shared.report(FilterChange {
            key: CLEAR_ALL_KEY.to_string(),
            value: None,
            params: snapshot,
        });
    }

    /// Replace all parameters, e.g. when syncing from the URL on navigation.
    /// Not reported to analytics.
    pub fn set_all_params(&self, params: FilterParameters) {
        let snapshot = self.replace_params(|_| params);
        self.notify_subscribers(&snapshot);
    }

    /// Number of active filters, skipping the configured excluded keys.
    pub fn active_filter_count(&self) -> usize {
        self.count_active_filters(FilterCountOptions::new())
    }

    /// Like [`active_filter_count`](Self::active_filter_count) with extra options.
    /// The configured excluded keys always apply on top of `options`.
    pub fn count_active_filters(&self, options: FilterCountOptions<'_>) -> usize {
        let options = options.exclude(self.config.count_excluded_params.iter().cloned());
        self.shared.params.read().active_count(&options)
    }

    /// Keys currently set that are not listed in `tracked_params`.
    pub fn untracked_params(&self) -> Vec<String> {
        self.shared
            .params
            .read()
            .keys()
            .filter(|key| !self.config.tracks(key))
            .map(str::to_string)
            .collect()
    }

    pub fn to_query_string(&self) -> String {
        self.shared.params.read().to_query_string()
    }

    pub fn has_pending_report(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Fire a pending analytics report now instead of waiting for the window.
    pub fn flush(&self) {
        self.debouncer.cancel();
        self.shared.report_pending();
    }

    /// Cancel a pending analytics report without firing it.
    /// Call when the owning page goes away; dropping the store does the same.
    pub fn dispose(&self) {
        self.discard_pending();
    }

    pub fn subscribe(
        &self,
        subscriber: impl Fn(&Arc<FilterParameters>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(subscriber)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    fn replace_params(
        &self,
        update: impl FnOnce(&FilterParameters) -> FilterParameters,
    ) -> Arc<FilterParameters> {
        let mut guard = self.shared.params.write();
        let next = Arc::new(update(&**guard));
        *guard = Arc::clone(&next);
        next
    }

    fn discard_pending(&self) {
        if self.debouncer.cancel() {
            tracing::debug!(namespace = %self.config.namespace, "dropping pending filter report");
        }
        self.shared.pending.lock().take();
    }

    fn notify_subscribers(&self, snapshot: &Arc<FilterParameters>) {
        // Copy out so a subscriber may call back into the store
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(snapshot);
        }
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("namespace", &self.config.namespace)
            .field("params", &self.shared.snapshot())
            .finish()
    }
}
