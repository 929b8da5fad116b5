/// Delimiter used when several values share one query parameter,
/// e.g. `focusAreas=Public%20Goods%7CAI`.
pub const URL_QUERY_VALUE_SEPARATOR: &str = "|";

/// Query parameter holding the selected focus-area titles.
pub const FOCUS_AREAS_PARAM: &str = "focusAreas";

/// Key reported to the analytics listener when every filter is cleared at once.
pub const CLEAR_ALL_KEY: &str = "*";

/// Default quiet period before a filter change is reported to analytics.
/// Long enough to swallow fast typing in a search box.
pub const DEFAULT_ANALYTICS_DEBOUNCE_MS: u64 = 300;

/// Value of a boolean toggle filter that is switched off.
/// Such params stay in the query string but are not active filters.
pub const FALSE_VALUE: &str = "false";

/// Display and pagination state commonly kept next to filters in the query string.
pub const DISPLAY_PARAMS: [&str; 3] = ["viewType", "sort", "page"];
