use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directory_core::constants::{DEFAULT_ANALYTICS_DEBOUNCE_MS, DISPLAY_PARAMS, FOCUS_AREAS_PARAM};
use directory_core::FilterStoreConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// One filter store profile per list page
    #[serde(default)]
    pub profiles: Vec<StoreProfile>,
}

/// Settings for the filter store of one list page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProfile {
    pub namespace: String,

    #[serde(default)]
    pub tracked_params: Vec<String>,

    #[serde(default = "default_debounce_ms")]
    pub analytics_debounce_ms: u64,

    /// Params that never count as active filters (sort, paging, view type)
    #[serde(default)]
    pub count_excluded_params: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_ANALYTICS_DEBOUNCE_MS
}

impl StoreProfile {
    fn builtin(namespace: &str, tracked: &[&str]) -> Self {
        Self {
            namespace: namespace.to_string(),
            tracked_params: tracked.iter().map(|s| s.to_string()).collect(),
            analytics_debounce_ms: DEFAULT_ANALYTICS_DEBOUNCE_MS,
            count_excluded_params: DISPLAY_PARAMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn to_store_config(&self) -> FilterStoreConfig {
        FilterStoreConfig::new(&self.namespace)
            .with_tracked_params(self.tracked_params.iter().cloned())
            .with_count_excluded_params(self.count_excluded_params.iter().cloned())
            .with_analytics_debounce(Duration::from_millis(self.analytics_debounce_ms))
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                StoreProfile::builtin(
                    "teams",
                    &[
                        "tags",
                        "membershipSources",
                        "fundingStage",
                        "technology",
                        "officeHoursOnly",
                        "isRecent",
                        FOCUS_AREAS_PARAM,
                        "searchBy",
                        "sort",
                        "viewType",
                        "page",
                    ],
                ),
                StoreProfile::builtin(
                    "members",
                    &[
                        "skills",
                        "region",
                        "country",
                        "metroArea",
                        "officeHoursOnly",
                        "openToWork",
                        "includeFriends",
                        "isRecent",
                        "searchBy",
                        "sort",
                        "viewType",
                        "page",
                    ],
                ),
                StoreProfile::builtin(
                    "projects",
                    &[
                        "funding",
                        "team",
                        FOCUS_AREAS_PARAM,
                        "isRecent",
                        "searchBy",
                        "sort",
                        "viewType",
                        "page",
                    ],
                ),
            ],
        }
    }
}

impl DirectoryConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DirectoryConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if present,
    /// else fall back to the built-in profiles.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Profile for `namespace`, or a bare profile with default settings.
    pub fn profile(&self, namespace: &str) -> StoreProfile {
        self.profiles
            .iter()
            .find(|profile| profile.namespace == namespace)
            .cloned()
            .unwrap_or_else(|| {
                tracing::debug!(namespace, "no profile configured, using defaults");
                StoreProfile::builtin(namespace, &[])
            })
    }
}

/// `<config dir>/directory/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("directory").join("config.json"))
}
