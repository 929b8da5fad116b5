pub mod config;
pub mod constants;
pub mod models;
pub mod resolver;
pub mod store;

// Re-export the common types at crate root for convenience
pub use config::FilterStoreConfig;
pub use models::{
    FilterCountOptions, FilterParameters, FocusAreaError, FocusAreaNode, FocusAreaTree,
    QueryStringError,
};
pub use store::{FilterChange, FilterChangeListener, FilterStore, SubscriptionId};
