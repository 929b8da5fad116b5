pub mod debounce;
pub mod filter_store;
pub mod focus_area_filter;

pub use debounce::Debouncer;
pub use filter_store::{FilterChange, FilterChangeListener, FilterStore, SubscriptionId};
pub use focus_area_filter::{selected_focus_areas, toggle_focus_area};
