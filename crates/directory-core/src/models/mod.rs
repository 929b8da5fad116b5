pub mod filter_params;
pub mod focus_area;

pub use filter_params::{is_active_value, FilterCountOptions, FilterParameters, QueryStringError};
pub use focus_area::{FocusAreaError, FocusAreaNode, FocusAreaTree};
