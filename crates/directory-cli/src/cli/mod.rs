pub mod commands;
pub mod config;

pub use config::{default_config_path, DirectoryConfig, StoreProfile};
