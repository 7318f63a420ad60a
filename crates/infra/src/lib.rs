//! Infrastructure layer: configuration, database wiring and store adapters.

pub mod config;
pub mod db;
pub mod store;

pub use config::{ConfigError, Settings};
pub use store::{Stores, open_stores};
