//! Clients Cache - customer record API with a search result cache
//!
//! Searches are cached under a key derived from their filters; every write
//! invalidates the affected record and all cached searches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod records;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
