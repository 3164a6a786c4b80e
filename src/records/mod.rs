//! Records Module
//!
//! Client records, their validation, and the store that owns them.

mod model;
mod store;
pub mod validation;

pub use model::{Client, ClientCreate, ClientUpdate, SearchFilter, SearchPage};
pub use store::{InMemoryRecordStore, RecordError, RecordStore};
