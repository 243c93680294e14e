//! # scheduler-store
//!
//! SQLite persistence for the scheduling engine's Loader and Writer
//! contracts, plus an in-memory test double.

mod schema;
mod time;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
