//! Repository Layer
//!
//! Document-store abstractions and implementations.

mod traits;
mod db;
mod sqlite_store;
mod firestore;

#[cfg(test)]
mod tests;

pub use traits::{
    DocumentStore, HomeImageStore, PhotoFilter, PhotoSort, PortfolioStore, StoreError, StoreResult,
};
pub use db::init_db;
pub use sqlite_store::SqliteStore;
pub use firestore::{FirestoreConfig, FirestoreStore};
