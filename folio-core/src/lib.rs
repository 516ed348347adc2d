//! Folio Core
//!
//! Layered architecture:
//! - domain: photos, categories, home page images
//! - repository: document-store contract plus SQLite and Firestore stores
//! - collection: optimistic per-category ordering kept in sync with a store

pub mod domain;
pub mod repository;
pub mod collection;

pub use collection::{CollectionError, CollectionManager, CollectionResult, CommitOutcome, SyncState};
pub use domain::{Category, HomeImage, NewPhoto, Photo, PhotoId};
pub use repository::{DocumentStore, HomeImageStore, PortfolioStore, StoreError};
