//! Collection Layer
//!
//! The reorderable collection manager: an optimistic, per-category view of
//! photo order kept in sync with a document store.
//! - reorder: pure list splice + renumbering
//! - state: per-category sync state machine
//! - manager: the operations renderers and the admin front call
//! - gallery: read-only grouping for the public gallery

mod error;
mod reorder;
mod state;
mod manager;
mod gallery;


pub use error::{CollectionError, CollectionResult};
pub use reorder::{move_to, renumber};
pub use state::{CommitOutcome, SyncState};
pub use manager::CollectionManager;
pub use gallery::photos_by_category;
