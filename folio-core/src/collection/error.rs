//! Collection errors

use thiserror::Error;

use crate::domain::{Category, DomainError, PhotoId};
use crate::repository::StoreError;

pub type CollectionResult<T> = Result<T, CollectionError>;

#[derive(Debug, Error)]
pub enum CollectionError {
    /// The category could not be fetched; this is not an empty collection
    #[error("cannot load {category}: {source}")]
    StoreUnavailable {
        category: Category,
        #[source]
        source: StoreError,
    },
    /// The intent referenced a photo missing from the local view
    #[error("photo {id} is not in the {category} view")]
    ItemNotFound { category: Category, id: PhotoId },
    /// A batched write did not confirm; resync before trusting the view
    #[error("commit for {category} failed: {source}")]
    CommitFailed {
        category: Category,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CollectionError {
    /// True when the caller should reload the category from the store
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            CollectionError::StoreUnavailable { .. }
                | CollectionError::ItemNotFound { .. }
                | CollectionError::CommitFailed { .. }
        )
    }
}
