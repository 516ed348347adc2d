//! Repository Layer - Core Traits
//!
//! Defines the document-store contract the collection manager is written
//! against. Implementations can use SQLite, a hosted REST store, etc.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Category, HomeImage, NewPhoto, Photo, PhotoId, PositionUpdate};

/// Errors raised by a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed record: {0}")]
    Decode(String),
    #[error("write requires an authenticated identity")]
    Unauthenticated,
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which records a query returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoFilter {
    pub include_deleted: bool,
}

impl PhotoFilter {
    /// Only photos that are not soft-deleted
    pub fn active() -> Self {
        Self { include_deleted: false }
    }

    /// Every photo, soft-deleted ones included
    pub fn all() -> Self {
        Self { include_deleted: true }
    }

    pub fn matches(&self, photo: &Photo) -> bool {
        self.include_deleted || photo.is_active()
    }
}

/// Result ordering of a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhotoSort {
    /// Display order: position, created_at, id
    #[default]
    PositionAsc,
    /// Newest first, id breaking ties
    CreatedAtDesc,
}

impl PhotoSort {
    pub fn apply(&self, photos: &mut [Photo]) {
        match self {
            PhotoSort::PositionAsc => photos.sort_by(Photo::display_cmp),
            PhotoSort::CreatedAtDesc => photos.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

/// Minimal document-store contract for photo records
///
/// Batch writes succeed or fail as a whole from the caller's point of view;
/// callers must not assume partial-success reporting.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List the photos of a category
    async fn query(&self, category: Category, filter: PhotoFilter, sort: PhotoSort) -> StoreResult<Vec<Photo>>;

    /// Apply several position changes together
    async fn batch_update(&self, updates: Vec<PositionUpdate>) -> StoreResult<()>;

    /// Set the deleted flag and timestamp on several photos together
    async fn batch_mark_deleted(&self, ids: Vec<PhotoId>, deleted_at: i64) -> StoreResult<()>;

    /// Register a freshly uploaded photo at `position`; the store assigns id and creation time
    async fn insert(&self, photo: NewPhoto, position: u32) -> StoreResult<Photo>;

    /// Find a photo by id, deleted or not
    async fn find(&self, id: &PhotoId) -> StoreResult<Option<Photo>>;
}

/// Storage for the per-category home page images
#[async_trait]
pub trait HomeImageStore: Send + Sync {
    /// Set the image for its category, replacing any previous one
    async fn set_home_image(&self, image: &HomeImage) -> StoreResult<()>;

    /// All configured home page images
    async fn home_images(&self) -> StoreResult<Vec<HomeImage>>;
}

/// A store that backs the whole site
pub trait PortfolioStore: DocumentStore + HomeImageStore {}

impl<T: DocumentStore + HomeImageStore> PortfolioStore for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, position: u32, created_at: i64, deleted: bool) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: id.to_string(),
            category: Category::Nature,
            image_url: String::new(),
            uploaded_by: String::new(),
            position,
            deleted,
            deleted_at: None,
            created_at,
        }
    }

    #[test]
    fn test_filter_active_excludes_deleted() {
        assert!(PhotoFilter::active().matches(&photo("a", 0, 0, false)));
        assert!(!PhotoFilter::active().matches(&photo("a", 0, 0, true)));
        assert!(PhotoFilter::all().matches(&photo("a", 0, 0, true)));
    }

    #[test]
    fn test_sort_created_at_desc() {
        let mut photos = vec![photo("a", 0, 1, false), photo("b", 1, 3, false), photo("c", 2, 2, false)];
        PhotoSort::CreatedAtDesc.apply(&mut photos);
        let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
