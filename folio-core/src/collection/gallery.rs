//! Gallery grouping
//!
//! The public gallery lists each category newest first, independent of the
//! admin ordering.

use std::collections::BTreeMap;

use crate::domain::{Category, Photo};
use crate::repository::{DocumentStore, PhotoFilter, PhotoSort, StoreResult};

/// Active photos of every category, newest first; empty categories map to
/// empty lists
pub async fn photos_by_category<S: DocumentStore + ?Sized>(store: &S) -> StoreResult<BTreeMap<Category, Vec<Photo>>> {
    let mut grouped = BTreeMap::new();
    for category in Category::ALL {
        let photos = store
            .query(category, PhotoFilter::active(), PhotoSort::CreatedAtDesc)
            .await?;
        grouped.insert(category, photos);
    }
    Ok(grouped)
}
