//! Reorderable Collection Manager
//!
//! Keeps an immediately consistent ordering per category for renderers
//! while the durable ordering is written to a [`DocumentStore`] out of band.
//!
//! Local views live behind a `std::sync::Mutex` that is never held across
//! an `.await`: a renderer can read, and a new `reorder` can run, while a
//! commit is still in flight. The manager is the only writer.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::domain::{index_of, sort_for_display, Category, NewPhoto, Photo, PhotoId, PositionUpdate};
use crate::repository::{DocumentStore, PhotoFilter, PhotoSort};
use super::error::{CollectionError, CollectionResult};
use super::reorder::move_to;
use super::state::{CommitOutcome, Partition, SyncState};

pub struct CollectionManager<S: ?Sized> {
    store: Arc<S>,
    partitions: Mutex<HashMap<Category, Partition>>,
}

impl<S: DocumentStore + ?Sized> CollectionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            partitions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn partitions(&self) -> MutexGuard<'_, HashMap<Category, Partition>> {
        // A panic mid-update cannot leave a half-spliced list: every mutation
        // builds the new order before writing it back.
        self.partitions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current local order of a category, if it has been loaded
    pub fn view(&self, category: Category) -> Option<Vec<Photo>> {
        self.partitions().get(&category).map(|p| p.photos.clone())
    }

    pub fn state(&self, category: Category) -> Option<SyncState> {
        self.partitions().get(&category).map(|p| p.state)
    }

    /// Fetch the active photos of a category and make them the local view.
    ///
    /// On failure the previous view (if any) is left as it was.
    pub async fn load_partition(&self, category: Category) -> CollectionResult<Vec<Photo>> {
        let mut photos = self
            .store
            .query(category, PhotoFilter::active(), PhotoSort::PositionAsc)
            .await
            .map_err(|source| CollectionError::StoreUnavailable { category, source })?;

        // Do not trust the store's filter or ordering
        photos.retain(Photo::is_active);
        sort_for_display(&mut photos);

        let mut partitions = self.partitions();
        match partitions.get_mut(&category) {
            Some(partition) => partition.reset(photos.clone()),
            None => {
                partitions.insert(category, Partition::loaded(photos.clone()));
            }
        }
        debug!("loaded {} photos for {}", photos.len(), category);
        Ok(photos)
    }

    /// Discard the local view and reload it from the store
    pub async fn resync(&self, category: Category) -> CollectionResult<Vec<Photo>> {
        info!("resyncing {} from store", category);
        self.load_partition(category).await
    }

    /// Move a photo to `target_index` in the local view and renumber.
    ///
    /// Applied synchronously; nothing is written to the store.
    pub fn reorder(&self, category: Category, photo_id: &PhotoId, target_index: usize) -> CollectionResult<Vec<Photo>> {
        let mut partitions = self.partitions();
        let not_found = || CollectionError::ItemNotFound { category, id: photo_id.clone() };

        let partition = partitions.get_mut(&category).ok_or_else(not_found)?;
        let from = index_of(&partition.photos, photo_id).ok_or_else(not_found)?;

        move_to(&mut partition.photos, from, target_index);
        partition.touch();
        debug!("moved {} in {} from {} to {}", photo_id, category, from, target_index);
        Ok(partition.photos.clone())
    }

    /// Write the position of every photo in `ordered` as one batch.
    ///
    /// A failure marks the category stale and is never retried here; the
    /// optimistic view is not rolled back either, since the store may have
    /// applied part of the batch.
    pub async fn commit_order(&self, category: Category, ordered: &[Photo]) -> CollectionResult<CommitOutcome> {
        let updates: Vec<PositionUpdate> = ordered.iter().map(PositionUpdate::from).collect();
        let result = self.store.batch_update(updates).await;

        let mut partitions = self.partitions();
        let partition = partitions.get_mut(&category);
        match (result, partition) {
            (Err(source), partition) => {
                if let Some(partition) = partition {
                    partition.state = SyncState::Stale;
                }
                warn!("order commit for {} failed: {}", category, source);
                Err(CollectionError::CommitFailed { category, source })
            }
            (Ok(()), Some(partition)) => {
                let up_to_date = partition.shows(ordered);
                Ok(partition.settle(up_to_date))
            }
            (Ok(()), None) => Ok(CommitOutcome::Superseded),
        }
    }

    /// Remove photos from the local view and mark them deleted in the store.
    ///
    /// Survivors keep their positions; the gaps close on the next reorder.
    pub async fn soft_delete(&self, category: Category, ids: &BTreeSet<PhotoId>) -> CollectionResult<CommitOutcome> {
        let revision = {
            let mut partitions = self.partitions();
            let partition = partitions.get_mut(&category);
            let missing = ids.iter().find(|id| {
                partition.as_ref().map_or(true, |p| index_of(&p.photos, *id).is_none())
            });
            if let Some(id) = missing {
                return Err(CollectionError::ItemNotFound { category, id: id.clone() });
            }
            match partition {
                Some(partition) if !ids.is_empty() => {
                    partition.photos.retain(|photo| !ids.contains(&photo.id));
                    partition.touch()
                }
                _ => return Ok(CommitOutcome::Committed),
            }
        };

        let deleted_at = chrono::Utc::now().timestamp_millis();
        let result = self.store.batch_mark_deleted(ids.iter().cloned().collect(), deleted_at).await;

        let mut partitions = self.partitions();
        let partition = partitions.get_mut(&category);
        match (result, partition) {
            (Err(source), partition) => {
                if let Some(partition) = partition {
                    partition.state = SyncState::Stale;
                }
                warn!("delete commit for {} failed: {}", category, source);
                Err(CollectionError::CommitFailed { category, source })
            }
            (Ok(()), Some(partition)) => {
                info!("soft-deleted {} photos from {}", ids.len(), category);
                let up_to_date = partition.revision == revision;
                Ok(partition.settle(up_to_date))
            }
            (Ok(()), None) => Ok(CommitOutcome::Superseded),
        }
    }

    /// Reorder, commit, and snap back to the store's order if the commit
    /// did not land.
    ///
    /// A failed commit is reported even when the resync after it fails too;
    /// the view then still shows the optimistic order and the category is
    /// Stale.
    pub async fn move_photo(&self, category: Category, photo_id: &PhotoId, target_index: usize) -> CollectionResult<Vec<Photo>> {
        let ordered = self.reorder(category, photo_id, target_index)?;
        let outcome = self.commit_order(category, &ordered).await;
        self.finish(category, ordered, outcome).await
    }

    /// Soft delete with the same recovery policy as [`Self::move_photo`]
    pub async fn delete_photos(&self, category: Category, ids: &BTreeSet<PhotoId>) -> CollectionResult<Vec<Photo>> {
        let outcome = self.soft_delete(category, ids).await;
        let view = self.view(category).unwrap_or_default();
        self.finish(category, view, outcome).await
    }

    async fn finish(
        &self,
        category: Category,
        view: Vec<Photo>,
        outcome: CollectionResult<CommitOutcome>,
    ) -> CollectionResult<Vec<Photo>> {
        match outcome {
            Ok(CommitOutcome::Committed) => Ok(view),
            // The category stays Stale when this reload fails
            Ok(CommitOutcome::Superseded) => self.resync(category).await,
            Err(err @ CollectionError::CommitFailed { .. }) => {
                if let Err(resync_err) = self.resync(category).await {
                    warn!("{} left stale after failed commit: {}", category, resync_err);
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Register an uploaded photo at the end of its category.
    ///
    /// A loaded view is extended only while it is clean; otherwise the photo
    /// shows up on the next load.
    pub async fn register_photo(&self, photo: NewPhoto) -> CollectionResult<Photo> {
        photo.validate()?;
        let category = photo.category;

        let active = self
            .store
            .query(category, PhotoFilter::active(), PhotoSort::PositionAsc)
            .await?;
        let position = next_position(&active);
        let created = self.store.insert(photo, position).await?;
        info!("registered {} in {} at {}", created.id, category, position);

        let mut partitions = self.partitions();
        if let Some(partition) = partitions.get_mut(&category) {
            if partition.state == SyncState::Clean {
                partition.photos.push(created.clone());
            }
        }
        Ok(created)
    }

    /// Photo detail lookup; soft-deleted photos are reported as missing
    pub async fn find_photo(&self, id: &PhotoId) -> CollectionResult<Option<Photo>> {
        let photo = self.store.find(id).await?;
        Ok(photo.filter(Photo::is_active))
    }
}

/// Append slot for a category: the active count, or one past the highest
/// position when soft deletes left gaps
fn next_position(active: &[Photo]) -> u32 {
    let count = active.len() as u32;
    active
        .iter()
        .map(|photo| photo.position.saturating_add(1))
        .max()
        .map_or(count, |after_last| after_last.max(count))
}
