//! Per-category sync state
//!
//! Clean → (local change) → Optimistic → (commit ok) → Clean
//!                                     → (commit failed or overtaken) → Stale → (resync) → Clean

use serde::{Deserialize, Serialize};

use crate::domain::{Photo, PositionUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Local view equals the last committed view
    Clean,
    /// Local view is ahead of the store
    Optimistic,
    /// The store's state is unknown; reload before trusting the view
    Stale,
}

/// How a successful batch write relates to the current local view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store now holds what the local view shows
    Committed,
    /// A newer local change happened while the write was in flight
    Superseded,
}

/// Local view of one category
#[derive(Debug, Clone)]
pub(super) struct Partition {
    pub photos: Vec<Photo>,
    pub state: SyncState,
    /// Bumped on every local change
    pub revision: u64,
}

impl Partition {
    pub fn loaded(photos: Vec<Photo>) -> Self {
        Self { photos, state: SyncState::Clean, revision: 0 }
    }

    /// Replace the view with the store's order
    pub fn reset(&mut self, photos: Vec<Photo>) {
        self.photos = photos;
        self.state = SyncState::Clean;
        self.revision += 1;
    }

    /// Record an optimistic local change, returning the new revision
    pub fn touch(&mut self) -> u64 {
        self.state = SyncState::Optimistic;
        self.revision += 1;
        self.revision
    }

    /// True when the view shows exactly the ids and positions of `ordered`
    pub fn shows(&self, ordered: &[Photo]) -> bool {
        self.photos.len() == ordered.len()
            && self
                .photos
                .iter()
                .zip(ordered)
                .all(|(local, sent)| PositionUpdate::from(local) == PositionUpdate::from(sent))
    }

    /// Settle after a successful write; `up_to_date` is false when the view moved on meanwhile
    pub fn settle(&mut self, up_to_date: bool) -> CommitOutcome {
        if up_to_date {
            self.state = SyncState::Clean;
            CommitOutcome::Committed
        } else {
            self.state = SyncState::Stale;
            CommitOutcome::Superseded
        }
    }
}
