//! Photo Entity
//!
//! One orderable photo record. Photos belong to exactly one category and
//! are displayed in ascending `position` order within it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::entity::{DomainError, DomainResult, Entity};

/// Store-assigned photo identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PhotoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A photo in the portfolio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Unique identifier, never changes
    pub id: PhotoId,
    /// Display name
    pub name: String,
    /// Partition the photo is ordered in, never changes
    pub category: Category,
    /// Public URL of the uploaded image
    pub image_url: String,
    /// Identity that uploaded the photo
    pub uploaded_by: String,
    /// Position within the category (ascending display order)
    pub position: u32,
    /// Soft-delete flag; deleted photos keep their last position
    pub deleted: bool,
    /// Unix millis of the soft delete
    pub deleted_at: Option<i64>,
    /// Unix millis of creation
    pub created_at: i64,
}

impl Photo {
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Display order: position, then creation time, then id.
    ///
    /// The trailing keys make the order total even when positions collide
    /// (legacy records without a stored position all read as 0).
    pub fn display_cmp(&self, other: &Photo) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Entity for Photo {
    type Id = PhotoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Photo data submitted by the upload flow, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhoto {
    pub name: String,
    pub category: Category,
    pub image_url: String,
    pub uploaded_by: String,
}

impl NewPhoto {
    pub fn new(name: impl Into<String>, category: Category, image_url: impl Into<String>, uploaded_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category,
            image_url: image_url.into(),
            uploaded_by: uploaded_by.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("photo name is empty".to_string()));
        }
        if self.image_url.trim().is_empty() {
            return Err(DomainError::InvalidInput("image url is empty".to_string()));
        }
        Ok(())
    }
}

/// A single field-level position change submitted in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: PhotoId,
    pub position: u32,
}

impl From<&Photo> for PositionUpdate {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id.clone(),
            position: photo.position,
        }
    }
}

/// Sort photos into display order
pub fn sort_for_display(photos: &mut [Photo]) {
    photos.sort_by(Photo::display_cmp);
}

/// True when the active photos' positions are exactly `0..n`
pub fn is_contiguous(photos: &[Photo]) -> bool {
    let mut positions: Vec<u32> = photos.iter().filter(|p| p.is_active()).map(|p| p.position).collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, &pos)| pos as usize == i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, position: u32, created_at: i64) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: format!("Photo {}", id),
            category: Category::People,
            image_url: format!("https://img.example/{}.jpg", id),
            uploaded_by: "admin".to_string(),
            position,
            deleted: false,
            deleted_at: None,
            created_at,
        }
    }

    #[test]
    fn test_display_order_breaks_ties_by_created_at_then_id() {
        let mut photos = vec![photo("b", 0, 10), photo("c", 0, 5), photo("a", 0, 10), photo("d", 1, 0)];
        sort_for_display(&mut photos);
        let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_contiguity_ignores_deleted_photos() {
        let mut deleted = photo("x", 1, 0);
        deleted.deleted = true;
        let photos = vec![photo("a", 0, 0), deleted, photo("b", 1, 0)];
        assert!(is_contiguous(&photos));
    }

    #[test]
    fn test_contiguity_rejects_gaps_and_duplicates() {
        assert!(!is_contiguous(&[photo("a", 0, 0), photo("b", 2, 0)]));
        assert!(!is_contiguous(&[photo("a", 0, 0), photo("b", 0, 0)]));
        assert!(is_contiguous(&[]));
    }

    #[test]
    fn test_new_photo_requires_name_and_url() {
        assert!(NewPhoto::new("", Category::Nature, "u", "me").validate().is_err());
        assert!(NewPhoto::new("Dunes", Category::Nature, " ", "me").validate().is_err());
        assert!(NewPhoto::new("Dunes", Category::Nature, "u", "me").validate().is_ok());
    }

    #[test]
    fn test_photo_id_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&PhotoId::from("abc")).unwrap(), "\"abc\"");
    }
}
