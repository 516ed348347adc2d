//! Reorder Operations
//!
//! List splice and renumbering for one category's ordered photos.

use crate::domain::Photo;

/// Set `position = index` for every photo, starting at 0
pub fn renumber(photos: &mut [Photo]) {
    for (index, photo) in photos.iter_mut().enumerate() {
        photo.position = index as u32;
    }
}

/// Move the photo at `from` to `target` and renumber the whole sequence.
///
/// `target` is read against the sequence after the photo has been removed,
/// clamped to the last slot. `from` must be a valid index.
pub fn move_to(photos: &mut Vec<Photo>, from: usize, target: usize) {
    let photo = photos.remove(from);
    let target = target.min(photos.len());
    photos.insert(target, photo);
    renumber(photos);
}
