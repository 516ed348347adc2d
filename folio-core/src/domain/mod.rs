//! Domain Layer
//!
//! Photo records, categories and home-page images.
//! This layer has NO store dependencies (only serde/thiserror).

mod entity;
mod category;
mod photo;
mod home_image;

pub use entity::{Entity, DomainError, DomainResult, index_of};
pub use category::Category;
pub use photo::{Photo, PhotoId, NewPhoto, PositionUpdate, sort_for_display, is_contiguous};
pub use home_image::HomeImage;
