//! Home page image entity

use serde::{Deserialize, Serialize};

use super::category::Category;

/// The single cover image shown on the home page for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeImage {
    pub category: Category,
    pub image_url: String,
    pub uploaded_by: String,
    pub updated_at: i64,
}

impl HomeImage {
    pub fn new(category: Category, image_url: impl Into<String>, uploaded_by: impl Into<String>) -> Self {
        Self {
            category,
            image_url: image_url.into(),
            uploaded_by: uploaded_by.into(),
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
