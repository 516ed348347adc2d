//! Admin View State
//!
//! Everything the admin screen tracks about one category listing:
//! selection, drag in progress, and layout. Owned by whoever renders the
//! listing; the collection manager never sees it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use folio_core::domain::{Category, Photo, PhotoId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminViewState {
    category: Category,
    pub view_mode: ViewMode,
    selected: BTreeSet<PhotoId>,
    dragging: Option<PhotoId>,
}

impl AdminViewState {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            view_mode: ViewMode::default(),
            selected: BTreeSet::new(),
            dragging: None,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Show another category; selection and drag do not carry over
    pub fn switch_category(&mut self, category: Category) {
        if self.category != category {
            self.category = category;
            self.selected.clear();
            self.dragging = None;
        }
    }

    pub fn selected(&self) -> &BTreeSet<PhotoId> {
        &self.selected
    }

    pub fn is_selected(&self, id: &PhotoId) -> bool {
        self.selected.contains(id)
    }

    /// Flip selection of one photo, returning whether it is now selected
    pub fn toggle_selected(&mut self, id: &PhotoId) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    pub fn select_all(&mut self, view: &[Photo]) {
        self.selected = view.iter().map(|p| p.id.clone()).collect();
    }

    pub fn begin_drag(&mut self, id: PhotoId) {
        self.dragging = Some(id);
    }

    /// Release the drag over slot `index`, yielding the move to perform
    pub fn drop_at(&mut self, index: usize) -> Option<(PhotoId, usize)> {
        self.dragging.take().map(|id| (id, index))
    }

    /// Forget selected or dragged photos that are no longer in `view`
    pub fn retain_visible(&mut self, view: &[Photo]) {
        let visible: BTreeSet<&PhotoId> = view.iter().map(|p| &p.id).collect();
        self.selected.retain(|id| visible.contains(id));
        if self.dragging.as_ref().is_some_and(|id| !visible.contains(id)) {
            self.dragging = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: id.to_string(),
            category: Category::People,
            image_url: String::new(),
            uploaded_by: String::new(),
            position: 0,
            deleted: false,
            deleted_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_toggle_selection() {
        let mut state = AdminViewState::new(Category::People);
        let a = PhotoId::from("a");
        assert!(state.toggle_selected(&a));
        assert!(state.is_selected(&a));
        assert!(!state.toggle_selected(&a));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn test_switch_category_clears_selection_and_drag() {
        let mut state = AdminViewState::new(Category::People);
        state.select_all(&[photo("a"), photo("b")]);
        state.begin_drag(PhotoId::from("a"));

        state.switch_category(Category::People);
        assert_eq!(state.selected().len(), 2);

        state.switch_category(Category::Nature);
        assert_eq!(state.category(), Category::Nature);
        assert!(state.selected().is_empty());
        assert_eq!(state.drop_at(0), None);
    }

    #[test]
    fn test_drop_ends_drag() {
        let mut state = AdminViewState::new(Category::People);
        assert_eq!(state.drop_at(0), None);

        state.begin_drag(PhotoId::from("c"));
        assert_eq!(state.drop_at(2), Some((PhotoId::from("c"), 2)));
        assert_eq!(state.drop_at(2), None);
    }

    #[test]
    fn test_retain_visible_prunes_vanished_photos() {
        let mut state = AdminViewState::new(Category::People);
        state.select_all(&[photo("a"), photo("b"), photo("c")]);
        state.begin_drag(PhotoId::from("b"));

        state.retain_visible(&[photo("a"), photo("c")]);
        let selected: Vec<&str> = state.selected().iter().map(PhotoId::as_str).collect();
        assert_eq!(selected, vec!["a", "c"]);
        assert_eq!(state.drop_at(1), None);
    }
}
