//! Repository Integration Tests
//!
//! Tests for SqliteStore with an in-memory SQLite database.

use crate::domain::{Category, HomeImage, NewPhoto, Photo, PhotoId, PositionUpdate};
use crate::repository::{DocumentStore, HomeImageStore, PhotoFilter, PhotoSort, SqliteStore, StoreError};

fn setup_test_store() -> SqliteStore {
    SqliteStore::open_in_memory().expect("Failed to init test DB")
}

fn photo(id: &str, category: Category, position: u32, created_at: i64) -> Photo {
    Photo {
        id: PhotoId::from(id),
        name: format!("Photo {}", id),
        category,
        image_url: format!("https://img.example/{}.jpg", id),
        uploaded_by: "admin".to_string(),
        position,
        deleted: false,
        deleted_at: None,
        created_at,
    }
}

fn ids(photos: &[Photo]) -> Vec<&str> {
    photos.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test]
async fn test_insert_assigns_id_and_position() {
    let store = setup_test_store();

    let created = store
        .insert(NewPhoto::new("Market", Category::People, "https://img/m.jpg", "uid"), 3)
        .await
        .expect("Failed to insert");

    assert_eq!(created.id.as_str().len(), 20);
    assert_eq!(created.position, 3);
    assert!(created.created_at > 0);

    let found = store.find(&created.id).await.expect("Find failed");
    assert_eq!(found, Some(created));
}

#[tokio::test]
async fn test_insert_ids_are_unique_for_identical_uploads() {
    let store = setup_test_store();
    let upload = NewPhoto::new("Same", Category::Nature, "https://img/s.jpg", "uid");

    let a = store.insert(upload.clone(), 0).await.unwrap();
    let b = store.insert(upload, 1).await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_query_is_scoped_to_category_and_ordered() {
    let store = setup_test_store();
    store.import_photo(&photo("b", Category::People, 1, 0)).await.unwrap();
    store.import_photo(&photo("a", Category::People, 0, 0)).await.unwrap();
    store.import_photo(&photo("n", Category::Nature, 0, 0)).await.unwrap();

    let people = store.query(Category::People, PhotoFilter::active(), PhotoSort::PositionAsc).await.unwrap();
    assert_eq!(ids(&people), vec!["a", "b"]);
}

#[tokio::test]
async fn test_query_orders_ties_by_created_at_then_id() {
    let store = setup_test_store();
    store.import_photo(&photo("z", Category::People, 0, 5)).await.unwrap();
    store.import_photo(&photo("b", Category::People, 0, 9)).await.unwrap();
    store.import_photo(&photo("a", Category::People, 0, 9)).await.unwrap();

    let people = store.query(Category::People, PhotoFilter::active(), PhotoSort::PositionAsc).await.unwrap();
    assert_eq!(ids(&people), vec!["z", "a", "b"]);

    let newest = store.query(Category::People, PhotoFilter::active(), PhotoSort::CreatedAtDesc).await.unwrap();
    assert_eq!(ids(&newest), vec!["a", "b", "z"]);
}

#[tokio::test]
async fn test_batch_update_writes_positions() {
    let store = setup_test_store();
    store.import_photo(&photo("a", Category::People, 0, 0)).await.unwrap();
    store.import_photo(&photo("b", Category::People, 1, 0)).await.unwrap();

    store
        .batch_update(vec![
            PositionUpdate { id: PhotoId::from("b"), position: 0 },
            PositionUpdate { id: PhotoId::from("a"), position: 1 },
        ])
        .await
        .expect("Update failed");

    let people = store.query(Category::People, PhotoFilter::active(), PhotoSort::PositionAsc).await.unwrap();
    assert_eq!(ids(&people), vec!["b", "a"]);
}

#[tokio::test]
async fn test_batch_update_is_all_or_nothing() {
    let store = setup_test_store();
    store.import_photo(&photo("a", Category::People, 0, 0)).await.unwrap();
    store.import_photo(&photo("b", Category::People, 1, 0)).await.unwrap();

    let err = store
        .batch_update(vec![
            PositionUpdate { id: PhotoId::from("a"), position: 1 },
            PositionUpdate { id: PhotoId::from("missing"), position: 0 },
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let a = store.find(&PhotoId::from("a")).await.unwrap().unwrap();
    assert_eq!(a.position, 0);
}

#[tokio::test]
async fn test_mark_deleted_hides_photo_but_keeps_record() {
    let store = setup_test_store();
    store.import_photo(&photo("a", Category::Nature, 0, 0)).await.unwrap();
    store.import_photo(&photo("b", Category::Nature, 1, 0)).await.unwrap();

    store.batch_mark_deleted(vec![PhotoId::from("b")], 1234).await.expect("Delete failed");

    let active = store.query(Category::Nature, PhotoFilter::active(), PhotoSort::PositionAsc).await.unwrap();
    assert_eq!(ids(&active), vec!["a"]);

    let all = store.query(Category::Nature, PhotoFilter::all(), PhotoSort::PositionAsc).await.unwrap();
    assert_eq!(ids(&all), vec!["a", "b"]);

    let b = store.find(&PhotoId::from("b")).await.unwrap().unwrap();
    assert!(b.deleted);
    assert_eq!(b.deleted_at, Some(1234));
    assert_eq!(b.position, 1);
}

#[tokio::test]
async fn test_find_missing_photo() {
    let store = setup_test_store();
    assert_eq!(store.find(&PhotoId::from("nope")).await.unwrap(), None);
}

#[tokio::test]
async fn test_home_image_overwrites_per_category() {
    let store = setup_test_store();

    store.set_home_image(&HomeImage::new(Category::Nature, "https://img/1.jpg", "uid")).await.unwrap();
    store.set_home_image(&HomeImage::new(Category::People, "https://img/2.jpg", "uid")).await.unwrap();
    store.set_home_image(&HomeImage::new(Category::Nature, "https://img/3.jpg", "uid")).await.unwrap();

    let images = store.home_images().await.unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].category, Category::People);
    assert_eq!(images[1].category, Category::Nature);
    assert_eq!(images[1].image_url, "https://img/3.jpg");
}
