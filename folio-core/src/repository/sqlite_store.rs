//! SQLite Store
//!
//! Local document store backed by a single SQLite connection.
//! Batch writes run inside one transaction, so they are atomic.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::domain::{Category, HomeImage, NewPhoto, Photo, PhotoId, PositionUpdate};
use super::db::init_db;
use super::traits::{DocumentStore, HomeImageStore, PhotoFilter, PhotoSort, StoreError, StoreResult};

const PHOTO_COLUMNS: &str =
    "id, name, category, image_url, uploaded_by, position, deleted, deleted_at, created_at";

/// SQLite implementation of the document store
pub struct SqliteStore {
    pub(super) conn: Arc<Mutex<Connection>>,
    seq: AtomicU64,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn, seq: AtomicU64::new(0) }
    }

    /// Open the database file at `path`, creating and migrating it as needed
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = init_db(path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(Path::new(":memory:"))
    }

    /// Write a photo record verbatim, keeping its id and position.
    ///
    /// Used when importing records from another store.
    pub async fn import_photo(&self, photo: &Photo) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO photos ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)", PHOTO_COLUMNS),
            params![
                photo.id.as_str(),
                photo.name,
                photo.category.as_str(),
                photo.image_url,
                photo.uploaded_by,
                photo.position,
                photo.deleted,
                photo.deleted_at,
                photo.created_at,
            ],
        )?;
        Ok(())
    }

    /// Derive a 20 character id, the same length as hosted-store auto ids
    fn next_id(&self, photo: &NewPhoto, created_at: i64) -> PhotoId {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let input = format!("{}|{}|{}|{}|{}", photo.category, photo.name, photo.image_url, created_at, seq);
        let hash = blake3::hash(input.as_bytes()).to_hex();
        PhotoId::new(&hash.as_str()[..20])
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn query(&self, category: Category, filter: PhotoFilter, sort: PhotoSort) -> StoreResult<Vec<Photo>> {
        let conn = self.conn.lock().await;

        let order_by = match sort {
            PhotoSort::PositionAsc => "position ASC, created_at ASC, id ASC",
            PhotoSort::CreatedAtDesc => "created_at DESC, id ASC",
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM photos WHERE category = ?1 AND (?2 OR deleted = 0) ORDER BY {}",
            PHOTO_COLUMNS, order_by
        ))?;

        let photos = stmt
            .query_map(params![category.as_str(), filter.include_deleted], row_to_photo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    async fn batch_update(&self, updates: Vec<PositionUpdate>) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE photos SET position = ?1 WHERE id = ?2")?;
            for update in &updates {
                if stmt.execute(params![update.position, update.id.as_str()])? == 0 {
                    // Dropping the transaction rolls back the earlier rows
                    return Err(StoreError::NotFound(update.id.to_string()));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn batch_mark_deleted(&self, ids: Vec<PhotoId>, deleted_at: i64) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE photos SET deleted = 1, deleted_at = ?1 WHERE id = ?2")?;
            for id in &ids {
                if stmt.execute(params![deleted_at, id.as_str()])? == 0 {
                    return Err(StoreError::NotFound(id.to_string()));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn insert(&self, photo: NewPhoto, position: u32) -> StoreResult<Photo> {
        let created_at = chrono::Utc::now().timestamp_millis();
        let created = Photo {
            id: self.next_id(&photo, created_at),
            name: photo.name,
            category: photo.category,
            image_url: photo.image_url,
            uploaded_by: photo.uploaded_by,
            position,
            deleted: false,
            deleted_at: None,
            created_at,
        };
        self.import_photo(&created).await?;
        Ok(created)
    }

    async fn find(&self, id: &PhotoId) -> StoreResult<Option<Photo>> {
        let conn = self.conn.lock().await;
        let photo = conn
            .query_row(
                &format!("SELECT {} FROM photos WHERE id = ?1", PHOTO_COLUMNS),
                params![id.as_str()],
                row_to_photo,
            )
            .optional()?;
        Ok(photo)
    }
}

#[async_trait]
impl HomeImageStore for SqliteStore {
    async fn set_home_image(&self, image: &HomeImage) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO home_images (category, image_url, uploaded_by, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(category) DO UPDATE SET image_url = excluded.image_url, uploaded_by = excluded.uploaded_by, updated_at = excluded.updated_at",
            params![image.category.as_str(), image.image_url, image.uploaded_by, image.updated_at],
        )?;
        Ok(())
    }

    async fn home_images(&self) -> StoreResult<Vec<HomeImage>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT category, image_url, uploaded_by, updated_at FROM home_images")?;
        let mut images = stmt
            .query_map([], |row| {
                Ok(HomeImage {
                    category: parse_category(row, 0)?,
                    image_url: row.get(1)?,
                    uploaded_by: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        images.sort_by_key(|image| image.category);
        Ok(images)
    }
}

fn parse_category(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Category> {
    let raw: String = row.get(idx)?;
    raw.parse::<Category>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Convert a database row to Photo
fn row_to_photo(row: &rusqlite::Row) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: PhotoId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        category: parse_category(row, 2)?,
        image_url: row.get(3)?,
        uploaded_by: row.get(4)?,
        position: row.get(5)?,
        deleted: row.get(6)?,
        deleted_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}
