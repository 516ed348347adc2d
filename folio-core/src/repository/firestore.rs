//! Firestore Store
//!
//! Hosted document store reached through the Firestore REST API (v1).
//! Photos live in the `photos` collection, cover images in
//! `home_page_images` keyed by category.
//!
//! Records written by the legacy upload flow carry no `position` or
//! `deleted` field; they decode as position 0 and not deleted.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::{Category, HomeImage, NewPhoto, Photo, PhotoId, PositionUpdate};
use super::traits::{DocumentStore, HomeImageStore, PhotoFilter, PhotoSort, StoreError, StoreResult};

const PHOTOS: &str = "photos";
const HOME_IMAGES: &str = "home_page_images";

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Connection settings for a Firestore project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Web API key, sent with every request when present
    #[serde(default)]
    pub api_key: Option<String>,
    /// ID token of the signed-in editor; every write needs one
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: default_database(),
            base_url: default_base_url(),
            api_key: None,
            id_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Resource name of the documents root, e.g. `projects/p/databases/(default)/documents`
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database)
    }
}

pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.config.base_url.trim_end_matches('/'), self.config.documents_root(), path)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.config.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_identity(&self) -> StoreResult<()> {
        match &self.config.id_token {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(StoreError::Unauthenticated),
        }
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Value> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        Ok(response.json::<Value>().await?)
    }

    async fn commit(&self, writes: Vec<Value>) -> StoreResult<()> {
        self.require_identity()?;
        let url = self.url(":commit");
        self.send(self.client.post(url).json(&json!({ "writes": writes }))).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn query(&self, category: Category, filter: PhotoFilter, sort: PhotoSort) -> StoreResult<Vec<Photo>> {
        let url = self.url(":runQuery");
        let response = self.send(self.client.post(url).json(&category_query(category))).await?;
        let mut photos = decode_query_response(&response)?;
        photos.retain(|photo| filter.matches(photo));
        sort.apply(&mut photos);
        Ok(photos)
    }

    async fn batch_update(&self, updates: Vec<PositionUpdate>) -> StoreResult<()> {
        let writes = updates
            .iter()
            .map(|update| {
                field_update(
                    self.document_name(PHOTOS, update.id.as_str()),
                    json!({ "position": integer_value(update.position as i64) }),
                    &["position"],
                )
            })
            .collect();
        self.commit(writes).await
    }

    async fn batch_mark_deleted(&self, ids: Vec<PhotoId>, deleted_at: i64) -> StoreResult<()> {
        let writes = ids
            .iter()
            .map(|id| {
                field_update(
                    self.document_name(PHOTOS, id.as_str()),
                    json!({
                        "deleted": { "booleanValue": true },
                        "deletedAt": timestamp_value(deleted_at),
                    }),
                    &["deleted", "deletedAt"],
                )
            })
            .collect();
        self.commit(writes).await
    }

    async fn insert(&self, photo: NewPhoto, position: u32) -> StoreResult<Photo> {
        self.require_identity()?;
        let created_at = Utc::now().timestamp_millis();
        let url = self.url(&format!("/{}", PHOTOS));
        let body = json!({ "fields": encode_new_photo(&photo, position, created_at) });
        let document = self.send(self.client.post(url).json(&body)).await?;
        decode_photo(&document)
    }

    async fn find(&self, id: &PhotoId) -> StoreResult<Option<Photo>> {
        let url = self.url(&format!("/{}/{}", PHOTOS, id));
        match self.send(self.client.get(url)).await {
            Ok(document) => decode_photo(&document).map(Some),
            Err(StoreError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl HomeImageStore for FirestoreStore {
    async fn set_home_image(&self, image: &HomeImage) -> StoreResult<()> {
        self.require_identity()?;
        let url = self.url(&format!("/{}/{}", HOME_IMAGES, image.category));
        let body = json!({
            "fields": {
                "category": string_value(image.category.as_str()),
                "imageUrl": string_value(&image.image_url),
                "uploadedBy": string_value(&image.uploaded_by),
                "updatedAt": timestamp_value(image.updated_at),
            }
        });
        self.send(self.client.patch(url).json(&body)).await?;
        Ok(())
    }

    async fn home_images(&self) -> StoreResult<Vec<HomeImage>> {
        let url = self.url(&format!("/{}", HOME_IMAGES));
        let response = self.send(self.client.get(url)).await?;
        let mut images = Vec::new();
        // An empty collection comes back without a `documents` key
        if let Some(documents) = response.get("documents").and_then(Value::as_array) {
            for document in documents {
                images.push(decode_home_image(document)?);
            }
        }
        images.sort_by_key(|image| image.category);
        Ok(images)
    }
}

// ========================
// Wire format
// ========================

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

/// Firestore carries 64-bit integers as decimal strings
fn integer_value(n: i64) -> Value {
    json!({ "integerValue": n.to_string() })
}

fn timestamp_value(millis: i64) -> Value {
    let ts = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    json!({ "timestampValue": ts })
}

/// Structured query selecting every photo of a category.
///
/// No orderBy: Firestore drops documents missing an ordered field, and
/// legacy photos have no `position`. Ordering happens after decoding.
fn category_query(category: Category) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": PHOTOS }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "category" },
                    "op": "EQUAL",
                    "value": string_value(category.as_str()),
                }
            }
        }
    })
}

fn field_update(name: String, fields: Value, mask: &[&str]) -> Value {
    json!({
        "update": { "name": name, "fields": fields },
        "updateMask": { "fieldPaths": mask },
        "currentDocument": { "exists": true },
    })
}

fn encode_new_photo(photo: &NewPhoto, position: u32, created_at: i64) -> Value {
    json!({
        "name": string_value(&photo.name),
        "category": string_value(photo.category.as_str()),
        "imageUrl": string_value(&photo.image_url),
        "uploadedBy": string_value(&photo.uploaded_by),
        "position": integer_value(position as i64),
        "deleted": { "booleanValue": false },
        "createdAt": timestamp_value(created_at),
    })
}

fn decode_query_response(response: &Value) -> StoreResult<Vec<Photo>> {
    let entries = response
        .as_array()
        .ok_or_else(|| StoreError::Decode("runQuery response is not an array".to_string()))?;
    // Entries without a document only report progress (readTime, skippedResults)
    entries
        .iter()
        .filter_map(|entry| entry.get("document"))
        .map(decode_photo)
        .collect()
}

fn fields_of(document: &Value) -> StoreResult<&Map<String, Value>> {
    document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Decode("document has no fields".to_string()))
}

fn document_id(document: &Value) -> StoreResult<&str> {
    document
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Decode("document has no name".to_string()))
}

fn get_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key)?.get("stringValue")?.as_str().map(str::to_string)
}

fn get_integer(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    match value.get("integerValue")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn get_bool(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key)?.get("booleanValue")?.as_bool()
}

/// Accepts both timestamps and integer millis
fn get_millis(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    if let Some(ts) = value.get("timestampValue").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(ts).ok().map(|dt| dt.timestamp_millis());
    }
    get_integer(fields, key)
}

fn decode_photo(document: &Value) -> StoreResult<Photo> {
    let id = document_id(document)?;
    let fields = fields_of(document)?;
    let category = get_string(fields, "category")
        .ok_or_else(|| StoreError::Decode(format!("photo {} has no category", id)))?
        .parse::<Category>()
        .map_err(|e| StoreError::Decode(format!("photo {}: {}", id, e)))?;
    let position = get_integer(fields, "position").unwrap_or(0);

    Ok(Photo {
        id: PhotoId::new(id),
        name: get_string(fields, "name").unwrap_or_default(),
        category,
        image_url: get_string(fields, "imageUrl").unwrap_or_default(),
        uploaded_by: get_string(fields, "uploadedBy").unwrap_or_default(),
        position: u32::try_from(position)
            .map_err(|_| StoreError::Decode(format!("photo {} has position {}", id, position)))?,
        deleted: get_bool(fields, "deleted").unwrap_or(false),
        deleted_at: get_millis(fields, "deletedAt"),
        created_at: get_millis(fields, "createdAt").unwrap_or(0),
    })
}

fn decode_home_image(document: &Value) -> StoreResult<HomeImage> {
    let id = document_id(document)?;
    let fields = fields_of(document)?;
    let category = get_string(fields, "category")
        .unwrap_or_else(|| id.to_string())
        .parse::<Category>()
        .map_err(|e| StoreError::Decode(format!("home image {}: {}", id, e)))?;

    Ok(HomeImage {
        category,
        image_url: get_string(fields, "imageUrl").unwrap_or_default(),
        uploaded_by: get_string(fields, "uploadedBy").unwrap_or_default(),
        updated_at: get_millis(fields, "updatedAt").unwrap_or(0),
    })
}

/// Map a non-success response; overload and outage statuses are transient
fn status_error(status: StatusCode, body: String) -> StoreError {
    const TRANSIENT: [StatusCode; 3] = [
        StatusCode::SERVICE_UNAVAILABLE,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::GATEWAY_TIMEOUT,
    ];
    if TRANSIENT.contains(&status) {
        StoreError::Unavailable(format!("{}: {}", status, body))
    } else {
        StoreError::Status { status: status.as_u16(), body }
    }
}
