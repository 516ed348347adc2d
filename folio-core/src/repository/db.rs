//! Database Connection and Setup
//!
//! Opens the SQLite database and brings its schema up to date.

use std::path::Path;

use rusqlite::Connection;

use super::traits::StoreResult;

/// Open (or create) the database at `db_path` and run migrations.
///
/// `":memory:"` opens a private in-memory database.
pub fn init_db(db_path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open(db_path)?;
    run_migrations(&conn)?;
    log::debug!("database ready at {}", db_path.display());
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            image_url TEXT NOT NULL,
            uploaded_by TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Ordering and soft delete came after the first upload-only schema
    if !column_exists(conn, "photos", "position")? {
        conn.execute("ALTER TABLE photos ADD COLUMN position INTEGER NOT NULL DEFAULT 0", [])?;
    }

    if !column_exists(conn, "photos", "deleted")? {
        conn.execute("ALTER TABLE photos ADD COLUMN deleted INTEGER NOT NULL DEFAULT 0", [])?;
    }

    if !column_exists(conn, "photos", "deleted_at")? {
        conn.execute("ALTER TABLE photos ADD COLUMN deleted_at INTEGER", [])?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_photos_category ON photos(category, deleted, position)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS home_images (
            category TEXT PRIMARY KEY,
            image_url TEXT NOT NULL,
            uploaded_by TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}
