//! Schema management and migrations for the SQLite store.

use super::{StoreError, StoreResult};
use rusqlite::Connection;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Meta key that marks an item as noindex when set to `'1'`.
pub const NOINDEX_META_KEY: &str = "_robots_noindex";

/// Option holding the front page id.
pub const FRONT_PAGE_OPTION: &str = "page_on_front";

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    if current_version(conn)? < SCHEMA_VERSION {
        conn.execute_batch(SCHEMA_V1)
            .map_err(|e| StoreError::Schema(format!("Failed to apply v1 schema: {e}")))?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [1])?;
    }

    Ok(())
}

/// Get current schema version
fn current_version(conn: &Connection) -> StoreResult<i32> {
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Initial schema SQL
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS content_types (
    name TEXT PRIMARY KEY NOT NULL,
    public INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS taxonomies (
    name TEXT PRIMARY KEY NOT NULL,
    public INTEGER NOT NULL DEFAULT 1
);

-- modified_gmt is 'YYYY-MM-DD HH:MM:SS' in UTC so text order is time order
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY NOT NULL,
    content_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'publish',
    modified_gmt TEXT,
    permalink TEXT,
    password TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_items_type_status_modified
    ON items (content_type, status, modified_gmt DESC);

CREATE TABLE IF NOT EXISTS item_meta (
    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    meta_key TEXT NOT NULL,
    meta_value TEXT,
    PRIMARY KEY (item_id, meta_key)
);

CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY NOT NULL,
    taxonomy TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    count INTEGER NOT NULL DEFAULT 0,
    permalink TEXT
);

CREATE INDEX IF NOT EXISTS idx_terms_taxonomy_count
    ON terms (taxonomy, count DESC);

CREATE TABLE IF NOT EXISTS term_relationships (
    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    term_id INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    PRIMARY KEY (item_id, term_id)
);

CREATE TABLE IF NOT EXISTS options (
    name TEXT PRIMARY KEY NOT NULL,
    value TEXT
);
"#;
