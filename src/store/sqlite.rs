//! SQLite content store.
//!
//! Uses a `Mutex<Connection>` so the store is `Send + Sync`; the server
//! handles one request at a time, so there is no contention in practice.
//!
//! Inclusion rules (published, no password, not noindex, not excluded) are
//! composed into the `WHERE` clause so only rows that will be emitted are
//! fetched.

use super::{
    ContentItem, ContentStore, ContentType, ItemQuery, ItemStatus, StoreError, StoreResult,
    Taxonomy, Term, TermQuery,
    schema::{self, FRONT_PAGE_OPTION, NOINDEX_META_KEY},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value};
use std::path::Path;

/// Storage format of `items.modified_gmt`.
const GMT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Content store backed by a SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply pending migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub fn memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA temp_store = MEMORY;")?;
        schema::apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with the connection
    fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    // ------------------------------------------------------------------------
    // Writers (used by `seomap init` and tests)
    // ------------------------------------------------------------------------

    pub fn insert_content_type(&self, name: &str, public: bool) -> StoreResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO content_types (name, public) VALUES (?1, ?2)",
                params![name, public],
            )?;
            Ok(())
        })
    }

    pub fn insert_taxonomy(&self, name: &str, public: bool) -> StoreResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO taxonomies (name, public) VALUES (?1, ?2)",
                params![name, public],
            )?;
            Ok(())
        })
    }

    /// Insert an item with its noindex flag and term relationships.
    ///
    /// The item counts as password-protected when `password` is non-empty;
    /// `item.password_protected` is ignored.
    #[cfg(test)]
    pub fn insert_item(&self, item: &ContentItem, password: &str) -> StoreResult<()> {
        self.with_connection(|conn| {
            let id = to_i64(item.id);
            conn.execute(
                "INSERT OR REPLACE INTO items
                    (id, content_type, status, modified_gmt, permalink, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    item.content_type,
                    item.status.as_str(),
                    item.modified.map(|m| m.format(GMT_FORMAT).to_string()),
                    item.permalink,
                    password,
                ],
            )?;
            if item.noindex {
                conn.execute(
                    "INSERT OR REPLACE INTO item_meta (item_id, meta_key, meta_value)
                     VALUES (?1, ?2, '1')",
                    params![id, NOINDEX_META_KEY],
                )?;
            }
            for term_id in &item.terms {
                conn.execute(
                    "INSERT OR IGNORE INTO term_relationships (item_id, term_id) VALUES (?1, ?2)",
                    params![id, to_i64(*term_id)],
                )?;
            }
            Ok(())
        })
    }

    #[cfg(test)]
    pub fn insert_term(&self, term: &Term) -> StoreResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO terms (id, taxonomy, name, count, permalink)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    to_i64(term.id),
                    term.taxonomy,
                    term.name,
                    to_i64(term.count),
                    term.permalink,
                ],
            )?;
            Ok(())
        })
    }

    #[cfg(test)]
    pub fn set_front_page(&self, id: u64) -> StoreResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO options (name, value) VALUES (?1, ?2)",
                params![FRONT_PAGE_OPTION, id.to_string()],
            )?;
            Ok(())
        })
    }
}

impl ContentStore for SqliteStore {
    fn content_types(&self) -> StoreResult<Vec<ContentType>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name, public FROM content_types ORDER BY name")?;
            let types: Vec<ContentType> = stmt
                .query_map([], |row| {
                    Ok(ContentType {
                        name: row.get(0)?,
                        public: row.get(1)?,
                    })
                })?
                .collect::<Result<_, _>>()?;
            Ok(types)
        })
    }

    fn taxonomies(&self) -> StoreResult<Vec<Taxonomy>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name, public FROM taxonomies ORDER BY name")?;
            let taxonomies: Vec<Taxonomy> = stmt
                .query_map([], |row| {
                    Ok(Taxonomy {
                        name: row.get(0)?,
                        public: row.get(1)?,
                    })
                })?
                .collect::<Result<_, _>>()?;
            Ok(taxonomies)
        })
    }

    fn content_type_exists(&self, name: &str) -> StoreResult<bool> {
        self.with_connection(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM content_types WHERE name = ?1)",
                [name],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn taxonomy_exists(&self, name: &str) -> StoreResult<bool> {
        self.with_connection(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM taxonomies WHERE name = ?1)",
                [name],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn count_published(&self, content_type: &str) -> StoreResult<u64> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM items WHERE content_type = ?1 AND status = 'publish'",
                [content_type],
                |row| row.get(0),
            )?;
            to_u64(count)
        })
    }

    fn count_terms(&self, taxonomy: &str) -> StoreResult<u64> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM terms WHERE taxonomy = ?1 AND count > 0",
                [taxonomy],
                |row| row.get(0),
            )?;
            to_u64(count)
        })
    }

    fn list_items(&self, query: &ItemQuery) -> StoreResult<Vec<ContentItem>> {
        let (sql, values) = item_query_sql(query);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(ItemRow {
                        id: row.get(0)?,
                        content_type: row.get(1)?,
                        modified_gmt: row.get(2)?,
                        permalink: row.get(3)?,
                        password_protected: row.get(4)?,
                        noindex: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(ItemRow::into_item).collect()
        })
    }

    fn list_terms(&self, query: &TermQuery) -> StoreResult<Vec<Term>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, taxonomy, name, count, permalink FROM terms
                 WHERE taxonomy = ?1 AND count > 0
                 ORDER BY count DESC, id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(
                    params![query.taxonomy, to_i64(query.limit), to_i64(query.offset)],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, taxonomy, name, count, permalink)| {
                    Ok(Term {
                        id: to_u64(id)?,
                        taxonomy,
                        name,
                        count: to_u64(count)?,
                        permalink,
                    })
                })
                .collect()
        })
    }

    fn last_modified(&self, content_type: &str) -> StoreResult<Option<DateTime<Utc>>> {
        self.with_connection(|conn| {
            let newest: Option<String> = conn.query_row(
                "SELECT MAX(modified_gmt) FROM items
                 WHERE content_type = ?1 AND status = 'publish'",
                [content_type],
                |row| row.get(0),
            )?;
            Ok(newest.as_deref().and_then(parse_gmt))
        })
    }

    fn term_last_modified(&self, term: &Term) -> StoreResult<Option<DateTime<Utc>>> {
        self.with_connection(|conn| {
            let newest: Option<String> = conn.query_row(
                "SELECT MAX(i.modified_gmt) FROM items i
                 JOIN term_relationships r ON r.item_id = i.id
                 WHERE r.term_id = ?1 AND i.status = 'publish'",
                [to_i64(term.id)],
                |row| row.get(0),
            )?;
            Ok(newest.as_deref().and_then(parse_gmt))
        })
    }

    fn front_page(&self) -> StoreResult<Option<u64>> {
        self.with_connection(|conn| {
            let value: Option<Option<String>> = conn
                .query_row(
                    "SELECT value FROM options WHERE name = ?1",
                    [FRONT_PAGE_OPTION],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value
                .flatten()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|id| *id > 0))
        })
    }
}

// ============================================================================
// Query Building
// ============================================================================

/// Compose the item listing SQL and its positional parameters.
fn item_query_sql(query: &ItemQuery) -> (String, Vec<Value>) {
    let mut sql = format!(
        "SELECT i.id, i.content_type, i.modified_gmt, i.permalink, i.password <> '',
                EXISTS(SELECT 1 FROM item_meta m
                       WHERE m.item_id = i.id AND m.meta_key = '{NOINDEX_META_KEY}'
                         AND m.meta_value = '1')
         FROM items i
         WHERE i.content_type = ? AND i.status = 'publish'"
    );
    let mut values = vec![Value::Text(query.content_type.clone())];

    if query.skip_password_protected {
        sql.push_str(" AND i.password = ''");
    }
    if query.skip_noindex {
        sql.push_str(&format!(
            " AND NOT EXISTS(SELECT 1 FROM item_meta m
                             WHERE m.item_id = i.id AND m.meta_key = '{NOINDEX_META_KEY}'
                               AND m.meta_value = '1')"
        ));
    }
    if !query.exclude_ids.is_empty() {
        let placeholders = vec!["?"; query.exclude_ids.len()].join(", ");
        sql.push_str(&format!(" AND i.id NOT IN ({placeholders})"));
        values.extend(query.exclude_ids.iter().map(|id| Value::Integer(to_i64(*id))));
    }

    sql.push_str(" ORDER BY i.modified_gmt IS NULL, i.modified_gmt DESC, i.id DESC LIMIT ? OFFSET ?");
    values.push(Value::Integer(to_i64(query.limit)));
    values.push(Value::Integer(to_i64(query.offset)));

    (sql, values)
}

/// Raw item row before id and timestamp conversion.
struct ItemRow {
    id: i64,
    content_type: String,
    modified_gmt: Option<String>,
    permalink: Option<String>,
    password_protected: bool,
    noindex: bool,
}

impl ItemRow {
    fn into_item(self) -> StoreResult<ContentItem> {
        Ok(ContentItem {
            id: to_u64(self.id)?,
            content_type: self.content_type,
            status: ItemStatus::Publish,
            modified: self.modified_gmt.as_deref().and_then(parse_gmt),
            permalink: self.permalink,
            noindex: self.noindex,
            password_protected: self.password_protected,
            terms: Vec::new(),
        })
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_u64(n: i64) -> StoreResult<u64> {
    u64::try_from(n).map_err(|_| StoreError::InvalidData(format!("negative value {n}")))
}

/// Parse a stored GMT timestamp. Zero dates and garbage yield `None`.
fn parse_gmt(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, GMT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
