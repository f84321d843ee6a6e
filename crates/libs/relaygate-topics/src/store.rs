use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::TopicError;

/// Durable name → type-id dictionary plus one backing store per topic.
pub trait TopicStore: Send {
    fn entries(&self) -> Result<Vec<(String, String)>, TopicError>;
    fn insert_entry(&self, name: &str, type_id: &str) -> Result<(), TopicError>;
    fn remove_entry(&self, name: &str) -> Result<(), TopicError>;

    /// Open a topic's backing store. With `create == false` a missing store
    /// is [`TopicError::BackingStoreMissing`].
    fn open_backing(&self, database: &str, create: bool) -> Result<(), TopicError>;
    fn drop_backing(&self, database: &str) -> Result<(), TopicError>;
}

/// SQLite store: the dictionary is the `topics` table and each backing
/// store is a table named after the topic's database name.
pub struct SqliteTopicStore {
    conn: Connection,
}

impl SqliteTopicStore {
    pub fn in_memory() -> Result<Self, TopicError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open(path: &Path) -> Result<Self, TopicError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS topics (name TEXT PRIMARY KEY, type_id TEXT NOT NULL)",
            [],
        )?;
        Ok(())
    }

    fn backing_exists(&self, table: &str) -> rusqlite::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Table holding a topic's backing store. SQLite folds the case of table
/// names, so uppercase ASCII is escaped the same way `database_name` escapes
/// unsafe bytes; `clock` and `Clock` then never share a table.
fn table_name(database: &str) -> String {
    let mut table = String::with_capacity(database.len());
    for ch in database.chars() {
        if ch.is_ascii_uppercase() {
            table.push_str(&format!("%{:x}", u32::from(ch)));
        } else {
            table.push(ch);
        }
    }
    table
}

// Table names only ever hold `[a-z0-9._%-]`, so double quoting is enough to
// use them as identifiers.
fn quoted(table: &str) -> String {
    format!("\"{}\"", table.replace('"', "\"\""))
}

impl TopicStore for SqliteTopicStore {
    fn entries(&self) -> Result<Vec<(String, String)>, TopicError> {
        let mut stmt = self.conn.prepare("SELECT name, type_id FROM topics ORDER BY name")?;
        let mut rows = stmt.query([])?;
        let mut entries: Vec<(String, String)> = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push((row.get(0)?, row.get(1)?));
        }
        Ok(entries)
    }

    fn insert_entry(&self, name: &str, type_id: &str) -> Result<(), TopicError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO topics (name, type_id) VALUES (?1, ?2)",
            params![name, type_id],
        )?;
        Ok(())
    }

    fn remove_entry(&self, name: &str) -> Result<(), TopicError> {
        self.conn.execute("DELETE FROM topics WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn open_backing(&self, database: &str, create: bool) -> Result<(), TopicError> {
        let table = table_name(database);
        if self.backing_exists(&table)? {
            return Ok(());
        }
        if !create {
            return Err(TopicError::BackingStoreMissing { database: database.to_string() });
        }
        self.conn.execute(
            &format!(
                "CREATE TABLE {} (subscriber TEXT PRIMARY KEY, record BLOB NOT NULL)",
                quoted(&table)
            ),
            [],
        )?;
        Ok(())
    }

    fn drop_backing(&self, database: &str) -> Result<(), TopicError> {
        let table = table_name(database);
        self.conn.execute(&format!("DROP TABLE IF EXISTS {}", quoted(&table)), [])?;
        Ok(())
    }
}
