//! Local SQLite Backend
//!
//! Stores rows of every table as JSON documents in a single `rows` table.
//! Used for local development and tests; behaves like the remote backend
//! for filtering, ordering and server-assigned fields.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::query::{Filter, Order, Row};
use super::traits::PersistenceService;
use crate::error::{PersistenceError, PersistenceResult};

/// SQLite implementation of [`PersistenceService`]
#[derive(Clone)]
pub struct SqlitePersistence {
    conn: Arc<Mutex<Connection>>,
}

/// Open (or create) the database at `db_path` and run migrations.
///
/// `":memory:"` opens a private in-memory database.
pub async fn init_db(db_path: &Path) -> PersistenceResult<SqlitePersistence> {
    let path = db_path.to_path_buf();
    let conn = tokio::task::spawn_blocking(move || open_and_migrate(&path)).await??;
    log::info!("Local database ready at {}", db_path.display());

    Ok(SqlitePersistence {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn open_and_migrate(db_path: &Path) -> PersistenceResult<Connection> {
    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Connection::open(db_path)?
    };
    run_migrations(&conn)?;
    Ok(conn)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> PersistenceResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS rows (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            table_name TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (table_name, id)
        );
        CREATE INDEX IF NOT EXISTS idx_rows_table ON rows(table_name);",
    )?;
    Ok(())
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// All rows of a table in insertion order
fn select_rows(conn: &Connection, table: &str) -> PersistenceResult<Vec<Row>> {
    let mut stmt = conn.prepare("SELECT body FROM rows WHERE table_name = ? ORDER BY seq")?;
    let bodies = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    bodies
        .iter()
        .map(|body| serde_json::from_str::<Row>(body).map_err(PersistenceError::from))
        .collect()
}

fn insert_row(conn: &Connection, table: &str, mut row: Row) -> PersistenceResult<Row> {
    let id = match row.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Null) | None => Uuid::new_v4().to_string(),
        Some(other) => {
            return Err(PersistenceError::InvalidRow(format!("unsupported id {}", other)));
        }
    };
    let timestamp = now();
    row.insert("id".to_string(), Value::String(id.clone()));
    row.insert("created_at".to_string(), Value::String(timestamp.clone()));
    row.insert("updated_at".to_string(), Value::String(timestamp.clone()));

    conn.execute(
        "INSERT INTO rows (table_name, id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        params![table, id, serde_json::to_string(&row)?, timestamp, timestamp],
    )?;
    Ok(row)
}

fn update_row(conn: &Connection, table: &str, id: &str, patch: Row) -> PersistenceResult<Row> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM rows WHERE table_name = ? AND id = ?",
            params![table, id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(body) = body else {
        return Err(PersistenceError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        });
    };

    let mut row: Row = serde_json::from_str(&body)?;
    for (key, value) in patch {
        // Primary key and creation time are server-owned.
        if key != "id" && key != "created_at" {
            row.insert(key, value);
        }
    }
    let timestamp = now();
    row.insert("updated_at".to_string(), Value::String(timestamp.clone()));

    conn.execute(
        "UPDATE rows SET body = ?, updated_at = ? WHERE table_name = ? AND id = ?",
        params![serde_json::to_string(&row)?, timestamp, table, id],
    )?;
    Ok(row)
}

impl SqlitePersistence {
    /// Run `op` against the connection on the blocking thread pool
    async fn with_conn<T, F>(&self, op: F) -> PersistenceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> PersistenceResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl PersistenceService for SqlitePersistence {
    async fn query(&self, table: &str, filter: &Filter, order: Option<&Order>) -> PersistenceResult<Vec<Row>> {
        let rows = {
            let table = table.to_string();
            self.with_conn(move |conn| select_rows(conn, &table)).await?
        };
        let mut rows: Vec<Row> = rows.into_iter().filter(|row| filter.matches(row)).collect();
        if let Some(order) = order {
            // Stable sort keeps insertion order for ties.
            rows.sort_by(|a, b| order.compare(a, b));
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> PersistenceResult<Row> {
        let table = table.to_string();
        self.with_conn(move |conn| insert_row(conn, &table, row)).await
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> PersistenceResult<Row> {
        let table = table.to_string();
        let id = id.to_string();
        self.with_conn(move |conn| update_row(conn, &table, &id, patch)).await
    }
}
