//! The database connection the relay executes against.

use std::time::Duration;

use async_trait::async_trait;
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use super::{Error, QueryResponse, Value};

/// Anything that can run a SQL text and hand back its rows.
///
/// Implementations are shared by every in-flight request, so they manage
/// their own connections.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run `sql` verbatim and return the column metadata with every row.
    async fn execute(&self, sql: &str) -> Result<QueryResponse, Error>;
}

/// Pool settings for [`SqliteDatabase::open`].
#[derive(Clone, Debug)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 8,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(3),
        }
    }
}

/// A SQLite file (or `file:` URI) behind an r2d2 connection pool.
pub struct SqliteDatabase {
    pool: r2d2::Pool<SqliteManager>,
}

/// Hands out SQLite connections and refuses to take back one that is still
/// inside a transaction.
struct SqliteManager(SqliteConnectionManager);

impl ManageConnection for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        self.0.connect()
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        self.0.is_valid(conn)
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        // an open transaction must not follow the connection into the next request
        let in_transaction = !conn.is_autocommit();
        if in_transaction {
            tracing::debug!("discarding connection left inside a transaction");
        }
        in_transaction
    }
}

impl SqliteDatabase {
    /// Open the database at `target`, failing early if it can't be reached.
    pub fn open(target: impl AsRef<str>, options: PoolOptions) -> Result<Self, Error> {
        let busy_timeout = options.busy_timeout;
        let manager = SqliteConnectionManager::file(target.as_ref())
            .with_init(move |conn| conn.busy_timeout(busy_timeout));

        let pool = r2d2::Pool::builder()
            .max_size(options.max_connections)
            .connection_timeout(options.acquire_timeout)
            .build(SqliteManager(manager))
            .map_err(Error::ConstructPool)?;

        Ok(Self { pool })
    }
}

fn run_query(conn: &Connection, sql: &str) -> Result<QueryResponse, Error> {
    let mut stmt = conn.prepare(sql).map_err(Error::ExecuteQuery)?;
    let header = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<String>>();
    let column_count = header.len();

    let rows = stmt
        .query_map((), |row| {
            let mut row_data = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let cell = row.get::<_, rusqlite::types::Value>(i)?;
                row_data.push(Value::from(cell));
            }
            Ok(row_data)
        })
        .map_err(Error::ExecuteQuery)?
        .collect::<Result<Vec<Vec<Value>>, rusqlite::Error>>()
        .or_else(|e| match e {
            // SQLite compiles empty and comment-only text to no statement at all.
            rusqlite::Error::SqliteFailure(_, Some(ref error_message))
                if column_count == 0 && error_message == "not an error" =>
            {
                Ok(Vec::new())
            }
            _ => Err(Error::TransformQueryResult(e)),
        })?;

    Ok(QueryResponse { header, rows })
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<QueryResponse, Error> {
        let pool = self.pool.clone();
        let sql = sql.to_owned();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(Error::AcquireConnection)?;
            run_query(&conn, &sql)
        })
        .await?
    }
}
