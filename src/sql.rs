pub mod database;
pub mod error;
pub mod relay;
pub mod value;

pub use database::{Database, PoolOptions, SqliteDatabase};
pub use error::Error;
pub use relay::QueryRelay;
use serde::Deserialize;
pub use value::{ResultSet, Row, Value};

/// A SQL query submitted by a caller.
///
/// A missing `sql` field decodes as the empty query.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Query {
    /// The SQL text to run, untouched.
    pub sql: String,
}

/// What the database hands back for one query, before rows get their names.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResponse {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}
