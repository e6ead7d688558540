use tokio::task::JoinError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("construct SQLite connection pool: {0}")]
    ConstructPool(r2d2::Error),

    #[error("acquire SQLite connection: {0}")]
    AcquireConnection(r2d2::Error),

    #[error("execute query: {0}")]
    ExecuteQuery(rusqlite::Error),

    #[error("retrieve result: {0}")]
    RetrieveResult(#[from] JoinError),

    #[error("transform query result: {0}")]
    TransformQueryResult(rusqlite::Error),

    #[error("transform query result: row has {actual} cells but {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },
}

impl Error {
    /// The underlying driver message, without the stage prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::ConstructPool(e) | Error::AcquireConnection(e) => e.to_string(),
            Error::ExecuteQuery(e) | Error::TransformQueryResult(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
