use std::sync::Arc;

use super::{Database, Error, Query, ResultSet, Row};

/// Runs caller-supplied SQL and shapes the output into named rows.
///
/// No filtering happens here: the text reaches the database exactly as given.
pub struct QueryRelay {
    database: Arc<dyn Database>,
}

impl QueryRelay {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    pub async fn execute_query(&self, query: Query) -> Result<ResultSet, Error> {
        tracing::debug!(sql = %query.sql, "executing query");

        let response = self.database.execute(&query.sql).await?;
        let expected = response.header.len();

        let mut rows = ResultSet::with_capacity(response.rows.len());
        for cells in response.rows {
            if cells.len() != expected {
                return Err(Error::ColumnCountMismatch {
                    expected,
                    actual: cells.len(),
                });
            }

            let mut row = Row::with_capacity(expected);
            for (column, cell) in response.header.iter().zip(cells) {
                row.insert(column.as_str(), cell.normalize());
            }
            rows.push(row);
        }

        tracing::debug!(rows = rows.len(), "scanned rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::sql::database::tests::create_database;
    use crate::sql::{QueryResponse, Value};

    /// Hands back a fixed response no matter what is asked.
    struct CannedDatabase(QueryResponse);

    #[async_trait]
    impl Database for CannedDatabase {
        async fn execute(&self, _sql: &str) -> Result<QueryResponse, Error> {
            Ok(self.0.clone())
        }
    }

    fn query(sql: &str) -> Query {
        Query {
            sql: sql.to_string(),
        }
    }

    #[tokio::test]
    async fn test_rows_have_every_column() {
        let database = create_database(
            r#"
            CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT, score REAL);
            INSERT INTO test VALUES (1, 'Alice', 9.5);
            INSERT INTO test VALUES (2, NULL, NULL);
            INSERT INTO test VALUES (3, 'Carol', 7.0);
            "#,
        );
        let relay = QueryRelay::new(Arc::new(database));

        let rows = relay
            .execute_query(query("SELECT name, id, score FROM test ORDER BY id"))
            .await
            .expect("no error");

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "id", "score"]);
        }
        assert_eq!(rows[1].get("name"), Some(&Value::Null));
        assert_eq!(
            serde_json::to_string(&rows).unwrap(),
            r#"[{"name":"Alice","id":1,"score":9.5},{"name":null,"id":2,"score":null},{"name":"Carol","id":3,"score":7.0}]"#
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_empty_array() {
        let database = create_database("CREATE TABLE test (id INTEGER);");
        let relay = QueryRelay::new(Arc::new(database));

        let rows = relay
            .execute_query(query("SELECT * FROM test"))
            .await
            .expect("no error");

        assert!(rows.is_empty());
        assert_eq!(serde_json::to_string(&rows).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_blob_rendered_as_text() {
        let database = create_database("");
        let relay = QueryRelay::new(Arc::new(database));

        let rows = relay
            .execute_query(query("SELECT x'68656c6c6f' AS greeting"))
            .await
            .expect("no error");

        assert_eq!(rows[0].get("greeting"), Some(&Value::Text("hello".to_string())));
        assert_eq!(
            serde_json::to_string(&rows).unwrap(),
            r#"[{"greeting":"hello"}]"#
        );
    }

    #[tokio::test]
    async fn test_execution_error_surfaces() {
        let database = create_database("");
        let relay = QueryRelay::new(Arc::new(database));

        let result = relay.execute_query(query("SELEC 1")).await;

        let err = result.expect_err("should fail");
        assert!(matches!(err, Error::ExecuteQuery(_)));
        assert!(err.to_string().contains("syntax error"), "got {err}");
    }

    #[tokio::test]
    async fn test_short_row_is_scan_failure() {
        let relay = QueryRelay::new(Arc::new(CannedDatabase(QueryResponse {
            header: vec!["a".to_string(), "b".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::Integer(2)],
                vec![Value::Integer(3)],
            ],
        })));

        let result = relay.execute_query(query("SELECT a, b FROM t")).await;

        assert!(matches!(
            result,
            Err(Error::ColumnCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_column_names_collapse() {
        let relay = QueryRelay::new(Arc::new(CannedDatabase(QueryResponse {
            header: vec!["a".to_string(), "a".to_string()],
            rows: vec![vec![Value::Integer(1), Value::Integer(2)]],
        })));

        let rows = relay
            .execute_query(query("SELECT 1 AS a, 2 AS a"))
            .await
            .expect("no error");

        assert_eq!(serde_json::to_string(&rows).unwrap(), r#"[{"a":2}]"#);
    }
}
