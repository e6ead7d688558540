//! Cell values and rows as they leave the relay.

use serde::{Serialize, Serializer, ser::SerializeMap};

/// A single cell, one variant per SQLite storage class.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Raw bytes. The relay turns these into [`Value::Text`] before they
    /// reach a caller.
    Blob(Vec<u8>),
}

impl Value {
    /// Convert byte sequences into their textual form.
    pub fn normalize(self) -> Value {
        match self {
            Value::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
            other => other,
        }
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value as Sqlite;

        match value {
            Sqlite::Null => Value::Null,
            Sqlite::Integer(i) => Value::Integer(i),
            Sqlite::Real(f) => Value::Real(f),
            Sqlite::Text(s) => Value::Text(s),
            Sqlite::Blob(b) => Value::Blob(b),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

/// One result row: column name to value, in column-metadata order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Set `column` to `value`.
    ///
    /// A repeated column name keeps its first position and takes the newer value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }
}

#[cfg(test)]
impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The rows of one query, in the order the database returned them.
pub type ResultSet = Vec<Row>;
