//! Storage collaborator interface.
//!
//! Loaders only see positional rows of typed fields. How a backend executes
//! a query is its own business; the core needs three things from it:
//!
//! * [`Database::query`] - all rows of a table, or `None` when the table has
//!   no rows at all (distinguishable from "rows but all filtered")
//! * [`Database::max_u32`] - the highest persisted identifier of a column
//! * [`Database::execute`] - write-through of a single [`Statement`]

mod memory;

pub use memory::MemoryDatabase;

use crate::error::{RowError, StorageError};

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Field {
    /// Integer view of the value. Text is parsed, null is zero.
    pub fn as_i64(&self) -> i64 {
        match self {
            Field::Null => 0,
            Field::Int(v) => *v,
            Field::Float(v) => *v as i64,
            Field::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Field::Null => 0.0,
            Field::Int(v) => *v as f64,
            Field::Float(v) => *v,
            Field::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Field::Null => String::new(),
            Field::Int(v) => v.to_string(),
            Field::Float(v) => v.to_string(),
            Field::Text(s) => s.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v as i64)
    }
}

impl From<u32> for Field {
    fn from(v: u32) -> Self {
        Field::Int(v as i64)
    }
}

impl From<u8> for Field {
    fn from(v: u8) -> Self {
        Field::Int(v as i64)
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Int(v as i64)
    }
}

impl From<f32> for Field {
    fn from(v: f32) -> Self {
        Field::Float(v as f64)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Text(v.to_string())
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Text(v)
    }
}

/// One result row with typed positional accessors.
///
/// Numeric accessors truncate like the column types they stand for; a
/// missing column is a [`RowError`], which loaders treat as a malformed row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<Field>);

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, index: usize) -> Result<&Field, RowError> {
        self.0.get(index).ok_or(RowError::MissingColumn {
            index,
            len: self.0.len(),
        })
    }

    pub fn u32(&self, index: usize) -> Result<u32, RowError> {
        Ok(self.field(index)?.as_i64() as u32)
    }

    pub fn i32(&self, index: usize) -> Result<i32, RowError> {
        Ok(self.field(index)?.as_i64() as i32)
    }

    pub fn u16(&self, index: usize) -> Result<u16, RowError> {
        Ok(self.field(index)?.as_i64() as u16)
    }

    pub fn u8(&self, index: usize) -> Result<u8, RowError> {
        Ok(self.field(index)?.as_i64() as u8)
    }

    pub fn i64(&self, index: usize) -> Result<i64, RowError> {
        Ok(self.field(index)?.as_i64())
    }

    pub fn f32(&self, index: usize) -> Result<f32, RowError> {
        Ok(self.field(index)?.as_f64() as f32)
    }

    pub fn bool(&self, index: usize) -> Result<bool, RowError> {
        Ok(self.field(index)?.as_i64() != 0)
    }

    pub fn string(&self, index: usize) -> Result<String, RowError> {
        Ok(self.field(index)?.as_string())
    }
}

/// Builds a [`Row`] from a list of values convertible into [`Field`].
///
/// ```rust
/// use world_content::row;
///
/// let row = row![7, "Hogger", 0.5_f32];
/// assert_eq!(row.u32(0).unwrap(), 7);
/// assert_eq!(row.string(1).unwrap(), "Hogger");
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::storage::Row::new(vec![$($crate::storage::Field::from($value)),*])
    };
}

/// Rows returned by a query. Never empty: an empty table is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    /// Wraps the rows, returning `None` for an empty set.
    pub fn from_rows(rows: Vec<Row>) -> Option<Self> {
        if rows.is_empty() {
            None
        } else {
            Some(Self { rows })
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

/// A write-through mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Deletes rows whose first `key_columns` fields equal those of `row`,
    /// then inserts `row`.
    Replace {
        table: &'static str,
        key_columns: usize,
        row: Row,
    },
    /// Deletes every row matching all `(column, value)` pairs.
    Delete {
        table: &'static str,
        filter: Vec<(usize, Field)>,
    },
}

impl Statement {
    pub fn table(&self) -> &'static str {
        match self {
            Statement::Replace { table, .. } | Statement::Delete { table, .. } => table,
        }
    }
}

/// Row source and sink used by every loader and write-through path.
pub trait Database: Send + Sync {
    /// Returns every row of `table` in storage order, or `None` if the table
    /// has no rows.
    fn query(&self, table: &str) -> Result<Option<ResultSet>, StorageError>;

    /// Highest value stored in `column` of `table`, `None` if the table is empty.
    fn max_u32(&self, table: &str, column: usize) -> Result<Option<u32>, StorageError>;

    fn execute(&self, statement: Statement) -> Result<(), StorageError>;
}
