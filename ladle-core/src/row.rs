use crate::{AsValue, Driver, Error, Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A query ready to be executed by an [`Executor`](crate::Executor).
///
/// Represents either raw SQL (`Raw`) or a backend prepared statement
/// (`Prepared`) carrying driver-specific parameter state.
pub enum Query<D: Driver> {
    /// Unprepared SQL text.
    Raw(String),
    /// Driver prepared handle.
    Prepared(D::Prepared),
}

impl<D: Driver> Query<D> {
    pub fn is_prepared(&self) -> bool {
        matches!(self, Query::Prepared(..))
    }
    /// Remove all the previously bound values.
    pub fn clear_bindings(&mut self) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot clear bindings of a raw query"));
        };
        prepared.clear_bindings()?;
        Ok(self)
    }
    /// Append a parameter value.
    pub fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot bind a raw query"));
        };
        prepared.bind(value)?;
        Ok(self)
    }
    /// Append an already-converted parameter value.
    pub fn bind_value(&mut self, value: Value) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot bind a raw query"));
        };
        prepared.bind_value(value)?;
        Ok(self)
    }
    /// Bind a value at a specific index.
    pub fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot bind index of a raw query"));
        };
        prepared.bind_index(value, index)?;
        Ok(self)
    }
}

impl<D: Driver> Default for Query<D> {
    fn default() -> Self {
        Self::Raw(Default::default())
    }
}

impl<D: Driver> From<&str> for Query<D> {
    fn from(value: &str) -> Self {
        Query::Raw(value.into())
    }
}

impl<D: Driver> From<String> for Query<D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> Display for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(query) => write!(f, "{}", truncate_long!(query)),
            Query::Prepared(query) => query.fmt(f),
        }
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// One column of a result cursor: ordinal position is the index in the
/// surrounding slice, plus a name (possibly empty or duplicated) and the
/// declared column type (a payload-less [`Value`]).
#[derive(Debug, Clone, PartialEq)]
pub struct CursorColumn {
    pub name: String,
    pub ty: Value,
}

impl CursorColumn {
    pub fn new(name: impl Into<String>, ty: Value) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Shared reference-counted column list, produced once per query execution.
pub type ColumnsInfo = Arc<[CursorColumn]>;
/// Owned row value slice matching `ColumnsInfo` length.
pub type Row = Box<[Value]>;

/// A result row with its cursor's column descriptors.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column descriptors (aligned by index with `values`).
    pub columns: ColumnsInfo,
    /// Data values.
    pub values: Row,
}

impl RowLabeled {
    pub fn new(columns: ColumnsInfo, values: Row) -> Self {
        Self { columns, values }
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|v| v.name.as_str())
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|v| v.name == name)
            .map(|i| &self.values[i])
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify
/// results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
