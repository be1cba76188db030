use thiserror::Error;

/// Uniform cancellation outcome. Raised whenever an operation was aborted
/// because the caller's [`CancelToken`](crate::CancelToken) fired, no matter
/// which pipeline stage observed the abort.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("The operation was cancelled")]
pub struct Cancelled;

/// An error reported by the database provider, with the diagnostic triple
/// the provider attaches to it.
#[derive(Error, Debug, Clone)]
#[error("Database error {code} (severity {severity}, state {state}): {message}")]
pub struct DbError {
    pub severity: u8,
    pub code: i32,
    pub state: u8,
    pub message: String,
}

/// The severity/code/state triple a provider uses to report an aborted
/// operation.
///
/// Matching on it is a best-effort heuristic: providers do not distinguish
/// "aborted by request" from other execution errors, and the triple can
/// change between provider versions. The engine therefore only reclassifies
/// a matching error when the caller's token was actually cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelSignature {
    pub severity: u8,
    pub code: i32,
    pub state: u8,
}

impl DbError {
    pub fn matches(&self, signature: &CancelSignature) -> bool {
        self.severity == signature.severity
            && self.code == signature.code
            && self.state == signature.state
    }
}

/// A result set whose columns cannot populate the requested shape. Detected
/// before any row conversion, deterministic for a given (shape, columns)
/// pair.
#[derive(Error, Debug, Clone)]
pub enum ShapeError {
    #[error("The result set has no columns, cannot materialize `{shape}`")]
    NoColumns { shape: &'static str },
    #[error("The result set has {columns} columns but `{shape}` expects {arity}")]
    ColumnCount {
        shape: &'static str,
        arity: usize,
        columns: usize,
    },
    #[error("Column `{column}` does not match any settable field of `{shape}`")]
    UnmappedColumn {
        shape: &'static str,
        column: String,
    },
    #[error("The {column} has no name, materializing `{shape}` requires named columns")]
    Unnamed {
        shape: &'static str,
        column: String,
    },
    #[error(
        "Column `{column}` of type {column_type} cannot populate field `{field}` of `{shape}`"
    )]
    Incompatible {
        shape: &'static str,
        column: String,
        column_type: &'static str,
        field: String,
    },
    #[error("Column `{column}` has type {column_type} which no typed fetch path supports")]
    Unsupported {
        column: String,
        column_type: &'static str,
    },
}

/// A NULL cell mapped to a non-nullable target field.
#[derive(Error, Debug, Clone)]
#[error("Column `{column}` is NULL but the corresponding field of `{shape}` is not nullable")]
pub struct NullViolation {
    pub column: String,
    pub shape: &'static str,
}
