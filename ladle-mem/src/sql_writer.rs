use ladle_core::SqlWriter;

/// The probe the in-memory backend answers with its collation name.
pub(crate) const COLLATION_QUERY: &str = "SELECT current_collation()";
/// Collation the in-memory backend reports for text columns.
pub(crate) const COLLATION_NAME: &str = "NOCASE";

#[derive(Default, Clone, Copy)]
pub struct MemSqlWriter {}

impl SqlWriter for MemSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn collation_query(&self) -> Option<&'static str> {
        Some(COLLATION_QUERY)
    }
}
