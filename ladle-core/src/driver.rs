use crate::{CancelSignature, Connection, Prepared, SqlWriter};

pub trait Driver {
    type Connection: Connection;
    type SqlWriter: SqlWriter;
    type Prepared: Prepared;

    const NAME: &'static str;

    fn get_instance() -> Self;
    fn sql_writer(&self) -> Self::SqlWriter;
    /// The diagnostic triple this provider attaches to an aborted operation.
    /// Best-effort: see [`CancelSignature`].
    fn abort_signature(&self) -> CancelSignature;
}
