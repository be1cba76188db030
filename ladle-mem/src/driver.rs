use crate::{MemConnection, MemPrepared, MemSqlWriter};
use ladle_core::{CancelSignature, Driver};

#[derive(Default, Clone, Copy)]
pub struct MemDriver {}

impl MemDriver {
    pub const fn new() -> Self {
        MemDriver {}
    }

    /// The error triple an interrupted operation reports.
    pub const ABORT_SIGNATURE: CancelSignature = CancelSignature {
        severity: 11,
        code: 0,
        state: 0,
    };
}

impl Driver for MemDriver {
    type Connection = MemConnection;
    type SqlWriter = MemSqlWriter;
    type Prepared = MemPrepared;

    const NAME: &'static str = "mem";

    fn get_instance() -> Self {
        static INSTANCE: MemDriver = MemDriver {};
        INSTANCE
    }

    fn sql_writer(&self) -> Self::SqlWriter {
        MemSqlWriter::default()
    }

    fn abort_signature(&self) -> CancelSignature {
        Self::ABORT_SIGNATURE
    }
}
