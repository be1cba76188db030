mod connection;
mod driver;
mod prepared;
mod sql_writer;
mod utility;

pub use connection::MemConnection;
pub use driver::MemDriver;
pub use prepared::MemPrepared;
pub use sql_writer::MemSqlWriter;
