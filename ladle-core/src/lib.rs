mod as_value;
mod cancel;
mod connection;
mod driver;
mod enums;
mod errors;
mod executor;
mod interval;
mod materialize;
mod prepared;
mod record;
mod row;
mod sql_writer;
mod statement;
mod transaction;
mod transient;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cancel::*;
pub use connection::*;
pub use driver::*;
pub use enums::*;
pub use errors::*;
pub use executor::*;
pub use interval::*;
pub use materialize::*;
pub use prepared::*;
pub use record::*;
pub use row::*;
pub use sql_writer::*;
pub use statement::*;
pub use transaction::*;
pub use transient::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
