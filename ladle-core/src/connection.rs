use crate::{Executor, Result};
use std::future::Future;

pub trait Connection: Executor {
    /// Establish a connection to the given URL.
    fn connect(url: &str) -> impl Future<Output = Result<impl Connection>>;
}
