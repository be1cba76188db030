use crate::{Executor, Result};

/// A database transaction. Transient tables provisioned through a
/// transaction share its lifetime and visibility.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>>;
    fn rollback(self) -> impl Future<Output = Result<()>>;
}
