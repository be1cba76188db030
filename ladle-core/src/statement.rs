use crate::{
    AsValue, CancelGuard, CancelToken, Driver, Error, Executor, FromRow, Query, Result, RowPlan,
    RowsAffected, TableGuard, TransientTable, Value, materializer, reclassify,
};
use anyhow::Context;
use async_stream::try_stream;
use futures::{Stream, StreamExt, TryStreamExt};
use std::{pin::pin, sync::Arc};

/// One ad-hoc command: SQL text, ordered parameters and the transient
/// tables it reads from.
#[derive(Debug, Default)]
pub struct Statement {
    sql: String,
    params: Vec<(String, Value)>,
    tables: Vec<TransientTable>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Default::default()
        }
    }

    /// Append a named parameter. Binding order is the declaration order.
    pub fn param(mut self, name: impl Into<String>, value: impl AsValue) -> Self {
        self.params.push((name.into(), value.as_value()));
        self
    }

    /// Attach a transient table, provisioned before the command runs and
    /// dropped after it, in reverse attachment order.
    pub fn table(mut self, table: TransientTable) -> Self {
        self.tables.push(table);
        self
    }
}

/// Everything a prepared statement holds on the backend: the cancel
/// registration, the provisioned tables and the bound query.
///
/// Disposal is idempotent and releases in reverse acquisition order. Every
/// table gets its drop attempted even when an earlier one fails; the first
/// failure is reported after the whole chain ran.
pub struct StatementGuard<D: Driver> {
    cancel: CancelGuard,
    tables: Vec<TableGuard>,
    query: Option<Query<D>>,
    disposed: bool,
}

impl<D: Driver> StatementGuard<D> {
    pub fn take_query(&mut self) -> Result<Query<D>> {
        self.query
            .take()
            .ok_or(Error::msg("The statement query was already taken"))
    }

    pub fn tables(&self) -> &[TableGuard] {
        &self.tables
    }

    pub async fn dispose<E: Executor<Driver = D>>(&mut self, executor: &mut E) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.cancel.dispose();
        let mut failure = None;
        for table in self.tables.iter_mut().rev() {
            if let Err(e) = table.dispose(executor).await {
                log::error!(
                    "Failed to drop the transient table `{}`: {:#}",
                    table.name(),
                    e
                );
                failure.get_or_insert(e);
            }
        }
        self.query = None;
        match failure {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    pub fn dispose_blocking<E: Executor<Driver = D>>(&mut self, executor: &mut E) -> Result<()> {
        futures::executor::block_on(self.dispose(executor))
    }
}

async fn bind_query<E: Executor>(
    executor: &mut E,
    sql: String,
    params: Vec<(String, Value)>,
) -> Result<Query<E::Driver>> {
    if params.is_empty() {
        return Ok(Query::Raw(sql));
    }
    let mut query = executor.prepare(sql).await?;
    for (name, value) in params {
        query
            .bind_value(value)
            .with_context(|| format!("Cannot bind the parameter `{}`", name))?;
    }
    Ok(query)
}

/// Provision everything the statement needs: register the cancellation,
/// create and load the transient tables in attachment order, then bind the
/// query. Any failure releases whatever was already acquired before
/// surfacing, reclassified against `token`.
pub async fn prepare_statement<E: Executor>(
    executor: &mut E,
    statement: Statement,
    token: &CancelToken,
) -> Result<StatementGuard<E::Driver>> {
    let signature = executor.driver().abort_signature();
    let cancel = executor.register_cancel(token);
    let mut guard = StatementGuard {
        cancel,
        tables: Vec::with_capacity(statement.tables.len()),
        query: None,
        disposed: false,
    };
    for table in statement.tables {
        match table.provision(executor, token).await {
            Ok(v) => guard.tables.push(v),
            Err(e) => {
                if let Err(teardown) = guard.dispose(executor).await {
                    log::error!("Failed to release a partially prepared statement: {:#}", teardown);
                }
                return Err(reclassify(e, token, &signature));
            }
        }
    }
    match bind_query(executor, statement.sql, statement.params).await {
        Ok(query) => {
            guard.query = Some(query);
            Ok(guard)
        }
        Err(e) => {
            if let Err(teardown) = guard.dispose(executor).await {
                log::error!("Failed to release a partially prepared statement: {:#}", teardown);
            }
            Err(reclassify(e, token, &signature))
        }
    }
}

/// Run the statement end to end, materializing every row into `T`.
///
/// The transient tables live for the duration of the stream and are dropped
/// before it finishes, on success, failure and cancellation alike. A failing
/// advance carrying the driver's abort signature surfaces as
/// [`Cancelled`](crate::Cancelled) when `token` was cancelled.
pub fn fetch_statement<'a, T, E>(
    executor: &'a mut E,
    statement: Statement,
    token: CancelToken,
) -> impl Stream<Item = Result<T>> + 'a
where
    T: FromRow,
    E: Executor,
{
    try_stream! {
        let signature = executor.driver().abort_signature();
        let mut guard = prepare_statement(executor, statement, &token).await?;
        let query = guard.take_query()?;
        let mut failure: Option<Error> = None;
        let mut plan: Option<Arc<RowPlan>> = None;
        {
            let mut rows = pin!(executor.fetch(query));
            while let Some(item) = rows.next().await {
                let row = match item {
                    Ok(v) => v,
                    Err(e) => {
                        failure = Some(reclassify(e, &token, &signature));
                        break;
                    }
                };
                let plan = match &plan {
                    Some(v) => v.clone(),
                    None => match materializer::<T>(&row.columns) {
                        Ok(compiled) => {
                            plan = Some(compiled.clone());
                            compiled
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    },
                };
                match T::from_row(&plan, row) {
                    Ok(v) => yield v,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }
        let teardown = guard.dispose(executor).await;
        surface(failure, teardown)?;
    }
}

/// The command failure, when there is one, takes precedence over a teardown
/// failure.
fn surface(failure: Option<Error>, teardown: Result<()>) -> Result<()> {
    match failure {
        Some(e) => Err(e),
        None => teardown,
    }
}

/// Run a modify statement end to end. Teardown runs whether the command
/// succeeded or not; a command failure takes precedence over a teardown one.
pub async fn execute_statement<E: Executor>(
    executor: &mut E,
    statement: Statement,
    token: &CancelToken,
) -> Result<RowsAffected> {
    let signature = executor.driver().abort_signature();
    let mut guard = prepare_statement(executor, statement, token).await?;
    let query = guard.take_query()?;
    let result = executor
        .execute(query)
        .await
        .map_err(|e| reclassify(e, token, &signature));
    let teardown = guard.dispose(executor).await;
    let affected = result?;
    teardown?;
    Ok(affected)
}

/// Synchronous convenience wrappers driving the async pipeline to
/// completion on the current thread.
pub mod blocking {
    use super::*;

    pub fn fetch_statement<T, E>(
        executor: &mut E,
        statement: Statement,
        token: CancelToken,
    ) -> Result<Vec<T>>
    where
        T: FromRow,
        E: Executor,
    {
        futures::executor::block_on(super::fetch_statement(executor, statement, token).try_collect())
    }

    pub fn execute_statement<E: Executor>(
        executor: &mut E,
        statement: Statement,
        token: &CancelToken,
    ) -> Result<RowsAffected> {
        futures::executor::block_on(super::execute_statement(executor, statement, token))
    }

    pub fn provision<E: Executor>(
        executor: &mut E,
        table: TransientTable,
        token: &CancelToken,
    ) -> Result<TableGuard> {
        futures::executor::block_on(table.provision(executor, token))
    }
}
