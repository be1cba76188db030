use crate::{
    AsValue, CancelGuard, CancelToken, Driver, FromRow, Query, QueryResult, Result, RowLabeled,
    RowPlan, RowsAffected, ShapeError, SqlWriter, TransientColumn, column_label, materializer,
    reclassify,
};
use anyhow::Context;
use async_stream::try_stream;
use futures::{Stream, StreamExt, TryStreamExt, future::ready};
use std::{any, future::Future, pin::pin, sync::Arc};

/// Something queries can run on: a connection or a transaction.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Identity of the target database. Keys the process wide caches that
    /// hold per database facts, such as the transient table collation.
    fn database_identity(&self) -> String;

    fn prepare(&mut self, query: String) -> impl Future<Output = Result<Query<Self::Driver>>> + Send;

    /// Execute the query, streaming back rows and modify effects as they
    /// arrive.
    fn run(&mut self, query: Query<Self::Driver>)
    -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Hook the caller's token to the driver's abort facility. The default
    /// registration is inert: cancellation is still observed between rows,
    /// but nothing interrupts the backend mid statement.
    fn register_cancel(&mut self, token: &CancelToken) -> CancelGuard {
        token.register(|| {})
    }

    /// Execute the query yielding only the data rows.
    fn fetch(&mut self, query: Query<Self::Driver>) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| {
            ready(match v {
                Ok(QueryResult::Row(row)) => Some(Ok(row)),
                Ok(QueryResult::Affected(..)) => None,
                Err(e) => Some(Err(e)),
            })
        })
    }

    /// Execute the query returning the cumulative modify effect.
    fn execute(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .try_filter_map(|v| {
                ready(Ok(match v {
                    QueryResult::Affected(affected) => Some(affected),
                    QueryResult::Row(..) => None,
                }))
            })
            .try_collect()
    }

    /// Bulk load rows into an existing table, mapping values by the declared
    /// column order. The default renders one multi row INSERT; drivers with a
    /// native bulk path override it.
    fn append(
        &mut self,
        table: &str,
        columns: &[TransientColumn],
        rows: &[crate::Row],
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            if rows.is_empty() {
                return Ok(());
            }
            let mut query = String::with_capacity(64 + rows.len() * 32);
            self.driver()
                .sql_writer()
                .write_insert(&mut query, table, columns, rows);
            self.execute(query.into()).await?;
            Ok(())
        }
    }

    /// Execute the query materializing every row into `T`.
    ///
    /// The row plan is resolved once, from the first row's cursor columns,
    /// and reused for the rest of the stream. Failing advances are checked
    /// against the driver's abort signature and surface as
    /// [`Cancelled`](crate::Cancelled) when `token` requested the abort.
    fn fetch_as<T: FromRow>(
        &mut self,
        query: Query<Self::Driver>,
        token: &CancelToken,
    ) -> impl Stream<Item = Result<T>> + Send {
        let token = token.clone();
        let signature = self.driver().abort_signature();
        let rows = self.fetch(query);
        try_stream! {
            let mut rows = pin!(rows);
            let mut plan: Option<Arc<RowPlan>> = None;
            while let Some(item) = rows.next().await {
                let row = item.map_err(|e| reclassify(e, &token, &signature))?;
                let plan = match &plan {
                    Some(v) => v.clone(),
                    None => {
                        let compiled = materializer::<T>(&row.columns)?;
                        plan = Some(compiled.clone());
                        compiled
                    }
                };
                yield T::from_row(&plan, row)?;
            }
        }
    }

    /// Like [`fetch_as`](Self::fetch_as) but stops at the first row.
    fn fetch_one_as<T: FromRow>(
        &mut self,
        query: Query<Self::Driver>,
        token: &CancelToken,
    ) -> impl Future<Output = Result<Option<T>>> + Send {
        let rows = self.fetch_as::<T>(query, token);
        async move {
            let mut rows = pin!(rows);
            rows.next().await.transpose()
        }
    }

    /// First column of the first row, converted to `T`. `None` when the
    /// query produced no rows.
    fn fetch_scalar<T: AsValue + Send + 'static>(
        &mut self,
        query: Query<Self::Driver>,
        token: &CancelToken,
    ) -> impl Future<Output = Result<Option<T>>> + Send {
        let token = token.clone();
        let signature = self.driver().abort_signature();
        let rows = self.fetch(query);
        async move {
            let mut rows = pin!(rows);
            let Some(item) = rows.next().await else {
                return Ok(None);
            };
            let RowLabeled { columns, values } = item.map_err(|e| reclassify(e, &token, &signature))?;
            let Some(value) = values.into_vec().into_iter().next() else {
                return Err(ShapeError::NoColumns {
                    shape: any::type_name::<T>(),
                }
                .into());
            };
            let label = column_label(&columns, 0);
            T::try_from_value(value).map(Some).with_context(|| {
                format!(
                    "Cannot convert the value of column `{}` to {}",
                    label,
                    any::type_name::<T>(),
                )
            })
        }
    }
}
