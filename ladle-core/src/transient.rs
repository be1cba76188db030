use crate::{
    AsValue, CancelToken, Driver, EnumEncoding, Executor, Record, Result, Row, SqlWriter, Value,
    reclassify,
};
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

/// One column of a transient table schema.
#[derive(Debug, Clone)]
pub struct TransientColumn {
    pub name: String,
    /// Payload-less [`Value`] describing the wire type.
    pub ty: Value,
    /// Declared width of sized text columns, in characters.
    pub width: Option<u32>,
    /// Whether the column takes the database collation clause.
    pub needs_collation: bool,
}

/// A scratch table inferred from caller data, not yet created on the
/// backend. [`provision`](TransientTable::provision) creates and loads it,
/// returning the guard that owns the drop.
#[derive(Debug)]
pub struct TransientTable {
    name: String,
    columns: Box<[TransientColumn]>,
    rows: Vec<Row>,
}

/// Widest payload of a text column, in characters. Sized as at least one
/// character so empty sequences still declare a valid type.
fn text_width(rows: &[Row], index: usize) -> u32 {
    let mut width = 1u32;
    for row in rows {
        match &row[index] {
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => {
                width = width.max(v.chars().count() as u32)
            }
            _ => {}
        }
    }
    width
}

impl TransientTable {
    /// Single column table, named `Value`, inferred from a sequence of
    /// scalars. Enumerations follow `encoding`.
    pub fn from_scalars<T: AsValue>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
        encoding: EnumEncoding,
    ) -> Self {
        let ty = if T::is_enumeration() && encoding == EnumEncoding::Integer {
            Value::Int64(None)
        } else {
            T::as_empty_value()
        };
        let rows = values
            .into_iter()
            .map(|v| Box::from([v.encode(encoding)]))
            .collect::<Vec<Row>>();
        let width = matches!(ty, Value::Varchar(..)).then(|| text_width(&rows, 0));
        let needs_collation = ty.is_textual();
        Self {
            name: name.into(),
            columns: Box::from([TransientColumn {
                name: "Value".into(),
                ty,
                width,
                needs_collation,
            }]),
            rows,
        }
    }

    /// Multi column table whose schema mirrors the fields of `R`.
    pub fn from_records<R: Record>(
        name: impl Into<String>,
        items: impl IntoIterator<Item = R>,
        encoding: EnumEncoding,
    ) -> Self {
        let rows = items
            .into_iter()
            .map(|v| v.row(encoding))
            .collect::<Vec<Row>>();
        let columns = R::fields()
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let ty = if field.enumeration && encoding == EnumEncoding::Integer {
                    Value::Int64(None)
                } else {
                    field.ty.clone()
                };
                let width = matches!(ty, Value::Varchar(..)).then(|| text_width(&rows, i));
                let needs_collation = ty.is_textual();
                TransientColumn {
                    name: field.name.into(),
                    ty,
                    width,
                    needs_collation,
                }
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[TransientColumn] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Create the table on the backend and bulk load its rows.
    ///
    /// An empty sequence still creates the (empty) table. Once `CREATE TABLE`
    /// succeeded the table is guaranteed a drop: a failing load drops it here
    /// before surfacing the failure, a successful one hands the drop to the
    /// returned guard.
    pub async fn provision<E: Executor>(
        self,
        executor: &mut E,
        token: &CancelToken,
    ) -> Result<TableGuard> {
        let signature = executor.driver().abort_signature();
        let collation = if self.columns.iter().any(|c| c.needs_collation) {
            database_collation(executor, token)
                .await
                .map_err(|e| reclassify(e, token, &signature))?
        } else {
            None
        };
        let mut ddl = String::with_capacity(128);
        executor.driver().sql_writer().write_create_transient_table(
            &mut ddl,
            &self.name,
            &self.columns,
            collation.as_deref(),
        );
        executor
            .execute(ddl.into())
            .await
            .map_err(|e| reclassify(e, token, &signature))?;
        let mut guard = TableGuard {
            name: self.name,
            dropped: false,
        };
        if let Err(e) = executor.append(&guard.name, &self.columns, &self.rows).await {
            if let Err(drop_error) = guard.dispose(executor).await {
                log::error!(
                    "Failed to drop the transient table `{}` after a load failure: {:#}",
                    guard.name,
                    drop_error
                );
            }
            return Err(reclassify(e, token, &signature));
        }
        Ok(guard)
    }
}

static COLLATIONS: LazyLock<RwLock<HashMap<String, Option<Arc<str>>>>> =
    LazyLock::new(Default::default);

/// Collation applied to transient text columns, probed once per database
/// identity and cached for the process lifetime.
async fn database_collation<E: Executor>(
    executor: &mut E,
    token: &CancelToken,
) -> Result<Option<Arc<str>>> {
    let Some(probe) = executor.driver().sql_writer().collation_query() else {
        return Ok(None);
    };
    let key = executor.database_identity();
    if let Some(v) = COLLATIONS
        .read()
        .expect("Collation cache lock poisoned")
        .get(&key)
    {
        return Ok(v.clone());
    }
    let collation: Option<Option<String>> = executor.fetch_scalar(probe.into(), token).await?;
    let collation = collation.flatten().map(|v| Arc::<str>::from(v.as_str()));
    let mut cache = COLLATIONS.write().expect("Collation cache lock poisoned");
    Ok(cache.entry(key).or_insert(collation).clone())
}

/// Owns the drop of one provisioned transient table.
///
/// Disposal is idempotent: the drop statement runs at most once, later calls
/// are no-ops. The guard does not drop the table on `Drop` (that would need
/// an executor); it logs the leak instead.
#[derive(Debug)]
pub struct TableGuard {
    name: String,
    dropped: bool,
}

impl TableGuard {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.dropped
    }

    pub async fn dispose<E: Executor>(&mut self, executor: &mut E) -> Result<()> {
        if self.dropped {
            return Ok(());
        }
        self.dropped = true;
        let mut sql = String::with_capacity(64);
        executor
            .driver()
            .sql_writer()
            .write_drop_transient_table(&mut sql, &self.name);
        executor.execute(sql.into()).await?;
        Ok(())
    }

    pub fn dispose_blocking<E: Executor>(&mut self, executor: &mut E) -> Result<()> {
        futures::executor::block_on(self.dispose(executor))
    }
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        if !self.dropped {
            log::warn!("Transient table `{}` was never dropped", self.name);
        }
    }
}
