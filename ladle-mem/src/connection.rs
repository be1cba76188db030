use crate::{
    MemDriver, MemPrepared,
    sql_writer::COLLATION_NAME,
    utility::{MemStatement, parse_statement},
};
use async_stream::try_stream;
use futures::Stream;
use ladle_core::{
    CancelGuard, CancelToken, ColumnsInfo, Connection, CursorColumn, DbError, Error, Executor,
    Query, QueryResult, Result, Row, RowLabeled, RowsAffected, TransientColumn, Value,
};
use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

#[derive(Default)]
struct MemTable {
    columns: ColumnsInfo,
    rows: Vec<Row>,
}

#[derive(Default)]
struct MemDb {
    tables: HashMap<String, MemTable>,
}

/// A standalone in-memory database. Every connection owns its own store;
/// state is never shared between connections.
pub struct MemConnection {
    driver: MemDriver,
    url: String,
    db: Arc<Mutex<MemDb>>,
    interrupt: Arc<AtomicBool>,
}

fn abort_error() -> Error {
    let signature = MemDriver::ABORT_SIGNATURE;
    Error::new(DbError {
        severity: signature.severity,
        code: signature.code,
        state: signature.state,
        message: "The operation was interrupted".into(),
    })
}

fn check_interrupt(interrupt: &AtomicBool) -> Result<()> {
    if interrupt.load(Ordering::Acquire) {
        return Err(abort_error());
    }
    Ok(())
}

fn create_table(db: &Mutex<MemDb>, name: String, columns: Vec<CursorColumn>) -> Result<()> {
    let mut db = db.lock().expect("Mem store lock poisoned");
    if db.tables.contains_key(&name) {
        return Err(Error::msg(format!("Table `{}` already exists", name)));
    }
    db.tables.insert(
        name,
        MemTable {
            columns: columns.into(),
            rows: Vec::new(),
        },
    );
    Ok(())
}

fn drop_table(db: &Mutex<MemDb>, name: &str) {
    db.lock()
        .expect("Mem store lock poisoned")
        .tables
        .remove(name);
}

fn snapshot(db: &Mutex<MemDb>, name: &str) -> Result<(ColumnsInfo, Vec<Row>)> {
    let db = db.lock().expect("Mem store lock poisoned");
    let Some(table) = db.tables.get(name) else {
        return Err(Error::msg(format!("Table `{}` does not exist", name)));
    };
    Ok((table.columns.clone(), table.rows.clone()))
}

impl MemConnection {
    pub fn open(url: impl Into<String>) -> Self {
        Self {
            driver: MemDriver::new(),
            url: url.into(),
            db: Default::default(),
            interrupt: Default::default(),
        }
    }

    /// Whether the store currently holds the named table.
    pub fn has_table(&self, name: &str) -> bool {
        self.db
            .lock()
            .expect("Mem store lock poisoned")
            .tables
            .contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.db
            .lock()
            .expect("Mem store lock poisoned")
            .tables
            .keys()
            .cloned()
            .collect()
    }

    fn sql_of(query: &Query<MemDriver>) -> String {
        match query {
            Query::Raw(sql) => sql.clone(),
            Query::Prepared(prepared) => prepared.sql().to_string(),
        }
    }
}

impl Executor for MemConnection {
    type Driver = MemDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn database_identity(&self) -> String {
        self.url.clone()
    }

    fn prepare(&mut self, query: String) -> impl Future<Output = Result<Query<MemDriver>>> + Send {
        std::future::ready(Ok(Query::Prepared(MemPrepared::new(query))))
    }

    fn run(&mut self, query: Query<MemDriver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let sql = Self::sql_of(&query);
        let parsed = parse_statement(&sql);
        let db = self.db.clone();
        let interrupt = self.interrupt.clone();
        try_stream! {
            match parsed? {
                MemStatement::CollationProbe => {
                    let columns: ColumnsInfo =
                        Arc::from([CursorColumn::new("collation", Value::Varchar(None))]);
                    let values: Row = Box::from([Value::Varchar(Some(COLLATION_NAME.into()))]);
                    yield QueryResult::Row(RowLabeled::new(columns, values));
                }
                MemStatement::CreateTable { name, columns } => {
                    check_interrupt(&interrupt)?;
                    create_table(&db, name, columns)?;
                    yield QueryResult::Affected(RowsAffected::default());
                }
                // Teardown stays available after a cancellation: dropping
                // never consults the interrupt flag.
                MemStatement::DropTable { name } => {
                    drop_table(&db, &name);
                    yield QueryResult::Affected(RowsAffected::default());
                }
                MemStatement::SelectAll { name } => {
                    let (columns, rows) = snapshot(&db, &name)?;
                    for values in rows {
                        check_interrupt(&interrupt)?;
                        yield QueryResult::Row(RowLabeled::new(columns.clone(), values));
                    }
                }
            }
        }
    }

    /// Tokens hook straight into the per-connection interrupt flag, observed
    /// by every in-flight and subsequent operation on this connection.
    fn register_cancel(&mut self, token: &CancelToken) -> CancelGuard {
        let interrupt = self.interrupt.clone();
        token.register(move || interrupt.store(true, Ordering::Release))
    }

    /// Native bulk load: rows land in the store directly, mapped by column
    /// name onto the table schema.
    fn append(
        &mut self,
        table: &str,
        columns: &[TransientColumn],
        rows: &[Row],
    ) -> impl Future<Output = Result<()>> + Send {
        let result = (|| {
            check_interrupt(&self.interrupt)?;
            let mut db = self.db.lock().expect("Mem store lock poisoned");
            let Some(target) = db.tables.get_mut(table) else {
                return Err(Error::msg(format!("Table `{}` does not exist", table)));
            };
            let mapping = columns
                .iter()
                .map(|column| {
                    target
                        .columns
                        .iter()
                        .position(|v| v.name == column.name)
                        .ok_or_else(|| {
                            Error::msg(format!(
                                "Column `{}` does not exist in table `{}`",
                                column.name, table
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            let width = target.columns.len();
            for row in rows {
                let mut values = vec![Value::Null; width];
                for (from, to) in mapping.iter().enumerate() {
                    values[*to] = row[from].clone();
                }
                target.rows.push(values.into());
            }
            Ok(())
        })();
        std::future::ready(result)
    }
}

impl Connection for MemConnection {
    fn connect(url: &str) -> impl Future<Output = Result<impl Connection>> {
        std::future::ready(Ok(MemConnection::open(url)))
    }
}
