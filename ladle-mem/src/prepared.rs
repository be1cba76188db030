use ladle_core::{Error, Prepared, Result, Value, truncate_long};
use std::fmt::{self, Display};

/// Prepared statement handle of the in-memory backend. Bindings are kept as
/// is: the backend has no placeholder substitution, the bound values exist
/// for inspection by the test suites.
#[derive(Debug, Default)]
pub struct MemPrepared {
    sql: String,
    binds: Vec<Value>,
}

impl MemPrepared {
    pub fn new(sql: String) -> Self {
        Self {
            sql,
            binds: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[Value] {
        &self.binds
    }
}

impl Prepared for MemPrepared {
    fn bind_value(&mut self, value: Value) -> Result<&mut Self> {
        self.binds.push(value);
        Ok(self)
    }

    fn bind_index_value(&mut self, value: Value, index: u64) -> Result<&mut Self> {
        let index = index as usize;
        if index >= self.binds.len() {
            if index > 1024 {
                return Err(Error::msg(format!(
                    "Parameter index {} is out of the accepted range",
                    index
                )));
            }
            self.binds.resize(index + 1, Value::Null);
        }
        self.binds[index] = value;
        Ok(self)
    }

    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.binds.clear();
        Ok(self)
    }
}

impl Display for MemPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
