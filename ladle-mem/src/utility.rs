use crate::sql_writer::COLLATION_QUERY;
use ladle_core::{CursorColumn, Error, Result, Value, truncate_long};

/// The statements the in-memory backend understands: the shapes its own
/// [`SqlWriter`](ladle_core::SqlWriter) renders, plus `SELECT * FROM`.
#[derive(Debug, PartialEq)]
pub(crate) enum MemStatement {
    CollationProbe,
    CreateTable {
        name: String,
        columns: Vec<CursorColumn>,
    },
    DropTable {
        name: String,
    },
    SelectAll {
        name: String,
    },
}

pub(crate) fn parse_statement(sql: &str) -> Result<MemStatement> {
    let sql = sql.trim();
    if sql == COLLATION_QUERY {
        return Ok(MemStatement::CollationProbe);
    }
    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let (name, rest) = parse_identifier(rest)?;
        let rest = rest.trim_start();
        let Some(body) = rest.strip_prefix('(').and_then(|v| v.strip_suffix(')')) else {
            return Err(Error::msg("Malformed CREATE TABLE column list"));
        };
        let columns = split_fragments(body)
            .into_iter()
            .map(parse_column)
            .collect::<Result<_>>()?;
        return Ok(MemStatement::CreateTable { name, columns });
    }
    if let Some(rest) = sql.strip_prefix("DROP TABLE IF EXISTS ") {
        let (name, _) = parse_identifier(rest)?;
        return Ok(MemStatement::DropTable { name });
    }
    if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
        let (name, _) = parse_identifier(rest)?;
        return Ok(MemStatement::SelectAll { name });
    }
    Err(Error::msg(format!("Unsupported query: {}", truncate_long!(sql))))
}

/// Reads one double-quoted identifier, returning it unescaped along with the
/// rest of the input.
fn parse_identifier(input: &str) -> Result<(String, &str)> {
    let Some(rest) = input.strip_prefix('"') else {
        return Err(Error::msg(format!(
            "Expected a quoted identifier at: {}",
            truncate_long!(input)
        )));
    };
    let mut name = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            name.push(c);
            continue;
        }
        match chars.next() {
            // An escaped quote inside the identifier.
            Some((_, '"')) => name.push('"'),
            Some((j, _)) => return Ok((name, &rest[j..])),
            None => return Ok((name, &rest[i + 1..])),
        }
    }
    Err(Error::msg("Unterminated quoted identifier"))
}

/// Splits a column list on top-level `, ` separators, ignoring the ones
/// inside quotes or parentheses.
fn split_fragments(body: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                fragments.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = body[start..].trim();
    if !last.is_empty() {
        fragments.push(last);
    }
    fragments
}

fn parse_column(fragment: &str) -> Result<CursorColumn> {
    let (name, rest) = parse_identifier(fragment)?;
    let mut ty = rest.trim();
    if let Some(position) = ty.find(" COLLATE ") {
        ty = ty[..position].trim_end();
    }
    Ok(CursorColumn::new(name, parse_column_type(ty)?))
}

fn parse_column_type(ty: &str) -> Result<Value> {
    Ok(match ty {
        "BOOLEAN" => Value::Boolean(None),
        "TINYINT" => Value::Int8(None),
        "SMALLINT" => Value::Int16(None),
        "INTEGER" => Value::Int32(None),
        "BIGINT" => Value::Int64(None),
        "UTINYINT" => Value::UInt8(None),
        "USMALLINT" => Value::UInt16(None),
        "UINTEGER" => Value::UInt32(None),
        "UBIGINT" => Value::UInt64(None),
        "FLOAT" => Value::Float32(None),
        "DOUBLE" => Value::Float64(None),
        "CHAR(1)" => Value::Char(None),
        "BLOB" => Value::Blob(None),
        "DATE" => Value::Date(None),
        "TIME" => Value::Time(None),
        "TIMESTAMP" => Value::Timestamp(None),
        "TIMESTAMP WITH TIME ZONE" => Value::TimestampWithTimezone(None),
        "INTERVAL" => Value::Interval(None),
        "UUID" => Value::Uuid(None),
        v if v == "VARCHAR" || v.starts_with("VARCHAR(") => Value::Varchar(None),
        v if v.starts_with("DECIMAL") => {
            let (precision, scale) = v
                .strip_prefix("DECIMAL(")
                .and_then(|v| v.strip_suffix(')'))
                .and_then(|v| v.split_once(','))
                .map_or((0, 0), |(p, s)| {
                    (
                        p.trim().parse().unwrap_or(0),
                        s.trim().parse().unwrap_or(0),
                    )
                });
            Value::Decimal(None, precision, scale)
        }
        _ => return Err(Error::msg(format!("Unsupported column type: {}", ty))),
    })
}
