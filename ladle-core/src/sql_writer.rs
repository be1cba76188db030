use crate::{Interval, Row, TransientColumn, Value, separated_by};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let mut buffer = ryu::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Renders SQL fragments in the dialect of one backend.
///
/// The defaults produce a conservative double-quoted, single-quote-escaped
/// dialect; drivers override the pieces their backend spells differently.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Probe returning the collation name to apply to the text columns of
    /// transient tables, `None` when the backend needs no collation clause.
    fn collation_query(&self) -> Option<&'static str> {
        None
    }

    /// Widest `VARCHAR(n)` the backend accepts before the declaration has to
    /// fall back to `VARCHAR(MAX)`.
    fn max_varchar_width(&self) -> u32 {
        4000
    }

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("TINYINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("UTINYINT"),
            Value::UInt16(..) => out.push_str("USMALLINT"),
            Value::UInt32(..) => out.push_str("UINTEGER"),
            Value::UInt64(..) => out.push_str("UBIGINT"),
            Value::Float32(..) => out.push_str("FLOAT"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("CHAR(1)"),
            Value::Varchar(..) => out.push_str("VARCHAR"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Interval(..) => out.push_str("INTERVAL"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::List(.., inner) => {
                self.write_column_type(out, inner);
                out.push_str("[]");
            }
            _ => panic!(
                "Unexpected Value, cannot get the sql type from {:?} variant",
                value
            ),
        };
    }

    /// A sized text type: `VARCHAR(width)`, or the backend's unbounded
    /// rendition once `width` exceeds [`max_varchar_width`](Self::max_varchar_width).
    fn write_text_type(&self, out: &mut String, width: u32) {
        if width > self.max_varchar_width() {
            out.push_str("VARCHAR(MAX)");
        } else {
            let _ = write!(out, "VARCHAR({})", width);
        }
    }

    fn write_transient_column(
        &self,
        out: &mut String,
        column: &TransientColumn,
        collation: Option<&str>,
    ) {
        self.write_identifier_quoted(out, &column.name);
        out.push(' ');
        match column.width {
            Some(width) if matches!(column.ty, Value::Varchar(..)) => {
                self.write_text_type(out, width)
            }
            _ => self.write_column_type(out, &column.ty),
        }
        if column.needs_collation {
            if let Some(collation) = collation {
                out.push_str(" COLLATE ");
                out.push_str(collation);
            }
        }
    }

    fn write_create_transient_table(
        &self,
        out: &mut String,
        name: &str,
        columns: &[TransientColumn],
        collation: Option<&str>,
    ) {
        out.push_str("CREATE TABLE ");
        self.write_identifier_quoted(out, name);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, column| self.write_transient_column(out, column, collation),
            ", ",
        );
        out.push(')');
    }

    fn write_drop_transient_table(&self, out: &mut String, name: &str) {
        out.push_str("DROP TABLE IF EXISTS ");
        self.write_identifier_quoted(out, name);
    }

    fn write_insert(&self, out: &mut String, table: &str, columns: &[TransientColumn], rows: &[Row]) {
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(out, table);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, column| self.write_identifier_quoted(out, &column.name),
            ", ",
        );
        out.push_str(") VALUES ");
        separated_by(
            out,
            rows,
            |out, row| {
                out.push('(');
                separated_by(out, row.iter(), |out, v| self.write_value(out, v), ", ");
                out.push(')');
            },
            ", ",
        );
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None, ..)
            | Value::Char(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::TimestampWithTimezone(None)
            | Value::Interval(None)
            | Value::Uuid(None)
            | Value::List(None, ..)
            | Value::Unknown(None) => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v), ..) => {
                let _ = write!(out, "{}", v);
            }
            Value::Char(Some(v)) => {
                out.push('\'');
                if *v == '\'' {
                    out.push('\'');
                }
                out.push(*v);
                out.push('\'');
            }
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v.as_ref()),
            Value::Date(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push('T');
                self.write_value_time(out, &v.time());
                out.push('\'');
            }
            Value::TimestampWithTimezone(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push('T');
                self.write_value_time(out, &v.time());
                let _ = write!(
                    out,
                    "{:+03}:{:02}",
                    v.offset().whole_hours(),
                    v.offset().whole_minutes().unsigned_abs() % 60
                );
                out.push('\'');
            }
            Value::Interval(Some(v)) => self.write_value_interval(out, v),
            Value::Uuid(Some(v)) => {
                let _ = write!(out, "'{}'", v);
            }
            Value::List(Some(v), ..) => {
                out.push('[');
                separated_by(out, v.iter(), |out, v| self.write_value(out, v), ",");
                out.push(']');
            }
        };
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL")
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize])
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == '\'' {
                out.push_str(&value[position..i]);
                out.push_str("''");
                position = i + 1;
            } else if c == '\n' {
                out.push_str(&value[position..i]);
                out.push_str("\\n");
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push('\'');
        for b in value {
            let _ = write!(out, "\\x{:X}", b);
        }
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &time::Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &time::Time) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}.{:0width$}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    fn value_interval_units(&self) -> &[(&str, i128)] {
        static UNITS: &[(&str, i128)] = &[
            ("DAY", Interval::NANOS_IN_DAY),
            ("HOUR", Interval::NANOS_IN_SEC * 3600),
            ("MINUTE", Interval::NANOS_IN_SEC * 60),
            ("SECOND", Interval::NANOS_IN_SEC),
            ("MICROSECOND", 1_000),
            ("NANOSECOND", 1),
        ];
        UNITS
    }

    fn write_value_interval(&self, out: &mut String, value: &Interval) {
        let _ = out.write_str("INTERVAL");
        let quote_position = out.len() + 1;
        macro_rules! write_unit {
            ($out:ident, $val:expr, $unit:expr) => {
                let _ = write!(
                    $out,
                    " {} {}{}",
                    $val,
                    $unit,
                    if $val > 1 { "S" } else { "" }
                );
            };
        }
        let mut units = 0;
        if value.months() != 0 {
            if value.months() % 12 == 0 {
                write_unit!(out, value.months() / 12, "YEAR");
                units += 1;
            } else {
                write_unit!(out, value.months(), "MONTH");
                units += 1;
            }
        }
        let nanos = value.nanos() + value.days() as i128 * Interval::NANOS_IN_DAY;
        for &(name, factor) in self.value_interval_units() {
            if nanos % factor == 0 {
                let value = nanos / factor;
                if units == 0 || value != 0 {
                    write_unit!(out, value, name);
                    units += 1;
                }
                break;
            }
        }
        if units > 1 {
            out.insert(quote_position, '\'');
            out.push('\'');
        }
    }
}
