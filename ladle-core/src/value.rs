use crate::interval::Interval;
use rust_decimal::Decimal;
use std::mem::{self, Discriminant};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed column value.
///
/// Each variant carries an `Option` payload so the same enum doubles as a
/// type descriptor (payload `None`) and a datum (payload `Some`). Result
/// cursors describe their columns with payload-less values and deliver rows
/// as populated ones.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* prec: */ u8, /* scale: */ u8),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Interval(Option<Interval>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
    /// Untyped textual fetch, produced by drivers for column types that lack
    /// a narrow accessor. Decoding goes through `AsValue::parse`.
    Unknown(Option<String>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l, l_prec, l_scale), Self::Decimal(r, r_prec, r_scale)) => {
                l == r && l_prec == r_prec && l_scale == r_scale
            }
            (Self::Char(l), Self::Char(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Interval(l), Self::Interval(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            (Self::Unknown(l), Self::Unknown(r)) => l == r,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Value {
    /// Structural type equality, ignores the payloads.
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Decimal(.., l_prec, l_scale), Self::Decimal(.., r_prec, r_scale)) => {
                l_prec == r_prec && l_scale == r_scale
            }
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    pub fn kind(&self) -> Discriminant<Value> {
        mem::discriminant(self)
    }

    /// Name of the column type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "Boolean",
            Value::Int8(..) => "Int8",
            Value::Int16(..) => "Int16",
            Value::Int32(..) => "Int32",
            Value::Int64(..) => "Int64",
            Value::UInt8(..) => "UInt8",
            Value::UInt16(..) => "UInt16",
            Value::UInt32(..) => "UInt32",
            Value::UInt64(..) => "UInt64",
            Value::Float32(..) => "Float32",
            Value::Float64(..) => "Float64",
            Value::Decimal(..) => "Decimal",
            Value::Char(..) => "Char",
            Value::Varchar(..) => "Varchar",
            Value::Blob(..) => "Blob",
            Value::Date(..) => "Date",
            Value::Time(..) => "Time",
            Value::Timestamp(..) => "Timestamp",
            Value::TimestampWithTimezone(..) => "TimestampWithTimezone",
            Value::Interval(..) => "Interval",
            Value::Uuid(..) => "Uuid",
            Value::List(..) => "List",
            Value::Unknown(..) => "Unknown",
        }
    }

    /// True when the value holds no datum (a NULL cell or a bare descriptor).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v, ..) => v.is_none(),
            Value::Char(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Interval(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
            Value::Unknown(v) => v.is_none(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                Value::Float32(..) | Value::Float64(..) | Value::Decimal(..)
            )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Value::Char(..) | Value::Varchar(..) | Value::Unknown(..)
        )
    }

    /// Integer datum widened to `i128`, when the value holds one.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int8(Some(v)) => Some(*v as i128),
            Value::Int16(Some(v)) => Some(*v as i128),
            Value::Int32(Some(v)) => Some(*v as i128),
            Value::Int64(Some(v)) => Some(*v as i128),
            Value::UInt8(Some(v)) => Some(*v as i128),
            Value::UInt16(Some(v)) => Some(*v as i128),
            Value::UInt32(Some(v)) => Some(*v as i128),
            Value::UInt64(Some(v)) => Some(*v as i128),
            _ => None,
        }
    }
}
