use crate::{EnumEncoding, Error, Interval, Result, Value, truncate_long};
use atoi::FromRadix10SignedChecked;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, mem, time::Duration};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// representation that backs row decoding and transient table loading.
///
/// The payload-less value returned by `as_empty_value` doubles as the type
/// descriptor of `Self`, which is how schema inference and shape validation
/// reason about a field without an instance at hand.
///
/// # Conversion contract
/// - `try_from_value` accepts the canonical variant for the type, performs
///   range-checked conversions from the other widths of the same family, and
///   falls back to [`AsValue::parse`] for `Value::Unknown` text.
/// - Errors always name the offending value and the target type.
/// - `accepts` answers the same question statically: could `try_from_value`
///   ever succeed for a datum of that column type? Shape validation runs it
///   once per column, before any row is converted.
pub trait AsValue {
    /// A NULL-like value of the canonical variant for this type.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Whether NULL cells decode to this type (true only for `Option`).
    fn nullable() -> bool {
        false
    }
    /// Whether this type is a declared SQL enumeration.
    fn is_enumeration() -> bool {
        false
    }
    /// Serialize for a transient table load. Only enumerations look at the
    /// encoding; everything else defers to `as_value`.
    fn encode(self, _encoding: EnumEncoding) -> Value
    where
        Self: Sized,
    {
        self.as_value()
    }
    /// Whether a column declared with the given type can populate `Self`.
    fn accepts(column: &Value) -> bool {
        let own = Self::as_empty_value();
        mem::discriminant(&own) == mem::discriminant(column)
            || own.is_numeric() && column.is_numeric()
            || matches!(column, Value::Unknown(..))
    }
    /// Parse the textual rendition of a value, requiring the whole input to
    /// be consumed.
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

macro_rules! impl_as_value_int {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $variant(Some(v)) = value {
                    return Ok(v);
                }
                if let Value::Unknown(Some(ref v)) = value {
                    return Self::parse(v);
                }
                if let Some(wide) = value.as_integer() {
                    if wide < Self::MIN as i128 || wide > Self::MAX as i128 {
                        return Err(Error::msg(format!(
                            "Value {wide}: {} is out of range for {}",
                            value.type_name(),
                            any::type_name::<Self>(),
                        )));
                    }
                    return Ok(wide as $source);
                }
                Err(Error::msg(format!(
                    "Cannot convert {value:?} to {}",
                    any::type_name::<Self>(),
                )))
            }
            fn parse(input: &str) -> Result<Self> {
                let bytes = input.trim().as_bytes();
                let (num, used) = i128::from_radix_10_signed_checked(bytes);
                if used == 0 || used != bytes.len() {
                    return Err(Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>(),
                    )));
                }
                let num = num.ok_or_else(|| {
                    Error::msg(format!(
                        "Value `{}` is out of range for {}",
                        truncate_long!(input),
                        any::type_name::<Self>(),
                    ))
                })?;
                if num < Self::MIN as i128 || num > Self::MAX as i128 {
                    return Err(Error::msg(format!(
                        "Value `{}` is out of range for {}",
                        truncate_long!(input),
                        any::type_name::<Self>(),
                    )));
                }
                Ok(num as $source)
            }
        }
    };
}
impl_as_value_int!(i8, Value::Int8);
impl_as_value_int!(i16, Value::Int16);
impl_as_value_int!(i32, Value::Int32);
impl_as_value_int!(i64, Value::Int64);
impl_as_value_int!(u8, Value::UInt8);
impl_as_value_int!(u16, Value::UInt16);
impl_as_value_int!(u32, Value::UInt32);
impl_as_value_int!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v),
                    #[allow(unreachable_patterns)]
                    Value::Float32(Some(v)) => Ok(v as $source),
                    #[allow(unreachable_patterns)]
                    Value::Float64(Some(v)) => Ok(v as $source),
                    Value::Decimal(Some(v), ..) => v.to_f64().map(|v| v as $source).ok_or_else(|| {
                        Error::msg(format!(
                            "Value {v}: Decimal cannot be represented as {}",
                            any::type_name::<Self>(),
                        ))
                    }),
                    Value::Unknown(Some(ref v)) => Self::parse(v),
                    ref v if v.as_integer().is_some() => {
                        Ok(v.as_integer().expect("Checked to be an integer") as $source)
                    }
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                fast_float::parse(input.trim()).map_err(|_| {
                    Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Unknown(Some(ref v)) => Self::parse(v),
            ref v if v.as_integer().is_some() => {
                Ok(v.as_integer().expect("Checked to be an integer") != 0)
            }
            _ => Err(Error::msg(format!("Cannot convert {value:?} to bool"))),
        }
    }
    fn accepts(column: &Value) -> bool {
        matches!(column, Value::Boolean(..) | Value::Unknown(..)) || column.is_integer()
    }
    fn parse(input: &str) -> Result<Self> {
        match input.trim() {
            v if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
            v if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
            _ => Err(Error::msg(format!(
                "Cannot parse `{}` as bool",
                truncate_long!(input)
            ))),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as u8)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(|| {
                Error::msg(format!("Value {v}: f32 cannot be represented as Decimal"))
            }),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| {
                Error::msg(format!("Value {v}: f64 cannot be represented as Decimal"))
            }),
            Value::Unknown(Some(ref v)) => Self::parse(v),
            ref v if v.as_integer().is_some() => {
                let wide = v.as_integer().expect("Checked to be an integer");
                Decimal::from_i128(wide).ok_or_else(|| {
                    Error::msg(format!(
                        "Value {wide}: {} cannot be represented as Decimal",
                        v.type_name()
                    ))
                })
            }
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Decimal"))),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        input.trim().parse().map_err(|_| {
            Error::msg(format!(
                "Cannot parse `{}` as Decimal",
                truncate_long!(input)
            ))
        })
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => Ok(v),
            Value::Char(Some(v)) => Ok(v.to_string()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to String"))),
        }
    }
    fn accepts(column: &Value) -> bool {
        column.is_textual()
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(input.to_string())
    }
}

impl AsValue for char {
    fn as_empty_value() -> Value {
        Value::Char(None)
    }
    fn as_value(self) -> Value {
        Value::Char(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to char"))),
        }
    }
    fn accepts(column: &Value) -> bool {
        column.is_textual()
    }
    fn parse(input: &str) -> Result<Self> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::msg(format!(
                "Cannot convert the string `{}` of length {} to a char, exactly one character is required",
                truncate_long!(input),
                input.chars().count(),
            ))),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to a blob"))),
        }
    }
    fn accepts(column: &Value) -> bool {
        matches!(column, Value::Blob(..))
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        <Box<[u8]>>::try_from_value(value).map(Into::into)
    }
    fn accepts(column: &Value) -> bool {
        matches!(column, Value::Blob(..))
    }
}

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
const TIMESTAMP_SPACE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);
const TIMESTAMP_TZ_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
);

macro_rules! impl_as_value_temporal {
    ($source:ty, $variant:path, $parse:expr) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v),
                    // The inherent `parse(input, description)` of the time
                    // types shadows the trait method.
                    Value::Unknown(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                let parse: fn(&str) -> Option<Self> = $parse;
                parse(input.trim()).ok_or_else(|| {
                    Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}
impl_as_value_temporal!(Date, Value::Date, |v| Date::parse(v, DATE_FORMAT).ok());
impl_as_value_temporal!(Time, Value::Time, |v| Time::parse(v, TIME_FORMAT).ok());
impl_as_value_temporal!(PrimitiveDateTime, Value::Timestamp, |v| {
    PrimitiveDateTime::parse(v, TIMESTAMP_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(v, TIMESTAMP_SPACE_FORMAT))
        .ok()
});
impl_as_value_temporal!(OffsetDateTime, Value::TimestampWithTimezone, |v| {
    OffsetDateTime::parse(v, TIMESTAMP_TZ_FORMAT).ok()
});

impl AsValue for Interval {
    fn as_empty_value() -> Value {
        Value::Interval(None)
    }
    fn as_value(self) -> Value {
        Value::Interval(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Interval(Some(v)) => Ok(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Interval"))),
        }
    }
}

impl AsValue for Duration {
    fn as_empty_value() -> Value {
        Value::Interval(None)
    }
    fn as_value(self) -> Value {
        Value::Interval(Some(Interval::from_duration(&self)))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Interval::try_from_value(value).map(|v| v.as_duration(Interval::DAYS_IN_MONTH))
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Uuid"))),
        }
    }
    fn accepts(column: &Value) -> bool {
        matches!(
            column,
            Value::Uuid(..) | Value::Varchar(..) | Value::Unknown(..)
        )
    }
    fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim())
            .map_err(|_| Error::msg(format!("Cannot parse `{}` as Uuid", truncate_long!(input))))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
    fn nullable() -> bool {
        true
    }
    fn is_enumeration() -> bool {
        T::is_enumeration()
    }
    fn encode(self, encoding: EnumEncoding) -> Value {
        match self {
            Some(v) => v.encode(encoding),
            None => T::as_empty_value(),
        }
    }
    fn accepts(column: &Value) -> bool {
        matches!(column, Value::Null) || T::accepts(column)
    }
    fn parse(input: &str) -> Result<Self> {
        T::parse(input).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn nullable() -> bool {
        T::nullable()
    }
    fn is_enumeration() -> bool {
        T::is_enumeration()
    }
    fn encode(self, encoding: EnumEncoding) -> Value {
        (*self).encode(encoding)
    }
    fn accepts(column: &Value) -> bool {
        T::accepts(column)
    }
    fn parse(input: &str) -> Result<Self> {
        T::parse(input).map(Box::new)
    }
}
