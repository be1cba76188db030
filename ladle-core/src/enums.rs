use crate::{Error, Result, Value, truncate_long};
use std::any;

/// How enumeration fields are rendered when a transient table is provisioned
/// from a sequence.
///
/// Threaded explicitly through schema inference and row serialization; there
/// is no process-wide mode to mutate.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumEncoding {
    /// Member name in a collated text column.
    #[default]
    Text,
    /// Declared member value in a BIGINT column.
    Integer,
}

/// A unit enum mapped to a SQL column, either by member name or by declared
/// member value. Implemented through the [`sql_enum!`](crate::sql_enum)
/// macro.
pub trait EnumValue: Sized + Copy + 'static {
    fn variants() -> &'static [Self];
    fn name(&self) -> &'static str;
    fn value(&self) -> i64;

    /// Case-insensitive member lookup by name.
    fn from_name(name: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .find(|v| v.name().eq_ignore_ascii_case(name))
            .copied()
    }

    fn from_value(value: i64) -> Option<Self> {
        Self::variants().iter().find(|v| v.value() == value).copied()
    }

    /// Decode a column datum into a member.
    ///
    /// Accepts an integer of any width equal to a declared member value, a
    /// non-blank string matched case-insensitively against member names, and,
    /// leniently, a digit-only string retried as a member value. NULL cells
    /// are the caller's concern: a bare enum target rejects them, `Option`
    /// wrapping maps them to `None` before this runs.
    fn decode(value: Value) -> Result<Self> {
        if let Some(wide) = value.as_integer() {
            let narrow = i64::try_from(wide).ok();
            return narrow.and_then(Self::from_value).ok_or_else(|| {
                Error::msg(format!(
                    "Value {wide} has no matching value in the enum {}",
                    any::type_name::<Self>(),
                ))
            });
        }
        match value {
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => {
                let v = v.trim();
                if v.is_empty() {
                    return Err(Error::msg(format!(
                        "An empty or whitespace string cannot identify a member of the enum {}",
                        any::type_name::<Self>(),
                    )));
                }
                let digits = v.strip_prefix('-').unwrap_or(v);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    let number = v.parse::<i64>().ok();
                    return number.and_then(Self::from_value).ok_or_else(|| {
                        Error::msg(format!(
                            "Value {} has no matching value in the enum {}",
                            truncate_long!(v),
                            any::type_name::<Self>(),
                        ))
                    });
                }
                Self::from_name(v).ok_or_else(|| {
                    Error::msg(format!(
                        "The string `{}` has no matching name in the enum {}",
                        truncate_long!(v),
                        any::type_name::<Self>(),
                    ))
                })
            }
            // A single character gets the same name/digit treatment as any
            // other string datum.
            Value::Char(Some(v)) => Self::decode(Value::Varchar(Some(v.to_string()))),
            _ => Err(Error::msg(format!(
                "A value of kind {} cannot identify a member of the enum {}",
                value.type_name(),
                any::type_name::<Self>(),
            ))),
        }
    }

    /// Render for the wire according to the requested encoding.
    fn encode_member(&self, encoding: EnumEncoding) -> Value {
        match encoding {
            EnumEncoding::Text => Value::Varchar(Some(self.name().to_string())),
            EnumEncoding::Integer => Value::Int64(Some(self.value())),
        }
    }

    /// Column type a transient table declares for fields of this enum.
    fn column_type(encoding: EnumEncoding) -> Value {
        match encoding {
            EnumEncoding::Text => Value::Varchar(None),
            EnumEncoding::Integer => Value::Int64(None),
        }
    }
}

/// Declares a unit enum usable as a record field, a scalar sequence element
/// and a materialization target.
///
/// ```rust
/// use ladle_core::sql_enum;
///
/// sql_enum! {
///     pub enum Category {
///         Beverages = 1,
///         Produce = 2,
///         Seafood = 8,
///     }
/// }
/// ```
///
/// Implements [`EnumValue`](crate::EnumValue) and
/// [`AsValue`](crate::AsValue); the first member is the `Default`.
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident = $first_value:expr
            $(, $member:ident = $member_value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        $vis enum $name {
            #[default]
            $first = $first_value,
            $($member = $member_value,)*
        }

        impl $crate::EnumValue for $name {
            fn variants() -> &'static [Self] {
                &[Self::$first, $(Self::$member,)*]
            }
            fn name(&self) -> &'static str {
                match self {
                    Self::$first => stringify!($first),
                    $(Self::$member => stringify!($member),)*
                }
            }
            fn value(&self) -> i64 {
                *self as i64
            }
        }

        impl $crate::AsValue for $name {
            fn as_empty_value() -> $crate::Value {
                $crate::Value::Varchar(None)
            }
            fn as_value(self) -> $crate::Value {
                $crate::Value::Varchar(Some($crate::EnumValue::name(&self).to_string()))
            }
            fn try_from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::EnumValue::decode(value)
            }
            fn is_enumeration() -> bool {
                true
            }
            fn encode(self, encoding: $crate::EnumEncoding) -> $crate::Value {
                $crate::EnumValue::encode_member(&self, encoding)
            }
            fn accepts(column: &$crate::Value) -> bool {
                column.is_textual() || column.is_integer()
            }
            fn parse(input: &str) -> $crate::Result<Self> {
                $crate::EnumValue::decode($crate::Value::Unknown(Some(input.to_string())))
            }
        }
    };
}
