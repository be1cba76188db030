use crate::{AsValue, EnumEncoding, Row, Value};

/// Descriptor of one named, settable field of a [`Record`].
///
/// Captured once per record type from the field's [`AsValue`] impl; the
/// materializer and the transient table schema both reason over these
/// instead of the concrete Rust type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name, matched case-insensitively against column names.
    pub name: &'static str,
    /// Canonical wire type (payload-less [`Value`]).
    pub ty: Value,
    /// Whether NULL cells are representable (`Option` fields).
    pub nullable: bool,
    /// Whether the field is a declared SQL enumeration.
    pub enumeration: bool,
    /// Whether a column of the given declared type can populate the field.
    pub accepts: fn(&Value) -> bool,
}

impl FieldDef {
    pub fn of<T: AsValue>(name: &'static str) -> Self {
        Self {
            name,
            ty: T::as_empty_value(),
            nullable: T::nullable(),
            enumeration: T::is_enumeration(),
            accepts: T::accepts,
        }
    }
}

/// A named shape: a default-constructible struct whose fields are assigned
/// one by one while a row is materialized, and read back in order when the
/// struct is loaded into a transient table.
///
/// Implemented through the [`record!`](crate::record) macro; the engine only
/// ever sees this resolved descriptor.
pub trait Record: Default + Send + 'static {
    /// Shape name used in diagnostics.
    fn record_name() -> &'static str;
    /// Field descriptors, in declaration order.
    fn fields() -> &'static [FieldDef];
    /// Assign the field at `index` from a column datum.
    fn set(&mut self, index: usize, value: Value) -> crate::Result<()>;
    /// Serialize every field, in declaration order, for a bulk load.
    fn row(&self, encoding: EnumEncoding) -> Row;
}

/// Declares a struct usable as a named materialization target and as the
/// element of a transient table sequence.
///
/// ```rust
/// use ladle_core::record;
///
/// record! {
///     #[derive(Debug, PartialEq)]
///     pub struct Product {
///         pub product_id: i64,
///         pub name: String,
///         pub units_in_stock: Option<i32>,
///     }
/// }
/// ```
///
/// Fields must implement [`AsValue`](crate::AsValue) and `Clone`; the struct
/// gets `Default` derived and [`Record`](crate::Record) plus
/// [`FromRow`](crate::FromRow) implemented.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $( $(#[$field_meta])* $field_vis $field: $ty, )+
        }

        impl $crate::Record for $name {
            fn record_name() -> &'static str {
                stringify!($name)
            }
            fn fields() -> &'static [$crate::FieldDef] {
                static FIELDS: ::std::sync::LazyLock<Box<[$crate::FieldDef]>> =
                    ::std::sync::LazyLock::new(|| {
                        Box::new([
                            $( $crate::FieldDef::of::<$ty>(stringify!($field)), )+
                        ])
                    });
                &FIELDS
            }
            fn set(&mut self, index: usize, value: $crate::Value) -> $crate::Result<()> {
                let mut current = 0usize;
                $(
                    if index == current {
                        self.$field = $crate::AsValue::try_from_value(value)?;
                        return Ok(());
                    }
                    current += 1;
                )+
                let _ = current;
                Err($crate::Error::msg(format!(
                    "Record `{}` has no field at index {index}",
                    stringify!($name),
                )))
            }
            fn row(&self, encoding: $crate::EnumEncoding) -> $crate::Row {
                Box::new([
                    $( $crate::AsValue::encode(::std::clone::Clone::clone(&self.$field), encoding), )+
                ])
            }
        }

        impl $crate::FromRow for $name {
            fn shape_name() -> &'static str {
                <$name as $crate::Record>::record_name()
            }
            fn validate(columns: &[$crate::CursorColumn]) -> $crate::Result<()> {
                $crate::record_validate::<$name>(columns)
            }
            fn plan(columns: &[$crate::CursorColumn]) -> $crate::Result<$crate::RowPlan> {
                $crate::record_plan::<$name>(columns)
            }
            fn from_row(plan: &$crate::RowPlan, row: $crate::RowLabeled) -> $crate::Result<Self> {
                $crate::record_from_row::<$name>(plan, row)
            }
        }
    };
}
