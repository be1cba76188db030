use crate::{
    AsValue, CursorColumn, NullViolation, Record, Result, RowLabeled, ShapeError, Value, ordinal,
};
use anyhow::Context;
use std::{
    any::{self, TypeId},
    collections::HashMap,
    mem::{self, Discriminant},
    sync::{Arc, LazyLock, RwLock},
};

/// A compiled row conversion: the per-column decisions (target field, null
/// policy) resolved once per distinct (shape, columns) pair. Immutable after
/// publication, shared by every execution with the same key.
#[derive(Debug)]
pub struct RowPlan {
    slots: Box<[Slot]>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    field: usize,
    nullable: bool,
}

/// Whether any typed fetch path exists for the declared column type.
fn has_fetch_path(ty: &Value) -> bool {
    !matches!(ty, Value::List(..))
}

/// Diagnostic label of a column: its name, or its ordinal when unnamed.
pub(crate) fn column_label(columns: &[CursorColumn], index: usize) -> String {
    let name = &columns[index].name;
    if name.is_empty() {
        format!("{} column", ordinal(index))
    } else {
        name.clone()
    }
}

/// A materialization target: either a named shape ([`Record`]) or a
/// positional tuple of arity 1 to 7.
///
/// `validate` runs the full shape/column reasoning (column count or name
/// mapping, type compatibility, fetch path existence); `plan` compiles the
/// conversion; `from_row` applies it to one row, performing exactly one null
/// check and at most one conversion per column.
pub trait FromRow: Sized + Send + 'static {
    fn shape_name() -> &'static str {
        any::type_name::<Self>()
    }
    fn validate(columns: &[CursorColumn]) -> Result<()>;
    fn plan(columns: &[CursorColumn]) -> Result<RowPlan>;
    fn from_row(plan: &RowPlan, row: RowLabeled) -> Result<Self>;
}

/// Shape/column validation for a named shape, invoked by the `FromRow` impl
/// the [`record!`](crate::record) macro generates.
pub fn record_validate<T: Record>(columns: &[CursorColumn]) -> Result<()> {
    let shape = T::record_name();
    if columns.is_empty() {
        return Err(ShapeError::NoColumns { shape }.into());
    }
    let fields = T::fields();
    for (i, column) in columns.iter().enumerate() {
        if column.name.is_empty() {
            return Err(ShapeError::Unnamed {
                shape,
                column: format!("{} column", ordinal(i)),
            }
            .into());
        }
        let Some(field) = fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(&column.name))
        else {
            return Err(ShapeError::UnmappedColumn {
                shape,
                column: column.name.clone(),
            }
            .into());
        };
        if !has_fetch_path(&column.ty) {
            return Err(ShapeError::Unsupported {
                column: column_label(columns, i),
                column_type: column.ty.type_name(),
            }
            .into());
        }
        let field = &fields[field];
        if !matches!(column.ty, Value::Null) && !(field.accepts)(&column.ty) {
            return Err(ShapeError::Incompatible {
                shape,
                column: column_label(columns, i),
                column_type: column.ty.type_name(),
                field: field.name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Plan compilation for a named shape: one slot per column mapping onto the
/// field of the same (case-insensitive) name.
pub fn record_plan<T: Record>(columns: &[CursorColumn]) -> Result<RowPlan> {
    record_validate::<T>(columns)?;
    let fields = T::fields();
    let slots = columns
        .iter()
        .map(|column| {
            let field = fields
                .iter()
                .position(|f| f.name.eq_ignore_ascii_case(&column.name))
                .expect("Validated to map onto a field");
            Slot {
                field,
                nullable: fields[field].nullable,
            }
        })
        .collect();
    Ok(RowPlan { slots })
}

/// Row application for a named shape: exactly one null check and at most one
/// conversion per column, assigned onto a default-constructed instance.
pub fn record_from_row<T: Record>(plan: &RowPlan, row: RowLabeled) -> Result<T> {
    let RowLabeled {
        columns,
        mut values,
    } = row;
    let mut out = T::default();
    for (i, slot) in plan.slots.iter().enumerate() {
        let value = mem::take(&mut values[i]);
        if value.is_null() {
            if !slot.nullable {
                return Err(NullViolation {
                    column: column_label(&columns, i),
                    shape: T::record_name(),
                }
                .into());
            }
            // Nullable fields keep their default, which is None.
            continue;
        }
        out.set(slot.field, value).with_context(|| {
            format!(
                "Cannot convert column `{}` for shape `{}`",
                column_label(&columns, i),
                T::record_name(),
            )
        })?;
    }
    Ok(out)
}

macro_rules! impl_from_row_tuple {
    ($($t:ident),+) => {
        impl<$($t),+> FromRow for ($($t,)+)
        where
            $($t: AsValue + Send + 'static,)+
        {
            fn validate(columns: &[CursorColumn]) -> Result<()> {
                let shape = Self::shape_name();
                if columns.is_empty() {
                    return Err(ShapeError::NoColumns { shape }.into());
                }
                let arity = 0usize $(+ {
                    let _ = stringify!($t);
                    1
                })+;
                if columns.len() != arity {
                    return Err(ShapeError::ColumnCount {
                        shape,
                        arity,
                        columns: columns.len(),
                    }
                    .into());
                }
                let mut index = 0usize;
                $(
                    let column = &columns[index];
                    if !has_fetch_path(&column.ty) {
                        return Err(ShapeError::Unsupported {
                            column: column_label(columns, index),
                            column_type: column.ty.type_name(),
                        }
                        .into());
                    }
                    if !matches!(column.ty, Value::Null) && !<$t as AsValue>::accepts(&column.ty) {
                        return Err(ShapeError::Incompatible {
                            shape,
                            column: column_label(columns, index),
                            column_type: column.ty.type_name(),
                            field: format!("{} field", ordinal(index)),
                        }
                        .into());
                    }
                    index += 1;
                )+
                let _ = index;
                Ok(())
            }

            fn plan(columns: &[CursorColumn]) -> Result<RowPlan> {
                Self::validate(columns)?;
                let nullables = [$(<$t as AsValue>::nullable()),+];
                let slots = nullables
                    .iter()
                    .enumerate()
                    .map(|(field, nullable)| Slot {
                        field,
                        nullable: *nullable,
                    })
                    .collect();
                Ok(RowPlan { slots })
            }

            fn from_row(_plan: &RowPlan, row: RowLabeled) -> Result<Self> {
                let RowLabeled {
                    columns,
                    mut values,
                } = row;
                let mut index = 0usize;
                Ok(($(
                    {
                        let current = index;
                        index += 1;
                        let value = mem::take(&mut values[current]);
                        if value.is_null() && !<$t as AsValue>::nullable() {
                            return Err(NullViolation {
                                column: column_label(&columns, current),
                                shape: Self::shape_name(),
                            }
                            .into());
                        }
                        <$t as AsValue>::try_from_value(value).with_context(|| {
                            format!(
                                "Cannot convert column `{}` for shape `{}`",
                                column_label(&columns, current),
                                Self::shape_name(),
                            )
                        })?
                    },
                )+))
            }
        }
    };
}
impl_from_row_tuple!(A);
impl_from_row_tuple!(A, B);
impl_from_row_tuple!(A, B, C);
impl_from_row_tuple!(A, B, C, D);
impl_from_row_tuple!(A, B, C, D, E);
impl_from_row_tuple!(A, B, C, D, E, F);
impl_from_row_tuple!(A, B, C, D, E, F, G);

/// Cache key: target type identity plus the ordered column names and column
/// type kinds of one cursor. Structural equality decides hits.
#[derive(Debug, Hash, PartialEq, Eq)]
struct PlanKey {
    shape: TypeId,
    columns: Box<[(Box<str>, Discriminant<Value>)]>,
}

impl PlanKey {
    fn new<T: 'static>(columns: &[CursorColumn]) -> Self {
        Self {
            shape: TypeId::of::<T>(),
            columns: columns
                .iter()
                .map(|c| (c.name.as_str().into(), mem::discriminant(&c.ty)))
                .collect(),
        }
    }
}

static PLANS: LazyLock<RwLock<HashMap<PlanKey, Arc<RowPlan>>>> = LazyLock::new(Default::default);

/// Lookup-or-compile the row plan for shape `T` over the given cursor
/// columns.
///
/// Validation always runs first, against the actual columns, so shape
/// mismatches are never masked by (or recorded into) the cache. The cache
/// itself is append-only with get-or-insert semantics: concurrent duplicate
/// compilations are tolerated, the first published plan wins and every
/// caller observes a fully built, immutable one.
pub fn materializer<T: FromRow>(columns: &[CursorColumn]) -> Result<Arc<RowPlan>> {
    T::validate(columns)?;
    let key = PlanKey::new::<T>(columns);
    if let Some(plan) = PLANS.read().expect("Plan cache lock poisoned").get(&key) {
        return Ok(plan.clone());
    }
    let plan = Arc::new(T::plan(columns)?);
    let mut cache = PLANS.write().expect("Plan cache lock poisoned");
    Ok(cache.entry(key).or_insert(plan).clone())
}
