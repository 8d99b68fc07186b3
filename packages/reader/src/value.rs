//! Field values produced by the resolvers.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::instance::Instance;
use crate::table::MaterializedTable;

/// A primitive value decoded from a LITERAL or a table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Scalar {
    /// Numeric view of the scalar, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Real(v) => Some(*v),
            Scalar::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Real(v) => write!(f, "{v}"),
            Scalar::Integer(v) => write!(f, "{v}"),
            Scalar::Boolean(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A coerced LITERAL: the value, its declared value type and its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value_type: String,
    pub value: Scalar,
    pub unit: Option<String>,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {unit}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// One column of a materialized table, annotated with the name and unit of
/// its FIELD definition.
///
/// Columns borrow their data from the shared table: two columns of the same
/// TABLE point at the same [`MaterializedTable`].
#[derive(Debug, Clone)]
pub struct TableColumn {
    table: Rc<MaterializedTable>,
    index: usize,
    pub name: String,
    pub unit: Option<String>,
}

impl TableColumn {
    /// Create a view of column `index` of `table`.
    #[must_use]
    pub fn new(table: Rc<MaterializedTable>, index: usize, name: impl Into<String>) -> Self {
        Self {
            table,
            index,
            name: name.into(),
            unit: None,
        }
    }

    /// Set the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: Option<&str>) -> Self {
        self.unit = unit.map(str::to_string);
        self
    }

    /// The table this column belongs to.
    #[must_use]
    pub fn table(&self) -> &Rc<MaterializedTable> {
        &self.table
    }

    /// Column position in the table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell values; `None` marks an empty cell.
    #[must_use]
    pub fn values(&self) -> &[Option<Scalar>] {
        self.table
            .column(self.index)
            .map(|c| c.values.as_slice())
            .unwrap_or_default()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

/// An opaque value produced by a custom [`ValueCoercion`] or by an
/// instance adapter registered on the [`GraphBuilder`].
///
/// The reader stores and hands these out without looking inside; callers
/// get their own type back with [`DomainValue::downcast_ref`].
///
/// [`ValueCoercion`]: crate::coercion::ValueCoercion
/// [`GraphBuilder`]: crate::factory::GraphBuilder
#[derive(Clone)]
pub struct DomainValue {
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl DomainValue {
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Rc::new(value),
        }
    }

    /// The wrapped value, if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        (*self.value).is::<T>()
    }

    /// Rust type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainValue").field(&self.type_name).finish()
    }
}

/// The value assigned to one field of an [`Instance`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Nothing found for a single-valued field.
    Absent,
    Literal(Literal),
    Column(TableColumn),
    /// Link to another instance of the same graph.
    ///
    /// Links are weak: the parse context (or the [`Graph`] taken from it)
    /// owns the instances, so reference cycles do not keep a graph alive.
    ///
    /// [`Graph`]: crate::context::Graph
    Instance(Weak<Instance>),
    /// Result of a custom coercion.
    Domain(DomainValue),
    /// Zero, or more than one, value; or any result of a multi-valued field.
    Sequence(Vec<Value>),
    /// Placeholder for a COLUMN whose FIELD could not be found.
    Undefined,
}

impl Value {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_column(&self) -> Option<&TableColumn> {
        match self {
            Value::Column(column) => Some(column),
            _ => None,
        }
    }

    /// Link an instance.
    #[must_use]
    pub fn instance(instance: &Rc<Instance>) -> Self {
        Value::Instance(Rc::downgrade(instance))
    }

    /// The linked instance.
    ///
    /// `None` for other values, and for links whose graph has been dropped.
    #[must_use]
    pub fn as_instance(&self) -> Option<Rc<Instance>> {
        match self {
            Value::Instance(instance) => instance.upgrade(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_domain(&self) -> Option<&DomainValue> {
        match self {
            Value::Domain(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// Number of values this field holds: 0 for `Absent`, the length of a
    /// sequence, 1 otherwise.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Value::Absent => 0,
            Value::Sequence(values) => values.len(),
            _ => 1,
        }
    }
}
