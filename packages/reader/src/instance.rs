//! Materialized model instances.

use std::any::Any;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::registry::FieldDescriptor;
use crate::value::{DomainValue, Literal, TableColumn, Value};

/// One model instance built from an INSTANCE region.
///
/// Instances are shared through `Rc`: every reference to the same stable id
/// within a parse context yields the same allocation, so identity can be
/// checked with [`Instance::same`]. Each field is assigned exactly once,
/// after the instance has been registered; a reference cycle therefore sees
/// the instance while some of its fields are still empty.
///
/// Links to other instances are weak. Keep the parse context or its
/// [`Graph`](crate::context::Graph) alive while following them.
pub struct Instance {
    type_id: String,
    id: Option<String>,
    fields: Arc<[FieldDescriptor]>,
    values: Vec<OnceCell<Value>>,
    adapted: OnceCell<DomainValue>,
}

impl Instance {
    pub(crate) fn new(
        type_id: impl Into<String>,
        id: Option<String>,
        fields: impl Into<Arc<[FieldDescriptor]>>,
    ) -> Self {
        let fields = fields.into();
        let values = fields.iter().map(|_| OnceCell::new()).collect();
        Self {
            type_id: type_id.into(),
            id,
            fields,
            values,
            adapted: OnceCell::new(),
        }
    }

    /// Model type id this instance was built as.
    #[must_use]
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Stable id from the INSTANCE `ID` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Value of a field by role id.
    ///
    /// `None` if the type has no such role or the field is not assigned yet.
    #[must_use]
    pub fn get(&self, role: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|field| field.role == role)
            .and_then(|index| self.values.get(index))
            .and_then(OnceCell::get)
    }

    /// Instance linked under `role`.
    #[must_use]
    pub fn instance(&self, role: &str) -> Option<Rc<Instance>> {
        self.get(role).and_then(Value::as_instance)
    }

    #[must_use]
    pub fn literal(&self, role: &str) -> Option<&Literal> {
        self.get(role).and_then(Value::as_literal)
    }

    #[must_use]
    pub fn column(&self, role: &str) -> Option<&TableColumn> {
        self.get(role).and_then(Value::as_column)
    }

    /// Fields in declaration order (inherited first) with their values.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&Value>)> {
        self.fields
            .iter()
            .zip(self.values.iter().map(OnceCell::get))
    }

    /// Whether every field has been assigned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|value| value.get().is_some())
    }

    /// Result of the adapter registered for this instance's type.
    #[must_use]
    pub fn adapted(&self) -> Option<&DomainValue> {
        self.adapted.get()
    }

    /// Adapter result as a `T`.
    #[must_use]
    pub fn adapted_as<T: Any>(&self) -> Option<&T> {
        self.adapted().and_then(DomainValue::downcast_ref::<T>)
    }

    /// Identity comparison.
    #[must_use]
    pub fn same(a: &Rc<Instance>, b: &Rc<Instance>) -> bool {
        Rc::ptr_eq(a, b)
    }

    pub(crate) fn descriptor(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub(crate) fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Assign field `index`. Returns `false` if it was already assigned.
    pub(crate) fn assign(&self, index: usize, value: Value) -> bool {
        self.values
            .get(index)
            .is_some_and(|slot| slot.set(value).is_ok())
    }

    pub(crate) fn set_adapted(&self, value: DomainValue) -> bool {
        self.adapted.set(value).is_ok()
    }
}

// Nested instances are printed by type and id only; the graph may be cyclic.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assigned: Vec<&str> = self
            .fields()
            .filter(|(_, value)| value.is_some())
            .map(|(field, _)| field.role.as_str())
            .collect();
        f.debug_struct("Instance")
            .field("type_id", &self.type_id)
            .field("id", &self.id)
            .field("assigned", &assigned)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    fn frame() -> Instance {
        Instance::new(
            "coords:domain.space.SpaceFrame",
            Some("_frame".to_string()),
            vec![
                FieldDescriptor::attribute("coords:domain.space.SpaceFrame.spaceRefFrame"),
                FieldDescriptor::attribute("coords:domain.space.SpaceFrame.equinox"),
            ],
        )
    }

    fn text(value: &str) -> Value {
        Value::Literal(Literal {
            value_type: "ivoa:string".to_string(),
            value: Scalar::Text(value.to_string()),
            unit: None,
        })
    }

    #[test]
    fn test_fields_start_unassigned() {
        let instance = frame();
        assert!(!instance.is_complete());
        assert!(instance
            .get("coords:domain.space.SpaceFrame.spaceRefFrame")
            .is_none());
        assert_eq!(instance.fields().count(), 2);
    }

    #[test]
    fn test_assign_once() {
        let instance = frame();
        assert!(instance.assign(0, text("FK5")));
        assert!(!instance.assign(0, text("ICRS")));
        assert!(!instance.assign(7, text("x")));

        let literal = instance
            .literal("coords:domain.space.SpaceFrame.spaceRefFrame")
            .unwrap();
        assert_eq!(literal.value.as_str(), Some("FK5"));
    }

    #[test]
    fn test_complete_after_all_assigned() {
        let instance = frame();
        instance.assign(0, text("FK5"));
        instance.assign(1, Value::Absent);
        assert!(instance.is_complete());
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let instance = Rc::new(frame());
        let owner = Instance::new(
            "meas:SkyPosition",
            None,
            vec![FieldDescriptor::reference("meas:CoordMeasure.coordFrame")],
        );
        owner.assign(0, Value::instance(&instance));
        let rendered = format!("{owner:?}");
        assert!(rendered.contains("meas:SkyPosition"));
        assert!(!rendered.contains("SpaceFrame"));
    }

    #[test]
    fn test_adapted_set_once() {
        let instance = frame();
        assert!(instance.adapted().is_none());
        assert!(instance.set_adapted(DomainValue::new("fk5")));
        assert!(!instance.set_adapted(DomainValue::new("icrs")));
        assert_eq!(instance.adapted_as::<&str>(), Some(&"fk5"));
        assert!(instance.adapted_as::<String>().is_none());
    }

    #[test]
    fn test_same_is_identity() {
        let a = Rc::new(frame());
        let b = Rc::new(frame());
        assert!(Instance::same(&a, &Rc::clone(&a)));
        assert!(!Instance::same(&a, &b));
    }
}
