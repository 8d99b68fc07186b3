//! Type registry mapping model type ids to descriptors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use super::types::{FieldDescriptor, TypeDescriptor};
use crate::error::{ReaderError, Result};

#[derive(Debug, Clone)]
struct RegisteredType {
    descriptor: Arc<TypeDescriptor>,
    /// Flattened field table, assembled on first use.
    fields: OnceLock<Arc<[FieldDescriptor]>>,
}

/// Registry mapping model type ids to type descriptors.
///
/// Populated once (by hand or from catalogs) and then read by any number of
/// parse sessions. Descriptors are shared behind `Arc` so a registry can be
/// used from several threads, each with its own parse context.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, RegisteredType>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a descriptor under its id. A previous descriptor with the
    /// same id is replaced.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        if self.types.contains_key(&descriptor.id) {
            tracing::trace!(type_id = %descriptor.id, "Replacing registered type");
        }
        // Any subtype may inherit from the new descriptor.
        for registered in self.types.values_mut() {
            registered.fields = OnceLock::new();
        }
        self.types.insert(
            descriptor.id.clone(),
            RegisteredType {
                descriptor: Arc::new(descriptor),
                fields: OnceLock::new(),
            },
        );
    }

    /// Look up a descriptor.
    ///
    /// # Errors
    /// Returns `UnknownType` if nothing is registered under `type_id`.
    pub fn resolve(&self, type_id: &str) -> Result<Arc<TypeDescriptor>> {
        self.types
            .get(type_id)
            .map(|registered| Arc::clone(&registered.descriptor))
            .ok_or_else(|| ReaderError::UnknownType(type_id.to_string()))
    }

    /// All fields of a type, inherited ones included.
    ///
    /// Supertype fields come first, in `extends` order. A role declared
    /// again further down the hierarchy replaces the inherited declaration
    /// at the inherited position.
    ///
    /// The table of a registered descriptor is assembled once and shared
    /// until the registry changes.
    ///
    /// # Errors
    /// Returns `UnknownType` if a supertype is not registered.
    pub fn fields_of(&self, descriptor: &TypeDescriptor) -> Result<Arc<[FieldDescriptor]>> {
        let registered = self
            .types
            .get(&descriptor.id)
            .filter(|registered| std::ptr::eq(registered.descriptor.as_ref(), descriptor));
        let Some(registered) = registered else {
            return Ok(self.flatten(descriptor)?.into());
        };

        if let Some(fields) = registered.fields.get() {
            return Ok(Arc::clone(fields));
        }
        let fields: Arc<[FieldDescriptor]> = self.flatten(descriptor)?.into();
        Ok(Arc::clone(registered.fields.get_or_init(|| fields)))
    }

    fn flatten(&self, descriptor: &TypeDescriptor) -> Result<Vec<FieldDescriptor>> {
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        self.collect_fields(descriptor, &mut fields, &mut visited)?;
        Ok(fields)
    }

    fn collect_fields(
        &self,
        descriptor: &TypeDescriptor,
        fields: &mut Vec<FieldDescriptor>,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(descriptor.id.clone()) {
            return Ok(());
        }

        for supertype in &descriptor.extends {
            let parent = self.resolve(supertype)?;
            self.collect_fields(&parent, fields, visited)?;
        }

        for field in &descriptor.fields {
            match fields.iter_mut().find(|f| f.role == field.role) {
                Some(existing) => *existing = field.clone(),
                None => fields.push(field.clone()),
            }
        }

        Ok(())
    }

    /// Check whether a type id is registered.
    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Registered type ids, sorted.
    #[must_use]
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.types.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Remove every registered type.
    pub fn clear(&mut self) {
        self.types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldKind, MaxOccurs};

    fn coordinate_types() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("coords:Coordinate")
                .field(FieldDescriptor::reference("coords:Coordinate.frame")),
        );
        registry.register(
            TypeDescriptor::new("coords:domain.space.EquatorialCoord")
                .extends("coords:Coordinate")
                .field(FieldDescriptor::attribute("coords:domain.space.EquatorialCoord.ra"))
                .field(FieldDescriptor::attribute("coords:domain.space.EquatorialCoord.dec")),
        );
        registry
    }

    #[test]
    fn test_registry_register_and_resolve() {
        let registry = coordinate_types();
        let descriptor = registry.resolve("coords:Coordinate").unwrap();
        assert_eq!(descriptor.id, "coords:Coordinate");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_resolve_unknown() {
        let registry = TypeRegistry::new();
        let err = registry.resolve("foo:bar").unwrap_err();
        assert!(matches!(err, ReaderError::UnknownType(id) if id == "foo:bar"));
    }

    #[test]
    fn test_registry_last_registration_wins() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("foo:bar"));
        registry.register(
            TypeDescriptor::new("foo:bar").field(FieldDescriptor::attribute("foo:bar.x")),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("foo:bar").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_registry_clear() {
        let mut registry = coordinate_types();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve("coords:Coordinate").is_err());
    }

    #[test]
    fn test_fields_of_includes_inherited_first() {
        let registry = coordinate_types();
        let descriptor = registry
            .resolve("coords:domain.space.EquatorialCoord")
            .unwrap();
        let roles: Vec<String> = registry
            .fields_of(&descriptor)
            .unwrap()
            .iter()
            .map(|f| f.role.clone())
            .collect();

        assert_eq!(
            roles,
            vec![
                "coords:Coordinate.frame",
                "coords:domain.space.EquatorialCoord.ra",
                "coords:domain.space.EquatorialCoord.dec",
            ]
        );
    }

    #[test]
    fn test_fields_of_subtype_override_keeps_position() {
        let mut registry = coordinate_types();
        registry.register(
            TypeDescriptor::new("test:Narrowed")
                .extends("coords:domain.space.EquatorialCoord")
                .field(FieldDescriptor::reference("coords:Coordinate.frame").with_min(1)),
        );
        let descriptor = registry.resolve("test:Narrowed").unwrap();
        let fields = registry.fields_of(&descriptor).unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].role, "coords:Coordinate.frame");
        assert_eq!(fields[0].min_occurs, 1);
        assert_eq!(fields[0].kind, FieldKind::Reference);
        assert_eq!(fields[0].max_occurs, MaxOccurs::One);
    }

    #[test]
    fn test_fields_of_is_assembled_once() {
        let registry = coordinate_types();
        let descriptor = registry
            .resolve("coords:domain.space.EquatorialCoord")
            .unwrap();
        let first = registry.fields_of(&descriptor).unwrap();
        let second = registry.fields_of(&descriptor).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_fields_of_sees_later_supertype_changes() {
        let mut registry = coordinate_types();
        let descriptor = registry
            .resolve("coords:domain.space.EquatorialCoord")
            .unwrap();
        assert_eq!(registry.fields_of(&descriptor).unwrap().len(), 3);

        registry.register(
            TypeDescriptor::new("coords:Coordinate")
                .field(FieldDescriptor::reference("coords:Coordinate.frame"))
                .field(FieldDescriptor::attribute("coords:Coordinate.epoch")),
        );
        let descriptor = registry
            .resolve("coords:domain.space.EquatorialCoord")
            .unwrap();
        assert_eq!(registry.fields_of(&descriptor).unwrap().len(), 4);
    }

    #[test]
    fn test_fields_of_unknown_supertype() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("a:B").extends("a:Missing"));
        let descriptor = registry.resolve("a:B").unwrap();
        assert!(matches!(
            registry.fields_of(&descriptor),
            Err(ReaderError::UnknownType(_))
        ));
    }

    #[test]
    fn test_fields_of_tolerates_inheritance_cycle() {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("a:A")
                .extends("a:B")
                .field(FieldDescriptor::attribute("a:A.x")),
        );
        registry.register(
            TypeDescriptor::new("a:B")
                .extends("a:A")
                .field(FieldDescriptor::attribute("a:B.y")),
        );
        let descriptor = registry.resolve("a:A").unwrap();
        let fields = registry.fields_of(&descriptor).unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_type_ids_sorted() {
        let registry = coordinate_types();
        assert_eq!(
            registry.type_ids(),
            vec!["coords:Coordinate", "coords:domain.space.EquatorialCoord"]
        );
    }
}
