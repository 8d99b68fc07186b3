//! YAML type catalogs.
//!
//! A catalog declares model types and the value types of their literals:
//!
//! ```yaml
//! types:
//!   - id: meas:CoordMeasure
//!     fields:
//!       - { role: meas:CoordMeasure.coordFrame, kind: reference }
//!       - { role: meas:CoordMeasure.coord, kind: attribute }
//!   - id: meas:SkyPosition
//!     extends: [meas:CoordMeasure]
//! value_types:
//!   coords:domain.space.StdRefFrame: string
//! ```
//!
//! `min` defaults to 0. `max` is `1` or `unbounded` (also `*` or `-1`) and
//! defaults to `unbounded` for `attribute_list`, `1` otherwise.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::core::TypeRegistry;
use super::types::{FieldDescriptor, FieldKind, MaxOccurs, TypeDescriptor};
use crate::coercion::{ScalarKind, StandardCoercion};
use crate::error::{ReaderError, Result};

/// Catalogs compiled into the binary.
const BUNDLED_CATALOGS: &[(&str, &str)] = &[
    ("ivoa", include_str!("../../catalogs/ivoa.yaml")),
    ("coords", include_str!("../../catalogs/coords.yaml")),
    ("meas", include_str!("../../catalogs/meas.yaml")),
];

/// A parsed catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub types: Vec<TypeEntry>,

    /// Value type id to primitive kind (`real`, `integer`, `boolean`, `string`).
    #[serde(default)]
    pub value_types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeEntry {
    pub id: String,

    #[serde(default)]
    pub extends: Vec<String>,

    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub role: String,
    pub kind: String,

    #[serde(default)]
    pub min: u32,

    #[serde(default)]
    pub max: Option<MaxEntry>,
}

/// Upper bound as written in YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaxEntry {
    Count(i64),
    Word(String),
}

impl FieldEntry {
    fn to_descriptor(&self, type_id: &str) -> Result<FieldDescriptor> {
        let kind = FieldKind::from_name(&self.kind).ok_or_else(|| {
            ReaderError::Catalog(format!(
                "{type_id}: field '{}' has unknown kind '{}'",
                self.role, self.kind
            ))
        })?;

        let mut field = FieldDescriptor::new(self.role.clone(), kind).with_min(self.min);
        if let Some(max) = &self.max {
            field = field.with_max(parse_max(max).ok_or_else(|| {
                ReaderError::Catalog(format!(
                    "{type_id}: field '{}' has invalid max {max:?}",
                    self.role
                ))
            })?);
        }
        Ok(field)
    }
}

fn parse_max(max: &MaxEntry) -> Option<MaxOccurs> {
    match max {
        MaxEntry::Count(1) => Some(MaxOccurs::One),
        MaxEntry::Count(-1) => Some(MaxOccurs::Unbounded),
        MaxEntry::Count(n) if *n > 1 => Some(MaxOccurs::Unbounded),
        MaxEntry::Count(_) => None,
        MaxEntry::Word(word) => match word.as_str() {
            "unbounded" | "*" => Some(MaxOccurs::Unbounded),
            "1" | "one" => Some(MaxOccurs::One),
            _ => None,
        },
    }
}

impl Catalog {
    /// Parse a catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a catalog file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml).map_err(|e| match e {
            ReaderError::Yaml(inner) => {
                ReaderError::Catalog(format!("{}: {inner}", path.display()))
            }
            other => other,
        })
    }

    /// The catalogs shipped with the crate (`ivoa`, `coords`, `meas`).
    pub fn bundled() -> Result<Vec<Self>> {
        BUNDLED_CATALOGS
            .iter()
            .map(|(name, yaml)| {
                let mut catalog = Self::from_yaml(yaml)?;
                catalog.name.get_or_insert_with(|| (*name).to_string());
                Ok(catalog)
            })
            .collect()
    }

    /// Convert the type entries to descriptors.
    pub fn descriptors(&self) -> Result<Vec<TypeDescriptor>> {
        self.types
            .iter()
            .map(|entry| {
                let mut descriptor = TypeDescriptor::new(entry.id.clone());
                descriptor.extends.clone_from(&entry.extends);
                for field in &entry.fields {
                    descriptor = descriptor.field(field.to_descriptor(&entry.id)?);
                }
                Ok(descriptor)
            })
            .collect()
    }

    /// Register every type of this catalog. Returns the number registered.
    pub fn register_types(&self, registry: &mut TypeRegistry) -> Result<usize> {
        let descriptors = self.descriptors()?;
        let count = descriptors.len();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        Ok(count)
    }

    /// Register the value types of this catalog with a coercion.
    pub fn register_value_types(&self, coercion: &mut StandardCoercion) -> Result<usize> {
        for (value_type, kind_name) in &self.value_types {
            let kind = ScalarKind::from_name(kind_name).ok_or_else(|| {
                ReaderError::Catalog(format!(
                    "value type '{value_type}' has unknown kind '{kind_name}'"
                ))
            })?;
            coercion.register(value_type.clone(), kind);
        }
        Ok(self.value_types.len())
    }
}

/// Load catalogs into a fresh registry and coercion.
///
/// The registry and coercion start empty apart from the ivoa primitives;
/// catalogs later in the list replace earlier declarations of the same id.
pub fn load_catalogs(catalogs: &[Catalog]) -> Result<(TypeRegistry, StandardCoercion)> {
    let mut registry = TypeRegistry::new();
    let mut coercion = StandardCoercion::new();

    for catalog in catalogs {
        let types = catalog.register_types(&mut registry)?;
        let value_types = catalog.register_value_types(&mut coercion)?;
        tracing::debug!(
            catalog = catalog.name.as_deref().unwrap_or("<unnamed>"),
            types,
            value_types,
            "Loaded catalog"
        );
    }

    Ok((registry, coercion))
}

/// Create a registry and coercion from the bundled catalogs.
pub fn create_standard_registry() -> Result<(TypeRegistry, StandardCoercion)> {
    load_catalogs(&Catalog::bundled()?)
}
