//! Model type registry.
//!
//! Maps model type ids (`meas:SkyPosition`) to descriptors that list the
//! fields the reader has to resolve. Types are registered in code or loaded
//! from YAML catalogs; a set of catalogs for the ivoa, coords and meas
//! models is bundled with the crate.

mod catalog;
mod core;
mod types;

pub use catalog::{create_standard_registry, load_catalogs, Catalog, FieldEntry, MaxEntry, TypeEntry};
pub use core::TypeRegistry;
pub use types::{FieldDescriptor, FieldKind, MaxOccurs, TypeDescriptor};
