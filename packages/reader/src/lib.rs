//! rama reader - Build typed object graphs from VO-DML annotated VOTables.
//!
//! A VOTable can carry a mapping block that annotates its content with
//! instances of astronomy data models (coordinates, measurements, ...).
//! This crate reads that block and materializes the annotated instances as
//! an in-memory graph: shared instances stay shared, reference cycles are
//! preserved and table columns are decoded once per parse. The graph owns
//! its instances; dropping it frees them, cycles included.
//!
//! # Example
//!
//! ```
//! use rama_reader::{create_standard_registry, GraphBuilder};
//!
//! let xml = r#"<VOTABLE><VODML><GLOBALS>
//!   <INSTANCE dmtype="coords:domain.space.SpaceFrame" ID="_icrs">
//!     <ATTRIBUTE dmrole="coords:domain.space.SpaceFrame.spaceRefFrame">
//!       <LITERAL value="ICRS" dmtype="coords:domain.space.StdRefFrame"/>
//!     </ATTRIBUTE>
//!   </INSTANCE>
//! </GLOBALS></VODML></VOTABLE>"#;
//!
//! let (registry, coercion) = create_standard_registry().unwrap();
//! let builder = GraphBuilder::new(registry).with_coercion(coercion);
//! let graph = builder
//!     .read_str(xml, "coords:domain.space.SpaceFrame")
//!     .unwrap();
//!
//! let frame = graph.roots()[0]
//!     .literal("coords:domain.space.SpaceFrame.spaceRefFrame")
//!     .unwrap();
//! assert_eq!(frame.value.as_str(), Some("ICRS"));
//! assert!(graph.diagnostics().is_empty());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Limits and per-session options
//! - [`error`]: Error types and Result alias
//! - [`registry`]: Model type descriptors and YAML catalogs
//! - [`coercion`]: LITERAL and column value conversion
//! - [`table`]: TABLE decoding and the per-context table cache
//! - [`locator`]: Navigation of the annotation tree
//! - [`context`]: Parse sessions, identity cache, diagnostics and graphs
//! - [`factory`]: Instance construction
//! - [`instance`]: Materialized instances
//! - [`value`]: Field values
//! - [`xml`]: XML utilities
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod coercion;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod instance;
pub mod locator;
pub mod registry;
mod resolvers;
pub mod table;
pub mod value;
pub mod xml;

// Re-export commonly used items
pub use coercion::{ScalarKind, StandardCoercion, ValueCoercion};
pub use config::ReaderOptions;
pub use context::{Diagnostic, Graph, ParseContext};
pub use error::{ReaderError, Result};
pub use factory::{GraphBuilder, InstanceAdapter};
pub use instance::Instance;
pub use registry::{
    create_standard_registry, Catalog, FieldDescriptor, FieldKind, MaxOccurs, TypeDescriptor,
    TypeRegistry,
};
pub use table::{MaterializedTable, TableDecoder, VoTableDecoder};
pub use value::{DomainValue, Literal, Scalar, TableColumn, Value};
