//! Parse context: the state of one parse session over one document.
//!
//! The context owns the instance cache, the table cache, the lazily built
//! ID index and the diagnostics collected so far. Identity is scoped to a
//! context: two contexts over the same document never share instances.
//!
//! Instances link to each other weakly and are owned by the context's
//! cache. [`ParseContext::into_graph`] hands that ownership to a [`Graph`]
//! that no longer borrows the document.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use roxmltree::{Document, Node};

use crate::config::INSTANCE_TAG;
use crate::error::{ReaderError, Result};
use crate::factory::GraphBuilder;
use crate::instance::Instance;
use crate::locator::{self, IdIndex};
use crate::table::{MaterializedTable, TableCache};

/// A recoverable annotation problem. Parsing continues after each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An IDREF names no INSTANCE in the document. The entry is omitted.
    DanglingReference { role: String, target: String },
    /// More than one role region matched; the first was used.
    AmbiguousRole {
        tag: String,
        role: String,
        count: usize,
    },
    /// A COLUMN names no FIELD. The value is `Undefined`.
    MissingColumn { column: String },
    /// The FIELD exists but the decoded table has no column for it.
    UnresolvedColumn { column: String, table: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DanglingReference { role, target } => {
                write!(f, "Reference '{role}' points to unknown instance '{target}'")
            }
            Diagnostic::AmbiguousRole { tag, role, count } => {
                write!(f, "{count} <{tag}> elements with role '{role}', using the first")
            }
            Diagnostic::MissingColumn { column } => {
                write!(f, "COLUMN references unknown FIELD '{column}'")
            }
            Diagnostic::UnresolvedColumn { column, table } => {
                write!(f, "Table '{table}' has no column for FIELD '{column}'")
            }
        }
    }
}

/// Instances built in a context, in build order.
///
/// The cache owns every instance it holds, identified or not. Lookups by
/// stable id see the first instance registered under that id. Dropping the
/// cache frees the whole graph, reference cycles included.
#[derive(Debug, Default)]
pub struct InstanceCache {
    instances: Vec<Rc<Instance>>,
    by_id: HashMap<String, usize>,
}

impl InstanceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Rc<Instance>> {
        self.by_id
            .get(id)
            .and_then(|index| self.instances.get(*index))
            .cloned()
    }

    /// Take a share of `instance`.
    pub fn register(&mut self, instance: &Rc<Instance>) {
        let index = self.instances.len();
        if let Some(id) = instance.id() {
            self.by_id.entry(id.to_string()).or_insert(index);
        }
        self.instances.push(Rc::clone(instance));
    }

    /// Release every instance registered at position `mark` or later.
    pub fn truncate(&mut self, mark: usize) {
        if mark >= self.instances.len() {
            return;
        }
        self.by_id.retain(|_, index| *index < mark);
        self.instances.truncate(mark);
    }

    /// Instances in build order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Instance>> {
        self.instances.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// The instances of a finished parse session.
///
/// Owns every instance built in the session, so links between them stay
/// valid for as long as the graph lives. The document is no longer needed.
#[derive(Debug)]
pub struct Graph {
    roots: Vec<Rc<Instance>>,
    instances: InstanceCache,
    diagnostics: Vec<Diagnostic>,
}

impl Graph {
    /// The instances that were asked for, in document order.
    #[must_use]
    pub fn roots(&self) -> &[Rc<Instance>] {
        &self.roots
    }

    /// Any instance of the graph by stable id.
    #[must_use]
    pub fn instance_by_id(&self, id: &str) -> Option<Rc<Instance>> {
        self.instances.get(id)
    }

    /// Every instance of the graph, in build order.
    #[must_use]
    pub fn instances(&self) -> &InstanceCache {
        &self.instances
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// State of one parse session.
///
/// Created with [`GraphBuilder::context`]. Not shareable between threads;
/// run one context per thread.
pub struct ParseContext<'a, 'input> {
    builder: &'a GraphBuilder,
    document: &'a Document<'input>,
    instances: InstanceCache,
    tables: TableCache,
    ids: Option<IdIndex<'a, 'input>>,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl<'a, 'input> ParseContext<'a, 'input> {
    pub(crate) fn new(builder: &'a GraphBuilder, document: &'a Document<'input>) -> Self {
        Self {
            builder,
            document,
            instances: InstanceCache::new(),
            tables: TableCache::new(),
            ids: None,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn builder(&self) -> &'a GraphBuilder {
        self.builder
    }

    #[must_use]
    pub fn document(&self) -> &'a Document<'input> {
        self.document
    }

    /// Build every INSTANCE in the document that declares `type_id`.
    ///
    /// Results are in document order. Instances already built in this
    /// context (by id) are returned again, not rebuilt.
    ///
    /// # Errors
    /// Fails on the first fatal error; see [`ReaderError`].
    pub fn find_instances(&mut self, type_id: &str) -> Result<Vec<Rc<Instance>>> {
        let regions = locator::find_instances_of_type(self.document.root_element(), type_id);
        tracing::debug!(type_id, count = regions.len(), "Found instance regions");
        regions.into_iter().map(|region| self.build(region)).collect()
    }

    /// Build the instance for an INSTANCE region.
    ///
    /// # Errors
    /// See [`GraphBuilder`] for the failure modes.
    pub fn build(&mut self, region: Node<'a, 'input>) -> Result<Rc<Instance>> {
        let builder = self.builder;
        builder.build(self, region)
    }

    /// Instance already built in this context under `id`.
    #[must_use]
    pub fn instance_by_id(&self, id: &str) -> Option<Rc<Instance>> {
        self.instances.get(id)
    }

    pub(crate) fn register_instance(&mut self, instance: &Rc<Instance>) {
        self.instances.register(instance);
    }

    /// Position the next registered instance will take.
    pub(crate) fn instance_mark(&self) -> usize {
        self.instances.len()
    }

    /// Drop the instances registered since `mark`.
    pub(crate) fn rollback_instances(&mut self, mark: usize) {
        let dropped = self.instances.len().saturating_sub(mark);
        if dropped > 0 {
            tracing::debug!(dropped, "Rolling back partially built instances");
        }
        self.instances.truncate(mark);
    }

    #[must_use]
    pub fn instances(&self) -> &InstanceCache {
        &self.instances
    }

    /// Cached table by id.
    #[must_use]
    pub fn table(&self, id: &str) -> Option<Rc<MaterializedTable>> {
        self.tables.get(id)
    }

    /// Store a table in this context.
    pub fn put_table(&mut self, table: Rc<MaterializedTable>) {
        self.tables.put(table);
    }

    #[must_use]
    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    /// Cached table for a TABLE element, decoded with the builder's decoder
    /// on first use.
    ///
    /// # Errors
    /// Propagates decoder failures.
    pub fn materialize_table(&mut self, table: Node<'_, '_>) -> Result<Rc<MaterializedTable>> {
        self.tables.materialize(table, self.builder.decoder())
    }

    fn id_index(&mut self) -> &IdIndex<'a, 'input> {
        let root = self.document.root_element();
        self.ids.get_or_insert_with(|| IdIndex::build(root))
    }

    /// INSTANCE element with the given `ID`.
    pub fn find_instance_region(&mut self, id: &str) -> Option<Node<'a, 'input>> {
        self.id_index().get(INSTANCE_TAG, id)
    }

    /// FIELD element with the given `ID`.
    pub fn find_field(&mut self, id: &str) -> Option<Node<'a, 'input>> {
        self.id_index().get("FIELD", id)
    }

    /// The role region of `parent` with tag `tag` for `role`.
    ///
    /// Only direct children are searched. Several matches are reported as
    /// [`Diagnostic::AmbiguousRole`] and the first is returned.
    pub fn find_role_region(
        &mut self,
        parent: Node<'a, 'input>,
        tag: &str,
        role: &str,
    ) -> Option<Node<'a, 'input>> {
        let regions = locator::find_role_regions(parent, tag, role);
        if regions.len() > 1 {
            self.report(Diagnostic::AmbiguousRole {
                tag: tag.to_string(),
                role: role.to_string(),
                count: regions.len(),
            });
        }
        regions.into_iter().next()
    }

    /// Log and record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DanglingReference { role, target } => {
                tracing::warn!(role = %role, id = %target, "Dangling reference, entry omitted");
            }
            Diagnostic::AmbiguousRole { tag, role, count } => {
                tracing::warn!(tag = %tag, role = %role, count, "Ambiguous role, using the first match");
            }
            Diagnostic::MissingColumn { column } => {
                tracing::warn!(column = %column, "COLUMN references unknown FIELD");
            }
            Diagnostic::UnresolvedColumn { column, table } => {
                tracing::warn!(column = %column, table = %table, "Table has no column for FIELD");
            }
        }
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the recorded diagnostics, leaving none behind.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// End the session, keeping the built instances.
    ///
    /// `roots` are usually the result of [`ParseContext::find_instances`].
    #[must_use]
    pub fn into_graph(self, roots: Vec<Rc<Instance>>) -> Graph {
        Graph {
            roots,
            instances: self.instances,
            diagnostics: self.diagnostics,
        }
    }

    pub(crate) fn enter(&mut self, type_id: &str) -> Result<()> {
        let max = self.builder.options().max_depth;
        if self.depth >= max {
            return Err(ReaderError::DepthExceeded {
                max,
                type_id: type_id.to_string(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl fmt::Debug for ParseContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("instances", &self.instances.len())
            .field("tables", &self.tables.len())
            .field("diagnostics", &self.diagnostics)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
