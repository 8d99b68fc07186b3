//! Per-context cache of materialized tables.

use std::collections::HashMap;
use std::rc::Rc;

use roxmltree::{Node, NodeId};

use super::decoder::{RawColumn, RawTable, TableDecoder};
use crate::error::Result;
use crate::xml::{get_attribute, preceding_sibling_count};

/// A decoded table, shared by every column that points into it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedTable {
    id: String,
    columns: Vec<RawColumn>,
}

impl MaterializedTable {
    #[must_use]
    pub fn new(id: impl Into<String>, raw: RawTable) -> Self {
        Self {
            id: id.into(),
            columns: raw.columns,
        }
    }

    /// Table id: the TABLE's `ID` attribute, or the id generated for it.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&RawColumn> {
        self.columns.get(index)
    }

    /// Position of the column defined by the FIELD with this ID.
    #[must_use]
    pub fn column_index(&self, field_id: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.id.as_deref() == Some(field_id))
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }
}

/// Tables decoded so far in one parse context.
///
/// A TABLE without an `ID` gets a synthetic one the first time it is
/// materialized; the assignment is remembered per node so later columns of
/// the same TABLE find the cached table.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<String, Rc<MaterializedTable>>,
    assigned_ids: HashMap<NodeId, String>,
    generated: usize,
}

impl TableCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached table by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Rc<MaterializedTable>> {
        self.tables.get(id).cloned()
    }

    /// Store a table under its id, replacing any previous one.
    pub fn put(&mut self, table: Rc<MaterializedTable>) {
        self.tables.insert(table.id().to_string(), table);
    }

    /// Id of a TABLE element: its `ID` attribute or a previously assigned one.
    #[must_use]
    pub fn table_id(&self, table: Node<'_, '_>) -> Option<String> {
        get_attribute(table, "ID")
            .map(str::to_string)
            .or_else(|| self.assigned_ids.get(&table.id()).cloned())
    }

    /// Return the cached table for a TABLE element, decoding it on first use.
    ///
    /// # Errors
    /// Propagates decoder failures.
    pub fn materialize(
        &mut self,
        table: Node<'_, '_>,
        decoder: &dyn TableDecoder,
    ) -> Result<Rc<MaterializedTable>> {
        let known_id = self.table_id(table);
        if let Some(cached) = known_id.as_deref().and_then(|id| self.get(id)) {
            tracing::trace!(table = %cached.id(), "Table cache hit");
            return Ok(cached);
        }

        let raw = decoder.decode(table)?;
        let id = match known_id {
            Some(id) => id,
            None => self.assign_id(table),
        };
        tracing::debug!(table = %id, columns = raw.columns.len(), "Materialized table");

        let materialized = Rc::new(MaterializedTable::new(id, raw));
        self.put(Rc::clone(&materialized));
        Ok(materialized)
    }

    fn assign_id(&mut self, table: Node<'_, '_>) -> String {
        let id = format!(
            "_GENERATED_ID_{}#{}",
            preceding_sibling_count(table),
            self.generated
        );
        self.generated += 1;
        self.assigned_ids.insert(table.id(), id.clone());
        id
    }

    /// Number of materialized tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
