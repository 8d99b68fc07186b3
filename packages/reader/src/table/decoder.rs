//! Decoding of VOTable TABLE elements into columns.

use roxmltree::Node;

use crate::error::{ReaderError, Result};
use crate::value::Scalar;
use crate::xml::{find_child, find_children, get_attribute, get_text, has_tag};

/// Serializations the inline decoder cannot read.
const UNSUPPORTED_SERIALIZATIONS: &[&str] = &["BINARY", "BINARY2", "FITS"];

/// One decoded column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    /// ID of the FIELD that defines the column.
    pub id: Option<String>,
    pub name: String,
    pub datatype: String,
    pub unit: Option<String>,
    /// Cell values; `None` marks an empty or unparsable cell.
    pub values: Vec<Option<Scalar>>,
}

/// A decoded TABLE: its columns in FIELD order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

/// Turns a TABLE element into columns.
///
/// The reader calls this at most once per TABLE per parse context.
pub trait TableDecoder {
    fn decode(&self, table: Node<'_, '_>) -> Result<RawTable>;
}

/// Decoder for inline TABLEDATA.
///
/// Cell types follow the FIELD `datatype`: `double`/`float` become reals,
/// the integer types integers, `boolean` booleans and everything else text.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoTableDecoder;

impl VoTableDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Real,
    Integer,
    Boolean,
    Text,
}

impl CellKind {
    fn from_datatype(datatype: &str) -> Self {
        match datatype {
            "double" | "float" => CellKind::Real,
            "short" | "int" | "long" | "unsignedByte" => CellKind::Integer,
            "boolean" => CellKind::Boolean,
            _ => CellKind::Text,
        }
    }

    fn parse(self, raw: &str) -> Option<Scalar> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self {
            CellKind::Real => trimmed.parse().ok().map(Scalar::Real),
            CellKind::Integer => trimmed.parse().ok().map(Scalar::Integer),
            CellKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => Some(Scalar::Boolean(true)),
                "f" | "false" | "0" => Some(Scalar::Boolean(false)),
                _ => None,
            },
            CellKind::Text => Some(Scalar::Text(raw.to_string())),
        }
    }
}

/// Label used in errors and logs: the table ID, its name, or `<TABLE>`.
pub(crate) fn table_label(table: Node<'_, '_>) -> String {
    get_attribute(table, "ID")
        .or_else(|| get_attribute(table, "name"))
        .unwrap_or("<TABLE>")
        .to_string()
}

impl TableDecoder for VoTableDecoder {
    fn decode(&self, table: Node<'_, '_>) -> Result<RawTable> {
        let mut columns: Vec<RawColumn> = find_children(table, "FIELD")
            .map(|field| {
                let datatype = get_attribute(field, "datatype").unwrap_or("char");
                RawColumn {
                    id: get_attribute(field, "ID").map(str::to_string),
                    name: get_attribute(field, "name").unwrap_or_default().to_string(),
                    datatype: datatype.to_string(),
                    unit: get_attribute(field, "unit").map(str::to_string),
                    values: Vec::new(),
                }
            })
            .collect();
        let kinds: Vec<CellKind> = columns
            .iter()
            .map(|c| CellKind::from_datatype(&c.datatype))
            .collect();

        let Some(data) = find_child(table, "DATA") else {
            return Ok(RawTable { columns });
        };

        if let Some(unsupported) = data
            .children()
            .find(|n| UNSUPPORTED_SERIALIZATIONS.iter().any(|tag| has_tag(*n, tag)))
        {
            return Err(ReaderError::TableDecode {
                table: table_label(table),
                reason: format!(
                    "{} serialization is not supported",
                    unsupported.tag_name().name()
                ),
            });
        }

        let Some(tabledata) = find_child(data, "TABLEDATA") else {
            return Ok(RawTable { columns });
        };

        for row in find_children(tabledata, "TR") {
            let mut cells = find_children(row, "TD");
            for (column, kind) in columns.iter_mut().zip(&kinds) {
                let value = cells.next().and_then(|td| {
                    let raw = get_text(td);
                    let parsed = kind.parse(&raw);
                    if parsed.is_none() && !raw.is_empty() {
                        tracing::warn!(
                            table = %table_label(table),
                            column = %column.name,
                            value = %raw,
                            "Unparsable cell, treating as empty"
                        );
                    }
                    parsed
                });
                column.values.push(value);
            }
        }

        Ok(RawTable { columns })
    }
}
