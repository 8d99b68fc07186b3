//! Value coercion: turning LITERAL text and raw columns into domain values.
//!
//! The reader never looks inside a coerced value. Anything that understands
//! units, time scales or sky frames plugs in behind [`ValueCoercion`];
//! [`StandardCoercion`] covers the ivoa primitive types.

use std::collections::HashMap;

use crate::error::{ReaderError, Result};
use crate::value::{Literal, Scalar, TableColumn, Value};

/// Conversion of raw mapping values into domain values.
///
/// Implementations return [`Value::Literal`] / [`Value::Column`] for plain
/// data, or [`Value::Domain`] wrapping their own types (quantities, times,
/// sky coordinates).
pub trait ValueCoercion {
    /// Convert the `value` attribute of a LITERAL declared as `value_type`.
    fn coerce(&self, raw: &str, value_type: &str, unit: Option<&str>) -> Result<Value>;

    /// Adapt a column taken from a materialized table.
    ///
    /// Default implementation attaches the FIELD unit and keeps the data.
    fn adapt_column(&self, column: TableColumn, unit: Option<&str>) -> Result<Value> {
        Ok(Value::Column(column.with_unit(unit)))
    }
}

/// Primitive representation of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Real,
    Integer,
    Boolean,
    Text,
}

impl ScalarKind {
    /// Parse the catalog spelling (`real`, `integer`, `boolean`, `string`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "real" => Some(ScalarKind::Real),
            "integer" => Some(ScalarKind::Integer),
            "boolean" => Some(ScalarKind::Boolean),
            "string" => Some(ScalarKind::Text),
            _ => None,
        }
    }

    /// Parse `raw` as this kind. Surrounding whitespace is ignored for
    /// numbers and booleans, kept for text.
    pub fn parse(self, raw: &str) -> std::result::Result<Scalar, String> {
        match self {
            ScalarKind::Real => raw
                .trim()
                .parse::<f64>()
                .map(Scalar::Real)
                .map_err(|e| e.to_string()),
            ScalarKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Scalar::Integer)
                .map_err(|e| e.to_string()),
            ScalarKind::Boolean => Ok(Scalar::Boolean(raw.trim().eq_ignore_ascii_case("true"))),
            ScalarKind::Text => Ok(Scalar::Text(raw.to_string())),
        }
    }
}

/// Built-in value types.
const IVOA_VALUE_TYPES: &[(&str, ScalarKind)] = &[
    ("ivoa:real", ScalarKind::Real),
    ("ivoa:RealQuantity", ScalarKind::Real),
    ("ivoa:integer", ScalarKind::Integer),
    ("ivoa:IntegerQuantity", ScalarKind::Integer),
    ("ivoa:nonnegativeInteger", ScalarKind::Integer),
    ("ivoa:boolean", ScalarKind::Boolean),
    ("ivoa:string", ScalarKind::Text),
    ("ivoa:anyURI", ScalarKind::Text),
    ("ivoa:datetime", ScalarKind::Text),
];

/// Coercion for ivoa primitives and registered aliases.
///
/// Model-specific enumerations (e.g. `coords:domain.space.StdRefFrame`) are
/// registered as aliases of a primitive kind, usually through a catalog's
/// `value_types` section.
#[derive(Debug, Clone)]
pub struct StandardCoercion {
    kinds: HashMap<String, ScalarKind>,
}

impl StandardCoercion {
    /// Create a coercion that knows the ivoa primitive types.
    #[must_use]
    pub fn new() -> Self {
        let kinds = IVOA_VALUE_TYPES
            .iter()
            .map(|(id, kind)| ((*id).to_string(), *kind))
            .collect();
        Self { kinds }
    }

    /// Register (or replace) a value type.
    pub fn register(&mut self, value_type: impl Into<String>, kind: ScalarKind) {
        self.kinds.insert(value_type.into(), kind);
    }

    /// Kind registered for a value type.
    #[must_use]
    pub fn kind_of(&self, value_type: &str) -> Option<ScalarKind> {
        self.kinds.get(value_type).copied()
    }
}

impl Default for StandardCoercion {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCoercion {
    /// Convert a LITERAL value to a typed [`Literal`].
    ///
    /// # Errors
    /// `UnknownValueType` for unregistered value types, `Coercion` when the
    /// text does not parse as the registered kind.
    pub fn literal(&self, raw: &str, value_type: &str, unit: Option<&str>) -> Result<Literal> {
        let kind = self
            .kind_of(value_type)
            .ok_or_else(|| ReaderError::UnknownValueType(value_type.to_string()))?;

        let value = kind.parse(raw).map_err(|reason| ReaderError::Coercion {
            value: raw.to_string(),
            value_type: value_type.to_string(),
            reason,
        })?;

        Ok(Literal {
            value_type: value_type.to_string(),
            value,
            unit: unit.map(str::to_string),
        })
    }
}

impl ValueCoercion for StandardCoercion {
    fn coerce(&self, raw: &str, value_type: &str, unit: Option<&str>) -> Result<Value> {
        self.literal(raw, value_type, unit).map(Value::Literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_real_with_unit() {
        let coercion = StandardCoercion::new();
        let literal = coercion
            .literal("10.34209135", "ivoa:RealQuantity", Some("deg"))
            .unwrap();

        assert_eq!(literal.value, Scalar::Real(10.34209135));
        assert_eq!(literal.unit.as_deref(), Some("deg"));
        assert_eq!(literal.value_type, "ivoa:RealQuantity");
    }

    #[test]
    fn test_coerce_integer() {
        let coercion = StandardCoercion::new();
        let literal = coercion.literal(" 42 ", "ivoa:integer", None).unwrap();
        assert_eq!(literal.value, Scalar::Integer(42));
        assert!(literal.unit.is_none());
    }

    #[test]
    fn test_coerce_boolean() {
        let coercion = StandardCoercion::new();
        assert_eq!(
            coercion.literal("TRUE", "ivoa:boolean", None).unwrap().value,
            Scalar::Boolean(true)
        );
        assert_eq!(
            coercion.literal("yes", "ivoa:boolean", None).unwrap().value,
            Scalar::Boolean(false)
        );
    }

    #[test]
    fn test_coerce_string_keeps_text() {
        let coercion = StandardCoercion::new();
        let literal = coercion.literal("J1975", "ivoa:string", None).unwrap();
        assert_eq!(literal.value, Scalar::Text("J1975".to_string()));
    }

    #[test]
    fn test_coerce_unknown_value_type() {
        let coercion = StandardCoercion::new();
        let err = coercion
            .literal("FK5", "coords:domain.space.StdRefFrame", None)
            .unwrap_err();
        assert!(matches!(err, ReaderError::UnknownValueType(_)));
    }

    #[test]
    fn test_coerce_registered_alias() {
        let mut coercion = StandardCoercion::new();
        coercion.register("coords:domain.space.StdRefFrame", ScalarKind::Text);
        let literal = coercion
            .literal("FK5", "coords:domain.space.StdRefFrame", None)
            .unwrap();
        assert_eq!(literal.value.as_str(), Some("FK5"));
    }

    #[test]
    fn test_coerce_invalid_number() {
        let coercion = StandardCoercion::new();
        let err = coercion.literal("ten", "ivoa:real", None).unwrap_err();
        assert!(matches!(err, ReaderError::Coercion { ref value, .. } if value == "ten"));
    }

    #[test]
    fn test_trait_wraps_literal() {
        let coercion = StandardCoercion::new();
        let value = coercion.coerce("2.5", "ivoa:real", Some("mag")).unwrap();
        let literal = value.as_literal().unwrap();
        assert_eq!(literal.value, Scalar::Real(2.5));
        assert_eq!(literal.unit.as_deref(), Some("mag"));
    }

    #[test]
    fn test_scalar_kind_names() {
        assert_eq!(ScalarKind::from_name("real"), Some(ScalarKind::Real));
        assert_eq!(ScalarKind::from_name("string"), Some(ScalarKind::Text));
        assert_eq!(ScalarKind::from_name("text"), None);
    }
}
