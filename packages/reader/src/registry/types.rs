//! Types for the model type registry.

use std::fmt;

/// How a field is serialized inside its owner's INSTANCE.
///
/// The set is closed: every field of every model type is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single-valued attribute (LITERAL, COLUMN or structured INSTANCE).
    Attribute,
    /// Multi-valued attribute; read like `Attribute`, never collapsed.
    AttributeList,
    /// Pointer to an INSTANCE elsewhere in the document (IDREF).
    Reference,
    /// INSTANCEs nested inside the owner.
    Composition,
}

impl FieldKind {
    /// Tag name of the role region this kind is serialized in.
    #[must_use]
    pub fn tag_name(self) -> &'static str {
        match self {
            FieldKind::Attribute | FieldKind::AttributeList => crate::config::ATTRIBUTE_TAG,
            FieldKind::Reference => crate::config::REFERENCE_TAG,
            FieldKind::Composition => crate::config::COMPOSITION_TAG,
        }
    }

    /// Parse the lowercase catalog spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "attribute" => Some(FieldKind::Attribute),
            "attribute_list" => Some(FieldKind::AttributeList),
            "reference" => Some(FieldKind::Reference),
            "composition" => Some(FieldKind::Composition),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Attribute => "attribute",
            FieldKind::AttributeList => "attribute_list",
            FieldKind::Reference => "reference",
            FieldKind::Composition => "composition",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound of a field's multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    One,
    Unbounded,
}

/// Declaration of one field of a model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Role id, unique within the owning type (e.g. `meas:CoordMeasure.coord`).
    pub role: String,

    /// Serialization kind.
    pub kind: FieldKind,

    /// Declared lower bound. Only checked in strict mode.
    pub min_occurs: u32,

    /// Declared upper bound. Decides whether single results are collapsed.
    pub max_occurs: MaxOccurs,
}

impl FieldDescriptor {
    /// Create a field with multiplicity `0..1`.
    #[must_use]
    pub fn new(role: impl Into<String>, kind: FieldKind) -> Self {
        let max_occurs = match kind {
            FieldKind::AttributeList => MaxOccurs::Unbounded,
            _ => MaxOccurs::One,
        };
        Self {
            role: role.into(),
            kind,
            min_occurs: 0,
            max_occurs,
        }
    }

    #[must_use]
    pub fn attribute(role: impl Into<String>) -> Self {
        Self::new(role, FieldKind::Attribute)
    }

    #[must_use]
    pub fn attribute_list(role: impl Into<String>) -> Self {
        Self::new(role, FieldKind::AttributeList)
    }

    #[must_use]
    pub fn reference(role: impl Into<String>) -> Self {
        Self::new(role, FieldKind::Reference)
    }

    #[must_use]
    pub fn composition(role: impl Into<String>) -> Self {
        Self::new(role, FieldKind::Composition)
    }

    /// Set the lower bound.
    #[must_use]
    pub fn with_min(mut self, min_occurs: u32) -> Self {
        self.min_occurs = min_occurs;
        self
    }

    /// Set the upper bound.
    #[must_use]
    pub fn with_max(mut self, max_occurs: MaxOccurs) -> Self {
        self.max_occurs = max_occurs;
        self
    }

    /// Shorthand for `with_max(MaxOccurs::Unbounded)`.
    #[must_use]
    pub fn unbounded(self) -> Self {
        self.with_max(MaxOccurs::Unbounded)
    }

    /// Whether a result list of this field collapses to a single value.
    #[must_use]
    pub fn is_single_valued(&self) -> bool {
        self.max_occurs == MaxOccurs::One && self.kind != FieldKind::AttributeList
    }
}

/// Declaration of a model type.
///
/// Descriptors are immutable once registered. Inherited fields are not
/// copied in; the registry resolves `extends` at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Globally unique model type id (e.g. `meas:SkyPosition`).
    pub id: String,

    /// Direct supertypes, in declaration order.
    pub extends: Vec<String>,

    /// Fields declared by this type itself.
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Create a descriptor without fields or supertypes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extends: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a supertype.
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.extends.push(supertype.into());
        self
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}
