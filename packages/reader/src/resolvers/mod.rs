//! Field resolvers, one per field kind.
//!
//! A resolver finds the role region for a field inside its owner, turns the
//! region's content into values and collapses them by multiplicity.

mod attribute;
mod composition;
mod reference;

use roxmltree::Node;

use crate::context::ParseContext;
use crate::error::Result;
use crate::registry::{FieldDescriptor, FieldKind};
use crate::value::Value;

/// Resolve one field of the INSTANCE `owner`.
pub(crate) fn resolve_field<'a, 'input>(
    context: &mut ParseContext<'a, 'input>,
    owner: Node<'a, 'input>,
    field: &FieldDescriptor,
) -> Result<Value> {
    let Some(region) = context.find_role_region(owner, field.kind.tag_name(), &field.role) else {
        return Ok(Value::Absent);
    };

    let values = match field.kind {
        FieldKind::Attribute | FieldKind::AttributeList => {
            attribute::resolve(context, region)?
        }
        FieldKind::Reference => reference::resolve(context, region, field)?,
        FieldKind::Composition => composition::resolve(context, region)?,
    };

    Ok(select_return_value(field, values))
}

/// Collapse a result list for a field.
///
/// Single-valued fields give the value itself, or `Absent` for no value.
/// Anything else is returned as a sequence.
pub(crate) fn select_return_value(field: &FieldDescriptor, mut values: Vec<Value>) -> Value {
    if field.is_single_valued() {
        match values.len() {
            0 => return Value::Absent,
            1 => return values.remove(0),
            _ => {}
        }
    }
    Value::Sequence(values)
}
