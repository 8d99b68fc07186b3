//! REFERENCE regions: IDREFs to INSTANCEs elsewhere in the document.

use roxmltree::Node;

use crate::context::{Diagnostic, ParseContext};
use crate::error::Result;
use crate::registry::FieldDescriptor;
use crate::value::Value;
use crate::xml::{find_children, get_text};

/// Targets of every IDREF in a REFERENCE region.
///
/// A target already built in this context is reused; otherwise the INSTANCE
/// with that `ID` is built. IDREFs with no target are reported and skipped.
pub(super) fn resolve<'a, 'input>(
    context: &mut ParseContext<'a, 'input>,
    region: Node<'a, 'input>,
    field: &FieldDescriptor,
) -> Result<Vec<Value>> {
    let mut values = Vec::new();

    for idref in find_children(region, "IDREF") {
        let target = get_text(idref);

        if let Some(instance) = context.instance_by_id(&target) {
            values.push(Value::instance(&instance));
            continue;
        }

        match context.find_instance_region(&target) {
            Some(instance_region) => {
                values.push(Value::instance(&context.build(instance_region)?));
            }
            None => context.report(Diagnostic::DanglingReference {
                role: field.role.clone(),
                target,
            }),
        }
    }

    Ok(values)
}
