//! COMPOSITION regions: INSTANCEs owned by the parent.

use roxmltree::Node;

use crate::context::ParseContext;
use crate::error::Result;
use crate::locator::child_instances;
use crate::value::Value;

pub(super) fn resolve<'a, 'input>(
    context: &mut ParseContext<'a, 'input>,
    region: Node<'a, 'input>,
) -> Result<Vec<Value>> {
    child_instances(region)
        .map(|child| context.build(child).map(|instance| Value::instance(&instance)))
        .collect()
}
