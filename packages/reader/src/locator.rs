//! Navigation of the annotation tree.
//!
//! Pure functions over the DOM: finding instance regions, role regions and
//! ID targets. Nothing here builds instances or records diagnostics.

use std::collections::HashMap;

use roxmltree::Node;

use crate::config::INSTANCE_TAG;
use crate::error::Result;
use crate::xml::{find_children, get_attribute, get_tag_name, has_tag, preceding_sibling_count, require_attribute};

/// Every INSTANCE below `root` declaring `type_id`, in document order.
///
/// Only the declared type is compared; subtypes are not matched.
pub fn find_instances_of_type<'a, 'input>(
    root: Node<'a, 'input>,
    type_id: &str,
) -> Vec<Node<'a, 'input>> {
    root.descendants()
        .filter(|node| has_tag(*node, INSTANCE_TAG) && node.attribute("dmtype") == Some(type_id))
        .collect()
}

/// Direct children of `parent` with tag `tag` and `dmrole` equal to `role`.
///
/// More than one match is an annotation error; callers take the first.
pub fn find_role_regions<'a, 'input>(
    parent: Node<'a, 'input>,
    tag: &str,
    role: &str,
) -> Vec<Node<'a, 'input>> {
    parent
        .children()
        .filter(|child| has_tag(*child, tag) && child.attribute("dmrole") == Some(role))
        .collect()
}

/// INSTANCE children of a role region, in document order.
pub fn child_instances<'a, 'input>(
    region: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    find_children(region, INSTANCE_TAG)
}

/// The `dmtype` of an INSTANCE.
///
/// # Errors
/// Returns `MissingAttribute` if the INSTANCE has no `dmtype`.
pub fn resolve_declared_type<'a>(region: Node<'a, '_>) -> Result<&'a str> {
    require_attribute(region, "dmtype")
}

/// The `ID` of an INSTANCE, if it has one.
pub fn resolve_stable_id<'a>(region: Node<'a, '_>) -> Option<&'a str> {
    get_attribute(region, "ID")
}

/// Number of preceding siblings with the same tag.
pub fn sibling_positional_index(region: Node<'_, '_>) -> usize {
    preceding_sibling_count(region)
}

/// Index of every element with an `ID` attribute, keyed by tag and ID.
///
/// Built once per context on first lookup. When several elements of the
/// same tag share an ID the first in document order wins.
#[derive(Debug, Default)]
pub struct IdIndex<'a, 'input> {
    entries: HashMap<(&'a str, &'a str), Node<'a, 'input>>,
}

impl<'a, 'input> IdIndex<'a, 'input> {
    /// Index every element below `root`.
    pub fn build(root: Node<'a, 'input>) -> Self {
        let mut entries = HashMap::new();
        for node in root.descendants().filter(Node::is_element) {
            if let Some(id) = node.attribute("ID") {
                entries.entry((get_tag_name(node), id)).or_insert(node);
            }
        }
        tracing::trace!(entries = entries.len(), "Built ID index");
        Self { entries }
    }

    /// Element with tag `tag` and `ID` equal to `id`.
    #[must_use]
    pub fn get(&self, tag: &str, id: &str) -> Option<Node<'a, 'input>> {
        self.entries.get(&(tag, id)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
