//! XML utility functions for navigating and extracting data from DOM trees.
//!
//! All tag comparisons use the local name, so VOTable documents with or
//! without a default namespace are handled the same way.

use roxmltree::Node;

use crate::error::{ReaderError, Result};

/// Get the tag name without namespace prefix.
///
/// # Arguments
/// * `node` - XML node
///
/// # Returns
/// Local tag name (e.g., "VOTABLE" for `<v:VOTABLE>`)
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use rama_reader::xml::get_tag_name;
///
/// let xml = r#"<v:VOTABLE xmlns:v="http://www.ivoa.net/xml/VOTable/v1.4"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "VOTABLE");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with a specific tag name.
///
/// # Arguments
/// * `node` - Node to check
/// * `tag` - Local tag name to compare against
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find all child elements with the given tag name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Tag name to search for
///
/// # Returns
/// Iterator over matching child elements, in document order
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use rama_reader::xml::find_children;
///
/// let xml = r#"<ATTRIBUTE><LITERAL/><COLUMN/><LITERAL/></ATTRIBUTE>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(find_children(doc.root_element(), "LITERAL").count(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| has_tag(*child, tag))
}

/// Find the first child element with the given tag name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Tag name to search for
///
/// # Returns
/// First matching child element, or `None` if not found
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| has_tag(*child, tag))
}

/// Get all element children of a node, in document order.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Get the text content of a node, trimmed.
///
/// # Arguments
/// * `node` - Node to get text from
///
/// # Returns
/// Trimmed text content, or empty string if no text
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Get an attribute value from a node.
///
/// # Arguments
/// * `node` - Node to get attribute from
/// * `name` - Attribute name
///
/// # Returns
/// Attribute value, or `None` if not found
pub fn get_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

/// Get an attribute value that the element cannot be interpreted without.
///
/// # Arguments
/// * `node` - Element to read from
/// * `name` - Attribute name
///
/// # Errors
/// Returns `MissingAttribute` naming the element and the attribute.
pub fn require_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name)
        .ok_or_else(|| ReaderError::MissingAttribute {
            element: get_tag_name(node).to_string(),
            attribute: name.to_string(),
        })
}

/// Count the same-tag element siblings that precede a node.
///
/// # Arguments
/// * `node` - Element whose position is wanted
///
/// # Returns
/// Zero-based position of `node` among siblings with its tag
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use rama_reader::xml::{find_children, preceding_sibling_count};
///
/// let xml = r#"<RESOURCE><TABLE/><INFO/><TABLE/></RESOURCE>"#;
/// let doc = Document::parse(xml).unwrap();
/// let second = find_children(doc.root_element(), "TABLE").nth(1).unwrap();
/// assert_eq!(preceding_sibling_count(second), 1);
/// ```
pub fn preceding_sibling_count(node: Node<'_, '_>) -> usize {
    let tag = get_tag_name(node);
    node.prev_siblings()
        .skip(1)
        .filter(|sibling| has_tag(*sibling, tag))
        .count()
}
