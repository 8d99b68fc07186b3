//! ATTRIBUTE regions: structured INSTANCEs, LITERALs and COLUMNs.

use roxmltree::Node;

use crate::config::INSTANCE_TAG;
use crate::context::{Diagnostic, ParseContext};
use crate::error::{ReaderError, Result};
use crate::table::table_label;
use crate::value::{TableColumn, Value};
use crate::xml::{
    element_children, get_attribute, get_tag_name, has_tag, preceding_sibling_count,
    require_attribute,
};

/// Values of an ATTRIBUTE region, in document order.
pub(super) fn resolve<'a, 'input>(
    context: &mut ParseContext<'a, 'input>,
    region: Node<'a, 'input>,
) -> Result<Vec<Value>> {
    let mut values = Vec::new();

    for child in element_children(region) {
        match get_tag_name(child) {
            INSTANCE_TAG => values.push(Value::instance(&context.build(child)?)),
            "LITERAL" => values.push(parse_literal(context, child)?),
            "COLUMN" => values.push(parse_column(context, child)?),
            other => tracing::trace!(tag = other, "Ignoring element in ATTRIBUTE"),
        }
    }

    Ok(values)
}

fn parse_literal(context: &ParseContext<'_, '_>, literal: Node<'_, '_>) -> Result<Value> {
    let raw = require_attribute(literal, "value")?;
    let value_type = require_attribute(literal, "dmtype")?;
    let unit = get_attribute(literal, "unit");

    context.builder().coercion().coerce(raw, value_type, unit)
}

/// A COLUMN: find its FIELD, materialize the FIELD's TABLE and hand the
/// column to the coercion.
fn parse_column(context: &mut ParseContext<'_, '_>, column: Node<'_, '_>) -> Result<Value> {
    let column_ref = require_attribute(column, "ref")?;

    let Some(field) = context.find_field(column_ref) else {
        context.report(Diagnostic::MissingColumn {
            column: column_ref.to_string(),
        });
        return Ok(Value::Undefined);
    };

    let table_node = field
        .parent_element()
        .filter(|parent| has_tag(*parent, "TABLE"))
        .ok_or_else(|| ReaderError::OrphanColumn {
            column: column_ref.to_string(),
        })?;
    let table = context.materialize_table(table_node)?;

    let index = table.column_index(column_ref).or_else(|| {
        // Decoders that do not record FIELD IDs still keep FIELD order.
        let position = preceding_sibling_count(field);
        (position < table.columns().len()).then_some(position)
    });
    let Some(index) = index else {
        context.report(Diagnostic::UnresolvedColumn {
            column: column_ref.to_string(),
            table: table_label(table_node),
        });
        return Ok(Value::Undefined);
    };

    let name = get_attribute(field, "name").unwrap_or(column_ref);
    let unit = get_attribute(field, "unit");
    context
        .builder()
        .coercion()
        .adapt_column(TableColumn::new(table, index, name), unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::GraphBuilder;
    use crate::registry::{FieldDescriptor, TypeDescriptor, TypeRegistry};
    use crate::value::Scalar;
    use crate::xml::find_child;
    use roxmltree::Document;

    const MIXED: &str = r#"<VOTABLE><VODML><TEMPLATES>
      <INSTANCE dmtype="test:Bag">
        <ATTRIBUTE dmrole="test:Bag.items">
          <COLUMN ref="_mag" dmtype="ivoa:real"/>
          <LITERAL value="3" dmtype="ivoa:integer"/>
          <INSTANCE dmtype="test:Item"/>
          <LITERAL value="last" dmtype="ivoa:string"/>
        </ATTRIBUTE>
      </INSTANCE>
    </TEMPLATES></VODML>
    <RESOURCE><TABLE ID="_t">
      <FIELD ID="_mag" name="mag" datatype="double" unit="mag"/>
      <DATA><TABLEDATA><TR><TD>12.5</TD></TR></TABLEDATA></DATA>
    </TABLE></RESOURCE></VOTABLE>"#;

    fn builder() -> GraphBuilder {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("test:Bag").field(FieldDescriptor::attribute_list("test:Bag.items")),
        );
        registry.register(TypeDescriptor::new("test:Item"));
        GraphBuilder::new(registry)
    }

    #[test]
    fn test_mixed_content_keeps_document_order() {
        let doc = Document::parse(MIXED).unwrap();
        let builder = builder();
        let mut context = builder.context(&doc);
        let bag = context.find_instances("test:Bag").unwrap().remove(0);

        let items = bag.get("test:Bag.items").and_then(Value::as_sequence).unwrap();
        assert_eq!(items.len(), 4);

        let column = items[0].as_column().unwrap();
        assert_eq!(column.name, "mag");
        assert_eq!(column.unit.as_deref(), Some("mag"));
        assert_eq!(column.values(), &[Some(Scalar::Real(12.5))]);
        assert_eq!(items[1].as_literal().unwrap().value, Scalar::Integer(3));
        assert_eq!(items[2].as_instance().unwrap().type_id(), "test:Item");
        assert_eq!(items[3].as_literal().unwrap().value.as_str(), Some("last"));
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = r#"<INSTANCE dmtype="test:Bag"><ATTRIBUTE dmrole="test:Bag.items">
            <NOTE/><LITERAL value="1" dmtype="ivoa:integer"/>
        </ATTRIBUTE></INSTANCE>"#;
        let doc = Document::parse(xml).unwrap();
        let builder = builder();
        let mut context = builder.context(&doc);
        let region = find_child(doc.root_element(), "ATTRIBUTE").unwrap();

        let values = resolve(&mut context, region).unwrap();
        assert_eq!(values.len(), 1);
        assert!(values[0].as_literal().is_some());
    }
}
