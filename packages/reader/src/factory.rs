//! Instance construction.

use std::collections::HashMap;
use std::rc::Rc;

use roxmltree::{Document, Node};

use crate::coercion::{StandardCoercion, ValueCoercion};
use crate::config::ReaderOptions;
use crate::context::{Graph, ParseContext};
use crate::error::{ReaderError, Result};
use crate::instance::Instance;
use crate::locator;
use crate::registry::TypeRegistry;
use crate::resolvers;
use crate::table::{TableDecoder, VoTableDecoder};
use crate::value::DomainValue;

/// Conversion of a finished instance into a domain value, registered per
/// model type with [`GraphBuilder::with_adapter`].
pub type InstanceAdapter = Box<dyn Fn(&Instance) -> Result<DomainValue>>;

/// Builds typed object graphs from annotated documents.
///
/// The builder holds what does not change between parses: the type
/// registry, the value coercion, the table decoder, the instance adapters
/// and the options. Each parse runs in its own [`ParseContext`].
///
/// Construction of an instance:
/// 1. resolve the declared `dmtype` in the registry,
/// 2. return the cached instance if the region's `ID` was built before,
/// 3. allocate the instance and register it under its `ID`,
/// 4. resolve every field, inherited ones first,
/// 5. run the adapter registered for the type, if any.
///
/// Registering before step 4 is what makes reference cycles terminate. If
/// step 4 or 5 fails, every instance registered since step 3 is dropped
/// from the context again.
pub struct GraphBuilder {
    registry: TypeRegistry,
    coercion: Box<dyn ValueCoercion>,
    decoder: Box<dyn TableDecoder>,
    adapters: HashMap<String, InstanceAdapter>,
    options: ReaderOptions,
}

impl GraphBuilder {
    /// Create a builder with the standard coercion, the inline TABLEDATA
    /// decoder and default options.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            coercion: Box::new(StandardCoercion::new()),
            decoder: Box::new(VoTableDecoder::new()),
            adapters: HashMap::new(),
            options: ReaderOptions::default(),
        }
    }

    #[must_use]
    pub fn with_coercion(mut self, coercion: impl ValueCoercion + 'static) -> Self {
        self.coercion = Box::new(coercion);
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: impl TableDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Register an adapter for instances of exactly `type_id`.
    ///
    /// The adapter runs once per instance, after all its fields are
    /// assigned; the result is available from [`Instance::adapted`]. Nested
    /// instances are adapted before their owner, so an instance reached
    /// back through a cycle may still be incomplete. An adapter error fails
    /// the build.
    #[must_use]
    pub fn with_adapter<F>(mut self, type_id: impl Into<String>, adapter: F) -> Self
    where
        F: Fn(&Instance) -> Result<DomainValue> + 'static,
    {
        self.adapters.insert(type_id.into(), Box::new(adapter));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn coercion(&self) -> &dyn ValueCoercion {
        self.coercion.as_ref()
    }

    #[must_use]
    pub fn decoder(&self) -> &dyn TableDecoder {
        self.decoder.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Start a parse session over `document`.
    #[must_use]
    pub fn context<'a, 'input>(
        &'a self,
        document: &'a Document<'input>,
    ) -> ParseContext<'a, 'input> {
        ParseContext::new(self, document)
    }

    /// Build all instances of `type_id` in a fresh context.
    ///
    /// The returned graph owns the instances and the session's diagnostics.
    pub fn find_instances(&self, document: &Document<'_>, type_id: &str) -> Result<Graph> {
        let mut context = self.context(document);
        let roots = context.find_instances(type_id)?;
        Ok(context.into_graph(roots))
    }

    /// Parse `xml` and build all instances of `type_id`.
    pub fn read_str(&self, xml: &str, type_id: &str) -> Result<Graph> {
        let document = Document::parse(xml)?;
        self.find_instances(&document, type_id)
    }

    pub(crate) fn build<'a, 'input>(
        &self,
        context: &mut ParseContext<'a, 'input>,
        region: Node<'a, 'input>,
    ) -> Result<Rc<Instance>> {
        let type_id = locator::resolve_declared_type(region)?;
        let descriptor = self.registry.resolve(type_id)?;
        let stable_id = locator::resolve_stable_id(region);

        if let Some(cached) = stable_id.and_then(|id| context.instance_by_id(id)) {
            tracing::trace!(type_id, id = ?stable_id, "Instance cache hit");
            return Ok(cached);
        }

        let fields = self.registry.fields_of(&descriptor)?;
        context.enter(type_id)?;

        let instance = Rc::new(Instance::new(
            descriptor.id.clone(),
            stable_id.map(str::to_string),
            fields,
        ));
        let mark = context.instance_mark();
        context.register_instance(&instance);

        let built = self
            .populate(context, region, &instance)
            .and_then(|()| self.adapt(&instance));
        context.leave();

        if let Err(err) = built {
            context.rollback_instances(mark);
            return Err(err);
        }
        Ok(instance)
    }

    fn populate<'a, 'input>(
        &self,
        context: &mut ParseContext<'a, 'input>,
        region: Node<'a, 'input>,
        instance: &Instance,
    ) -> Result<()> {
        for index in 0..instance.field_count() {
            let Some(field) = instance.descriptor(index) else {
                continue;
            };
            let value = resolvers::resolve_field(context, region, field)?;

            if self.options.strict_multiplicity && value.count() < field.min_occurs as usize {
                return Err(ReaderError::MultiplicityViolation {
                    role: field.role.clone(),
                    min: field.min_occurs,
                    found: value.count(),
                });
            }

            instance.assign(index, value);
        }
        Ok(())
    }

    fn adapt(&self, instance: &Instance) -> Result<()> {
        if let Some(adapter) = self.adapters.get(instance.type_id()) {
            tracing::trace!(type_id = instance.type_id(), "Adapting instance");
            instance.set_adapted(adapter(instance)?);
        }
        Ok(())
    }
}

impl std::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut adapters: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        adapters.sort_unstable();
        f.debug_struct("GraphBuilder")
            .field("types", &self.registry.len())
            .field("adapters", &adapters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldDescriptor, TypeDescriptor};
    use roxmltree::Document;

    fn builder() -> GraphBuilder {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("test:Node")
                .field(FieldDescriptor::attribute("test:Node.label"))
                .field(FieldDescriptor::reference("test:Node.next")),
        );
        GraphBuilder::new(registry)
    }

    #[test]
    fn test_build_literal_field() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node">
            <ATTRIBUTE dmrole="test:Node.label"><LITERAL value="a" dmtype="ivoa:string"/></ATTRIBUTE>
        </INSTANCE></VODML>"#;
        let doc = Document::parse(xml).unwrap();
        let graph = builder().find_instances(&doc, "test:Node").unwrap();
        let found = graph.roots();

        assert_eq!(found.len(), 1);
        let label = found[0].literal("test:Node.label").unwrap();
        assert_eq!(label.value.as_str(), Some("a"));
        assert!(found[0].get("test:Node.next").unwrap().is_absent());
        assert!(found[0].is_complete());
    }

    #[test]
    fn test_self_reference_terminates() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node" ID="_n">
            <REFERENCE dmrole="test:Node.next"><IDREF>_n</IDREF></REFERENCE>
        </INSTANCE></VODML>"#;
        let doc = Document::parse(xml).unwrap();
        let graph = builder().find_instances(&doc, "test:Node").unwrap();
        let node = &graph.roots()[0];

        let next = node.instance("test:Node.next").unwrap();
        assert!(Instance::same(&next, node));
    }

    #[test]
    fn test_self_reference_is_freed_with_graph() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node" ID="_n">
            <REFERENCE dmrole="test:Node.next"><IDREF>_n</IDREF></REFERENCE>
        </INSTANCE></VODML>"#;
        let graph = builder().read_str(xml, "test:Node").unwrap();
        let weak = Rc::downgrade(&graph.roots()[0]);

        drop(graph);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_missing_dmtype_is_error() {
        let doc = Document::parse(r#"<VODML><INSTANCE ID="x"/></VODML>"#).unwrap();
        let builder = builder();
        let mut context = builder.context(&doc);
        let region = doc.root_element().first_element_child().unwrap();
        let err = context.build(region).unwrap_err();
        assert!(matches!(err, ReaderError::MissingAttribute { .. }));
    }

    #[test]
    fn test_read_str_returns_diagnostics() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node">
            <REFERENCE dmrole="test:Node.next"><IDREF>_gone</IDREF></REFERENCE>
        </INSTANCE></VODML>"#;
        let graph = builder().read_str(xml, "test:Node").unwrap();
        assert_eq!(graph.roots().len(), 1);
        assert_eq!(graph.diagnostics().len(), 1);
    }

    #[test]
    fn test_failed_build_leaves_no_instances() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node" ID="_first">
            <REFERENCE dmrole="test:Node.next"><IDREF>_second</IDREF></REFERENCE>
        </INSTANCE>
        <INSTANCE dmtype="test:Node" ID="_second">
            <ATTRIBUTE dmrole="test:Node.label"><LITERAL value="x" dmtype="nope:Type"/></ATTRIBUTE>
        </INSTANCE></VODML>"#;
        let doc = Document::parse(xml).unwrap();
        let builder = builder();
        let mut context = builder.context(&doc);

        let err = context.find_instances("test:Node").unwrap_err();
        assert!(matches!(err, ReaderError::UnknownValueType(ref t) if t == "nope:Type"));
        assert!(context.instances().is_empty());
        assert!(context.instance_by_id("_first").is_none());
        assert!(context.instance_by_id("_second").is_none());
    }

    #[test]
    fn test_adapter_runs_after_fields() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node">
            <ATTRIBUTE dmrole="test:Node.label"><LITERAL value="a" dmtype="ivoa:string"/></ATTRIBUTE>
        </INSTANCE></VODML>"#;
        let builder = builder().with_adapter("test:Node", |node: &Instance| {
            let label = node
                .literal("test:Node.label")
                .map(|literal| literal.value.to_string())
                .unwrap_or_default();
            Ok(DomainValue::new(label.to_uppercase()))
        });
        let graph = builder.read_str(xml, "test:Node").unwrap();
        assert_eq!(
            graph.roots()[0].adapted_as::<String>().map(String::as_str),
            Some("A")
        );
    }

    #[test]
    fn test_adapter_error_fails_build() {
        let xml = r#"<VODML><INSTANCE dmtype="test:Node" ID="_n"/></VODML>"#;
        let doc = Document::parse(xml).unwrap();
        let builder = builder().with_adapter("test:Node", |_: &Instance| {
            Err(ReaderError::Config("no adapter for this node".to_string()))
        });
        let mut context = builder.context(&doc);

        assert!(matches!(
            context.find_instances("test:Node"),
            Err(ReaderError::Config(_))
        ));
        assert!(context.instance_by_id("_n").is_none());
    }

    #[test]
    fn test_depth_counter_resets_between_builds() {
        let xml = r#"<VODML>
            <INSTANCE dmtype="test:Node"/><INSTANCE dmtype="test:Node"/><INSTANCE dmtype="test:Node"/>
        </VODML>"#;
        let doc = Document::parse(xml).unwrap();
        let builder = builder().with_options(ReaderOptions::new().with_max_depth(1));
        assert_eq!(builder.find_instances(&doc, "test:Node").unwrap().roots().len(), 3);
    }
}
