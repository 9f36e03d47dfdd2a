//! Model element export
//!
//! Writes an element's triples and then follows its references through the
//! lookup store, exporting every reachable element once. The visited set is
//! owned by one export call and threaded through the recursion.

use std::collections::HashSet;

use oxrdf::{Graph, NamedNode, NamedOrBlankNode, Term};
use tracing::{debug, info, trace};

use crate::codec::{encode_collection, encode_optional_reference, term_for_value};
use crate::descriptor::{fields, ElementKind, FieldDescriptor, LiteralType};
use crate::element::{FieldValue, ScalarValue};
use crate::error::{Result, SammError};
use crate::graph::{serialize_turtle, TripleGraph};
use crate::id::NamespaceMap;
use crate::store::{ContainerStore, IdentifierRecord, LookupStore};
use crate::vocab::IdSet;

/// Options for document export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Maximum reference depth followed from the Aspect
    pub max_depth: usize,
    /// Write the Aspect's stored header comments above the Turtle body
    pub emit_comments: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            emit_comments: true,
        }
    }
}

/// Vocabulary, prefixes and records shared by one export call
pub struct ExportContext<'a> {
    pub ids: &'a IdSet,
    pub namespaces: &'a NamespaceMap,
    pub store: &'a LookupStore,
    pub max_depth: usize,
}

/// Assert the triples of `record` under `concept_id`, then recurse into
/// every referenced record not yet in `visited`
///
/// The caller inserts `concept_id` into `visited` before the first call.
pub fn export_element<G: TripleGraph + ?Sized>(
    graph: &mut G,
    ctx: &ExportContext<'_>,
    visited: &mut HashSet<String>,
    concept_id: &str,
    record: &IdentifierRecord,
    depth: usize,
) -> Result<()> {
    if depth > ctx.max_depth {
        return Err(SammError::DepthExceeded(ctx.max_depth));
    }

    let ids = ctx.ids;
    let subject = NamedOrBlankNode::from(graph.create_uri_node(concept_id)?);
    let element = &record.element;

    graph.assert_triple(
        subject.clone(),
        ids.rdf_type(),
        ids.node(&element.kind().type_term()).into(),
    );
    if let Some(name) = ids.name() {
        let literal = graph.create_literal_node(&record.id_short, None, None);
        graph.assert_triple(subject.clone(), name, literal);
    }
    for description in &record.description {
        let literal = graph.create_literal_node(&description.text, Some(&description.language), None);
        graph.assert_triple(subject.clone(), ids.description(), literal);
    }

    for (descriptor, value) in element.fields() {
        if value.is_default() {
            continue;
        }
        let Some(predicate) = descriptor.predicate else {
            continue;
        };
        let predicate = ids.node(predicate);
        for object in encode_field(graph, ctx, descriptor, value) {
            graph.assert_triple(subject.clone(), predicate.clone(), object);
        }
    }
    trace!(id = concept_id, kind = %element.kind(), "Exported element");

    for referenced in element.referenced_ids() {
        let target = ctx.namespaces.expand_or_keep(&referenced);
        if visited.contains(&target) {
            continue;
        }
        let Some(next) = ctx.store.lookup(&target) else {
            continue;
        };
        visited.insert(target.clone());
        export_element(graph, ctx, visited, &target, next, depth + 1)?;
    }

    Ok(())
}

/// Objects to assert for one non-default field value
fn encode_field<G: TripleGraph + ?Sized>(
    graph: &mut G,
    ctx: &ExportContext<'_>,
    descriptor: &FieldDescriptor,
    value: &FieldValue,
) -> Vec<Term> {
    let ids = ctx.ids;
    let namespaces = ctx.namespaces;
    let content_predicate: Option<NamedNode> = descriptor.content_predicate.map(|p| ids.node(p));

    match value {
        FieldValue::Scalar(scalar) | FieldValue::OptionalScalar(Some(scalar)) => {
            vec![scalar_term(&*graph, ctx, descriptor, scalar)]
        }
        FieldValue::StringList(list) => list
            .iter()
            .map(|entry| term_for_value(entry, namespaces))
            .collect(),
        FieldValue::LangStringList(list) => list
            .iter()
            .map(|s| graph.create_literal_node(&s.text, Some(&s.language), None))
            .collect(),
        FieldValue::Reference(Some(reference)) => {
            vec![term_for_value(reference.as_str(), namespaces)]
        }
        FieldValue::OptionalReference(Some(reference)) => match &content_predicate {
            Some(content) => vec![encode_optional_reference(
                graph, ids, namespaces, reference, content,
            )],
            None => vec![term_for_value(&reference.value, namespaces)],
        },
        FieldValue::ReferenceList(list) => vec![encode_collection(graph, ids, list, |_, r| {
            term_for_value(r.as_str(), namespaces)
        })],
        FieldValue::OptionalReferenceList(list) => {
            let content = content_predicate.unwrap_or_else(|| ids.node("samm:property"));
            vec![encode_collection(graph, ids, list, |g, r| {
                encode_optional_reference(g, ids, namespaces, r, &content)
            })]
        }
        FieldValue::Enum(Some(member)) => {
            let iri = ids.expand(&format!("{}{}", descriptor.enum_prefix, member));
            match NamedNode::new(iri) {
                Ok(node) => vec![node.into()],
                Err(e) => {
                    debug!(field = descriptor.name, member = %member, error = %e, "Skipping enum value");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    }
}

fn scalar_term<G: TripleGraph + ?Sized>(
    graph: &G,
    ctx: &ExportContext<'_>,
    descriptor: &FieldDescriptor,
    scalar: &ScalarValue,
) -> Term {
    let text = scalar.as_str();
    if descriptor.literal == LiteralType::NonNegativeInteger {
        return graph.create_literal_node(text, None, Some(&ctx.ids.xsd_non_negative_integer()));
    }
    if scalar.iri {
        return match graph.create_uri_node(text) {
            Ok(node) => node.into(),
            Err(_) => term_for_value(text, ctx.namespaces),
        };
    }
    match scalar.datatype.as_deref().map(NamedNode::new) {
        Some(Ok(datatype)) => graph.create_literal_node(text, None, Some(&datatype)),
        Some(Err(e)) => {
            debug!(field = descriptor.name, error = %e, "Writing scalar with unusable datatype as plain text");
            graph.create_literal_node(text, None, None)
        }
        None => graph.create_literal_node(text, None, None),
    }
}

/// Export the Aspect `aspect_id` and everything it reaches as Turtle text
pub fn export_document(
    containers: &dyn ContainerStore,
    aspect_id: &str,
    options: &ExportOptions,
) -> Result<String> {
    let store = LookupStore::build(containers);
    let (graph, namespaces, comments) = export_graph(&store, aspect_id, options)?;
    serialize_turtle(&graph, &namespaces, &comments)
}

/// Build the export graph for `aspect_id` from an existing store
///
/// Returns the graph, the prefixes to write and the header comments. The
/// prefixes are the Aspect's stored map as it is; an Aspect without one gets
/// the release's conventional prefixes.
pub fn export_graph(
    store: &LookupStore,
    aspect_id: &str,
    options: &ExportOptions,
) -> Result<(Graph, NamespaceMap, Vec<String>)> {
    if store.lookup(aspect_id).is_none() {
        return Err(SammError::UnknownContainer(aspect_id.to_string()));
    }
    let aspect = store
        .lookup_typed(aspect_id, ElementKind::Aspect)
        .ok_or_else(|| SammError::NotAnAspect(aspect_id.to_string()))?;

    let ids = IdSet::for_version(aspect.version);
    let declared = aspect
        .element
        .namespaces()
        .filter(|m| !m.is_empty())
        .cloned()
        .unwrap_or_else(|| ids.document_prefixes());
    // Resolution only; the written prefixes stay as declared
    let mut resolving = declared.clone();
    resolving.merge_missing(&ids.namespaces);

    let comments = if options.emit_comments {
        aspect.element.string_list(fields::COMMENTS).to_vec()
    } else {
        Vec::new()
    };

    let ctx = ExportContext {
        ids: &ids,
        namespaces: &resolving,
        store,
        max_depth: options.max_depth,
    };
    let mut graph = Graph::default();
    let mut visited = HashSet::from([aspect_id.to_string()]);
    export_element(&mut graph, &ctx, &mut visited, aspect_id, aspect, 0)?;

    info!(
        aspect = aspect_id,
        elements = visited.len(),
        triples = graph.len(),
        version = %ids.version,
        "Exported document"
    );
    Ok((graph, declared, comments))
}
