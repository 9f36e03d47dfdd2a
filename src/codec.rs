//! Reference and collection codec
//!
//! Ordered reference lists travel as RDF collections: a chain of blank nodes
//! linked by `rdf:first`/`rdf:rest` and closed by `rdf:nil`. A list entry is
//! either the referenced node itself or an anonymous wrapper node carrying
//! the reference under a content predicate plus a `samm:optional` flag.

use std::collections::HashSet;

use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term};
use tracing::{debug, trace};

use crate::descriptor::ElementKind;
use crate::element::OptionalReference;
use crate::graph::{is_terminal, term_string, TripleGraph};
use crate::id::{classify_id, IdKind, NamespaceMap};
use crate::vocab::IdSet;

/// Promotes inline (blank node) elements to identified records
pub trait InlineResolver {
    /// Import the element at `node` and return its newly minted identifier
    fn materialize(&mut self, node: &BlankNode, kind: ElementKind) -> Option<String>;
}

/// Resolver that leaves inline elements unresolved
pub struct NoInline;

impl InlineResolver for NoInline {
    fn materialize(&mut self, _node: &BlankNode, _kind: ElementKind) -> Option<String> {
        None
    }
}

/// Decode a node that stands for exactly one reference
///
/// URIs and literals are taken as they are, except `rdf:nil`. A blank node
/// must carry an `rdf:type` of a known element kind; it is then handed to
/// `resolver`. Anything else yields `None`.
pub fn decode_single_reference<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    node: &Term,
    resolver: &mut dyn InlineResolver,
) -> Option<String> {
    match node {
        Term::NamedNode(n) if *n == ids.rdf_nil() => None,
        Term::NamedNode(_) | Term::Literal(_) => Some(term_string(node)),
        Term::BlankNode(b) => {
            let subject = NamedOrBlankNode::from(b.clone());
            let kind = graph
                .objects_for(&subject, &ids.rdf_type())
                .iter()
                .find_map(|t| match t {
                    Term::NamedNode(n) => ElementKind::from_urn(ids, n.as_str()),
                    _ => None,
                });
            match kind {
                Some(kind) => resolver.materialize(b, kind),
                None => {
                    debug!(node = %b, "Unrecognized element, no known type on blank node");
                    None
                }
            }
        }
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Decode one optional-reference position
///
/// Terminal nodes are required references. A blank node holding
/// `content_predicate` is a wrapper whose `samm:optional` flag is set only by
/// the canonical `true` literal. Any other blank node is tried as an inline
/// element.
pub fn decode_optional_reference<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    node: &Term,
    content_predicate: Option<&NamedNode>,
    resolver: &mut dyn InlineResolver,
) -> Option<OptionalReference> {
    if let (Term::BlankNode(b), Some(content_predicate)) = (node, content_predicate) {
        let wrapper = NamedOrBlankNode::from(b.clone());
        let contents = graph.objects_for(&wrapper, content_predicate);
        if let Some(content) = contents.first() {
            let value = decode_single_reference(graph, ids, content, resolver)?;
            let optional = graph
                .objects_for(&wrapper, &ids.optional())
                .iter()
                .any(|t| matches!(t, Term::Literal(l) if *l == ids.true_literal()));
            return Some(OptionalReference { value, optional });
        }
    }
    decode_single_reference(graph, ids, node, resolver).map(OptionalReference::required)
}

/// Decode a reference field that may be a single node or an RDF collection
///
/// A terminal `start` is a one-element collection, `rdf:nil` an empty one.
/// The chain walk stops at a missing `rdf:rest`, at `rdf:nil` or at any
/// non-blank successor.
pub fn decode_reference_or_collection<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    start: &Term,
    content_predicate: Option<&NamedNode>,
    resolver: &mut dyn InlineResolver,
) -> Vec<OptionalReference> {
    let mut result = Vec::new();

    let mut current = match start {
        Term::NamedNode(n) if *n == ids.rdf_nil() => return result,
        Term::BlankNode(b) => b.clone(),
        _ => {
            if is_terminal(start) {
                result.push(OptionalReference::required(term_string(start)));
            }
            return result;
        }
    };

    let first = ids.rdf_first();
    let rest = ids.rdf_rest();
    let mut seen: HashSet<BlankNode> = HashSet::new();

    loop {
        if !seen.insert(current.clone()) {
            debug!(node = %current, "Collection chain loops back on itself");
            break;
        }
        let cell = NamedOrBlankNode::from(current.clone());

        if let Some(item) = graph.objects_for(&cell, &first).first() {
            match decode_optional_reference(graph, ids, item, content_predicate, resolver) {
                Some(reference) => result.push(reference),
                None => trace!(node = %current, "Skipping undecodable collection entry"),
            }
        }

        match graph.objects_for(&cell, &rest).into_iter().next() {
            Some(Term::BlankNode(next)) => current = next,
            _ => break,
        }
    }

    result
}

/// Term for a stored identifier or plain value
///
/// Prefixed names are expanded through `namespaces`; absolute IRIs become URI
/// nodes; everything else is written as a plain literal.
pub fn term_for_value(value: &str, namespaces: &NamespaceMap) -> Term {
    let iri = match classify_id(value, namespaces) {
        IdKind::Prefixed => namespaces.expand(value),
        IdKind::Absolute => Some(value.to_string()),
        IdKind::Blank | IdKind::Literal => None,
    };
    match iri.and_then(|iri| NamedNode::new(iri).ok()) {
        Some(node) => node.into(),
        None => Literal::new_simple_literal(value).into(),
    }
}

/// Encode a list front to back as an RDF collection and return its head
///
/// `content_fn` produces the `rdf:first` object of each cell. An empty list
/// encodes as `rdf:nil`.
pub fn encode_collection<G, T, F>(graph: &mut G, ids: &IdSet, values: &[T], mut content_fn: F) -> Term
where
    G: TripleGraph + ?Sized,
    F: FnMut(&mut G, &T) -> Term,
{
    if values.is_empty() {
        return ids.rdf_nil().into();
    }

    let cells: Vec<BlankNode> = values.iter().map(|_| graph.create_blank_node()).collect();
    for (i, value) in values.iter().enumerate() {
        let cell = NamedOrBlankNode::from(cells[i].clone());
        let content = content_fn(&mut *graph, value);
        graph.assert_triple(cell.clone(), ids.rdf_first(), content);
        let next: Term = match cells.get(i + 1) {
            Some(next) => next.clone().into(),
            None => ids.rdf_nil().into(),
        };
        graph.assert_triple(cell, ids.rdf_rest(), next);
    }
    cells[0].clone().into()
}

/// Encode one optional reference
///
/// Required references are written as the referenced node itself; optional
/// ones as an anonymous wrapper with `content_predicate` and `samm:optional`.
pub fn encode_optional_reference<G: TripleGraph + ?Sized>(
    graph: &mut G,
    ids: &IdSet,
    namespaces: &NamespaceMap,
    reference: &OptionalReference,
    content_predicate: &NamedNode,
) -> Term {
    let target = term_for_value(&reference.value, namespaces);
    if !reference.optional {
        return target;
    }
    let wrapper = graph.create_blank_node();
    let subject = NamedOrBlankNode::from(wrapper.clone());
    graph.assert_triple(subject.clone(), content_predicate.clone(), target);
    graph.assert_triple(subject, ids.optional(), ids.true_literal().into());
    wrapper.into()
}
