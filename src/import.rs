//! Model element import
//!
//! Rebuilds typed [`ModelElement`]s from a triple graph field by field, using
//! the descriptor tables to pick a decode strategy per field. Import is best
//! effort: a field that fails to decode keeps its default, an unrecognized
//! subject is skipped, and neither aborts the document.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use oxrdf::{BlankNode, NamedNode, NamedOrBlankNode, Term, TermRef};
use tracing::{debug, info, warn};

use crate::codec::{
    decode_optional_reference, decode_reference_or_collection, decode_single_reference,
    InlineResolver,
};
use crate::descriptor::{describe, fields, ElementKind, FieldDescriptor, LiteralType};
use crate::element::{
    FieldValue, LangString, ModelElement, OptionalReference, Reference, ScalarValue,
};
use crate::error::Result;
use crate::graph::{parse_turtle, term_string, ParsedTurtle, TripleGraph};
use crate::id::{local_name, AutoNamer, NamespaceMap};
use crate::store::{to_container, ContainerStore, Environment, IdentifierRecord};
use crate::vocab::IdSet;

/// Namespace used to mint identifiers when a document declares none
const FALLBACK_BASE: &str = "urn:samm:anonymous.elements:1.0.0#";

/// Options for document import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Store leading `#` lines on the Aspect's comments field
    pub keep_comments: bool,
    /// Vocabulary to use instead of detecting it from the document
    pub id_set: Option<IdSet>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            keep_comments: true,
            id_set: None,
        }
    }
}

/// Decode the subject typed by `type_node`
///
/// Returns `None` when `type_node` is not a known element URN of `ids`.
pub fn import_subject<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    subject: &NamedOrBlankNode,
    type_node: &Term,
    resolver: &mut dyn InlineResolver,
) -> Option<ModelElement> {
    let kind = match type_node {
        Term::NamedNode(n) => ElementKind::from_urn(ids, n.as_str()),
        _ => None,
    };
    match kind {
        Some(kind) => Some(import_element(graph, ids, subject, kind, resolver)),
        None => {
            debug!(subject = %subject, type_node = %type_node, "Unrecognized element type");
            None
        }
    }
}

/// Decode every field of `subject` as an element of `kind`
pub fn import_element<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    subject: &NamedOrBlankNode,
    kind: ElementKind,
    resolver: &mut dyn InlineResolver,
) -> ModelElement {
    let mut element = ModelElement::new(kind);

    for descriptor in describe(kind) {
        let Some(predicate) = descriptor.predicate else {
            continue;
        };
        let predicate = ids.node(predicate);
        let objects = graph.objects_for(subject, &predicate);
        if objects.is_empty() {
            continue;
        }

        let Some(slot) = element.get_mut(descriptor.name) else {
            continue;
        };
        for object in &objects {
            if let Err(reason) = decode_field(graph, ids, descriptor, object, slot, resolver) {
                warn!(
                    subject = %subject,
                    field = descriptor.name,
                    value = %object,
                    reason,
                    "Skipping undecodable field value"
                );
            }
        }
    }

    element
}

/// Fold one triple object into a field value
fn decode_field<G: TripleGraph + ?Sized>(
    graph: &G,
    ids: &IdSet,
    descriptor: &FieldDescriptor,
    object: &Term,
    slot: &mut FieldValue,
    resolver: &mut dyn InlineResolver,
) -> std::result::Result<(), &'static str> {
    let content_predicate: Option<NamedNode> = descriptor.content_predicate.map(|p| ids.node(p));

    match slot {
        FieldValue::StringList(list) => {
            if matches!(object, Term::BlankNode(_)) {
                return Err("blank node where a string was expected");
            }
            list.push(term_string(object));
        }
        FieldValue::LangStringList(list) => match object {
            Term::Literal(l) => list.push(LangString::new(
                l.language().unwrap_or_default(),
                l.value(),
            )),
            _ => return Err("language string must be a literal"),
        },
        FieldValue::ReferenceList(list) => {
            match decode_single_reference(graph, ids, object, resolver) {
                Some(value) => list.push(Reference(value)),
                None => list.extend(
                    decode_reference_or_collection(graph, ids, object, None, resolver)
                        .into_iter()
                        .map(|r| Reference(r.value)),
                ),
            }
        }
        FieldValue::OptionalReferenceList(list) => {
            match decode_single_reference(graph, ids, object, resolver) {
                Some(value) => list.push(OptionalReference::required(value)),
                None => list.extend(decode_reference_or_collection(
                    graph,
                    ids,
                    object,
                    content_predicate.as_ref(),
                    resolver,
                )),
            }
        }
        FieldValue::Reference(value) => {
            let decoded = decode_single_reference(graph, ids, object, resolver)
                .ok_or("unresolvable reference")?;
            *value = Some(Reference(decoded));
        }
        FieldValue::OptionalReference(value) => {
            let decoded = decode_optional_reference(
                graph,
                ids,
                object,
                content_predicate.as_ref(),
                resolver,
            )
            .ok_or("unresolvable reference")?;
            *value = Some(decoded);
        }
        FieldValue::Scalar(value) => *value = decode_scalar(ids, descriptor, object)?,
        FieldValue::OptionalScalar(value) => {
            *value = Some(decode_scalar(ids, descriptor, object)?)
        }
        FieldValue::Enum(value) => {
            let enum_type = descriptor.enum_type.ok_or("field has no enum type")?;
            let member = enum_type
                .decode(&term_string(object), descriptor.enum_prefix, ids)
                .ok_or("unknown enum member")?;
            *value = Some(member.to_string());
        }
        FieldValue::NamespaceMap(_) => return Err("namespace maps are not carried by triples"),
    }
    Ok(())
}

/// IRIs stay IRIs and typed literals keep their datatype; `xsd:string`
/// and language-tagged literals are read as plain text
fn decode_scalar(
    ids: &IdSet,
    descriptor: &FieldDescriptor,
    object: &Term,
) -> std::result::Result<ScalarValue, &'static str> {
    let scalar = match object {
        Term::NamedNode(node) => ScalarValue::iri(node.as_str()),
        Term::Literal(literal) => {
            let datatype = literal.datatype().as_str();
            if literal.language().is_some()
                || datatype == ids.xsd_string().as_str()
                || datatype == ids.rdf_lang_string()
            {
                ScalarValue::plain(literal.value())
            } else {
                ScalarValue::typed(literal.value(), datatype)
            }
        }
        _ => return Err("scalar must be a literal or IRI"),
    };
    match descriptor.literal {
        LiteralType::Plain => Ok(scalar),
        LiteralType::NonNegativeInteger => scalar
            .value
            .trim()
            .parse::<u64>()
            .map(|n| ScalarValue::plain(n.to_string()))
            .map_err(|_| "not a non-negative integer"),
    }
}

/// Result of importing one Turtle document
#[derive(Debug)]
pub struct ImportedDocument {
    pub id_set: IdSet,
    pub namespaces: NamespaceMap,
    pub comments: Vec<String>,
    /// First Aspect found, if any
    pub aspect_id: Option<String>,
    /// Records in import order: named subjects by IRI, inline elements as
    /// they were promoted
    pub records: Vec<IdentifierRecord>,
    /// The records wrapped as containers
    pub environment: Environment,
}

impl ImportedDocument {
    pub fn record(&self, id: &str) -> Option<&IdentifierRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn aspect(&self) -> Option<&IdentifierRecord> {
        self.aspect_id.as_deref().and_then(|id| self.record(id))
    }
}

/// Import state for one document
///
/// Owns the records created so far and the auto-namer for inline elements.
struct ImportSession<'g, G: TripleGraph + ?Sized> {
    graph: &'g G,
    ids: IdSet,
    records: IndexMap<String, IdentifierRecord>,
    namer: AutoNamer,
    /// Identifiers of named subjects, reserved before any minting
    reserved: HashSet<String>,
    inline: HashMap<BlankNode, String>,
    in_progress: HashSet<BlankNode>,
}

impl<'g, G: TripleGraph + ?Sized> ImportSession<'g, G> {
    fn new(graph: &'g G, ids: IdSet, base: &str, reserved: HashSet<String>) -> Self {
        Self {
            graph,
            ids,
            records: IndexMap::new(),
            namer: AutoNamer::new(base),
            reserved,
            inline: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    fn import_named(&mut self, subject: &NamedNode, type_node: &Term) -> bool {
        if self.records.contains_key(subject.as_str()) {
            return true;
        }
        let graph = self.graph;
        let ids = self.ids.clone();
        let node = NamedOrBlankNode::from(subject.clone());
        let Some(element) = import_subject(graph, &ids, &node, type_node, self) else {
            return false;
        };
        let record = self.make_record(subject.as_str().to_string(), &node, element);
        self.records.insert(record.id.clone(), record);
        true
    }

    fn make_record(
        &self,
        id: String,
        node: &NamedOrBlankNode,
        element: ModelElement,
    ) -> IdentifierRecord {
        let description = self
            .graph
            .objects_for(node, &self.ids.description())
            .into_iter()
            .filter_map(|t| match t {
                Term::Literal(l) => Some(LangString::new(l.language().unwrap_or_default(), l.value())),
                _ => None,
            })
            .collect();

        let declared_name = self.ids.name().and_then(|name| {
            self.graph
                .objects_for(node, &name)
                .into_iter()
                .find_map(|t| match t {
                    Term::Literal(l) => Some(l.value().to_string()),
                    _ => None,
                })
        });
        let id_short = declared_name.unwrap_or_else(|| local_name(&id).to_string());

        IdentifierRecord {
            id,
            id_short,
            description,
            element,
            version: self.ids.version,
        }
    }
}

impl<G: TripleGraph + ?Sized> InlineResolver for ImportSession<'_, G> {
    fn materialize(&mut self, node: &BlankNode, kind: ElementKind) -> Option<String> {
        if let Some(id) = self.inline.get(node) {
            return Some(id.clone());
        }
        if !self.in_progress.insert(node.clone()) {
            debug!(node = %node, "Inline element refers back to itself");
            return None;
        }

        let graph = self.graph;
        let ids = self.ids.clone();
        let subject = NamedOrBlankNode::from(node.clone());
        let element = import_element(graph, &ids, &subject, kind, self);
        self.in_progress.remove(node);

        let records = &self.records;
        let reserved = &self.reserved;
        let id = self
            .namer
            .next_id(|candidate| records.contains_key(candidate) || reserved.contains(candidate));
        debug!(node = %node, id = %id, kind = %kind, "Promoted inline element");

        let record = self.make_record(id.clone(), &subject, element);
        self.inline.insert(node.clone(), id.clone());
        self.records.insert(id.clone(), record);
        Some(id)
    }
}

/// Import a Turtle document held in memory
pub fn import_document(content: &str, options: &ImportOptions) -> Result<ImportedDocument> {
    import_named_document(content, "<input>", options)
}

/// Import a Turtle file from disk
pub fn import_file(path: &Path, options: &ImportOptions) -> Result<ImportedDocument> {
    let content = std::fs::read_to_string(path)?;
    import_named_document(&content, &path.display().to_string(), options)
}

fn import_named_document(
    content: &str,
    source_name: &str,
    options: &ImportOptions,
) -> Result<ImportedDocument> {
    let parsed = parse_turtle(content, source_name)?;
    import_parsed(parsed, options)
}

/// Import an already parsed document
pub fn import_parsed(parsed: ParsedTurtle, options: &ImportOptions) -> Result<ImportedDocument> {
    let ParsedTurtle {
        graph,
        prefixes,
        comments,
    } = parsed;
    let comments = if options.keep_comments {
        comments
    } else {
        Vec::new()
    };

    let ids = options
        .id_set
        .clone()
        .or_else(|| IdSet::detect(&prefixes))
        .or_else(|| {
            IdSet::detect_from_iris(graph.iter().flat_map(|t| {
                let object = match t.object {
                    TermRef::NamedNode(n) => Some(n.as_str()),
                    _ => None,
                };
                std::iter::once(t.predicate.as_str()).chain(object)
            }))
        })
        .unwrap_or_default();
    debug!(version = %ids.version, "Using vocabulary");

    // Named, typed subjects sorted by IRI for a stable record order
    let mut typed: Vec<(NamedNode, Term)> = graph
        .subjects_with(&ids.rdf_type())
        .into_iter()
        .filter_map(|(s, o)| match s {
            NamedOrBlankNode::NamedNode(n) => Some((n, o)),
            _ => None,
        })
        .collect();
    typed.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()).then_with(|| a.1.to_string().cmp(&b.1.to_string())));

    let aspect_urn = ElementKind::Aspect.urn(&ids);
    let base = prefixes
        .get("")
        .map(str::to_string)
        .or_else(|| {
            typed
                .iter()
                .find(|(_, t)| matches!(t, Term::NamedNode(n) if n.as_str() == aspect_urn))
                .and_then(|(s, _)| s.as_str().rfind('#').map(|i| s.as_str()[..=i].to_string()))
        })
        .unwrap_or_else(|| FALLBACK_BASE.to_string());
    let reserved: HashSet<String> = typed.iter().map(|(s, _)| s.as_str().to_string()).collect();

    let mut session = ImportSession::new(&graph, ids, &base, reserved);
    let mut unrecognized = 0usize;
    for (subject, type_node) in &typed {
        if !session.import_named(subject, type_node) {
            unrecognized += 1;
        }
    }
    let ImportSession {
        ids, mut records, ..
    } = session;

    let aspect_id = records
        .values()
        .find(|r| r.kind() == ElementKind::Aspect)
        .map(|r| r.id.clone());

    if let Some(aspect) = aspect_id.as_ref().and_then(|id| records.get_mut(id)) {
        if !comments.is_empty() {
            aspect
                .element
                .set(fields::COMMENTS, FieldValue::StringList(comments.clone()))?;
        }
        if !prefixes.is_empty() {
            aspect
                .element
                .set(fields::NAMESPACES, FieldValue::NamespaceMap(prefixes.clone()))?;
        }
    }

    let mut environment = Environment::new();
    for record in records.values() {
        environment.add(to_container(record)?);
    }

    info!(
        records = records.len(),
        unrecognized,
        aspect = aspect_id.as_deref().unwrap_or("-"),
        "Imported document"
    );

    Ok(ImportedDocument {
        id_set: ids,
        namespaces: prefixes,
        comments,
        aspect_id,
        records: records.into_values().collect(),
        environment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NoInline;
    use crate::vocab::SammVersion;
    use oxrdf::Graph;

    const PREFIXES: &str = r#"
@prefix samm: <urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#> .
@prefix samm-c: <urn:samm:org.eclipse.esmf.samm:characteristic:2.1.0#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix : <urn:samm:com.example:1.0.0#> .
"#;

    fn doc(body: &str) -> String {
        format!("{PREFIXES}\n{body}")
    }

    #[test]
    fn test_property_with_example_value() {
        let document = import_document(
            &doc(":p a samm:Property ; samm:exampleValue \"42\" ."),
            &ImportOptions::default(),
        )
        .unwrap();
        let record = document.record("urn:samm:com.example:1.0.0#p").unwrap();
        assert_eq!(record.kind(), ElementKind::Property);
        assert_eq!(record.element.scalar(fields::EXAMPLE_VALUE), Some("42"));
        assert_eq!(record.id_short, "p");
        assert_eq!(document.id_set.version, SammVersion::Samm2_1_0);
    }

    #[test]
    fn test_scalars_keep_iri_and_datatype() {
        let document = import_document(
            &doc(
                r#":Light a samm-c:State ; samm-c:defaultValue :Green .
:count a samm:Property ; samm:exampleValue "42"^^xsd:int .
:label a samm:Property ; samm:exampleValue "plain"^^xsd:string ."#,
            ),
            &ImportOptions::default(),
        )
        .unwrap();
        let light = document.record("urn:samm:com.example:1.0.0#Light").unwrap();
        assert_eq!(
            light.element.scalar_value(fields::DEFAULT_VALUE),
            Some(&ScalarValue::iri("urn:samm:com.example:1.0.0#Green"))
        );
        let count = document.record("urn:samm:com.example:1.0.0#count").unwrap();
        assert_eq!(
            count.element.scalar_value(fields::EXAMPLE_VALUE),
            Some(&ScalarValue::typed("42", "http://www.w3.org/2001/XMLSchema#int"))
        );
        let label = document.record("urn:samm:com.example:1.0.0#label").unwrap();
        assert_eq!(
            label.element.scalar_value(fields::EXAMPLE_VALUE),
            Some(&ScalarValue::plain("plain"))
        );
    }

    #[test]
    fn test_import_subject_unknown_type_is_none() {
        let parsed = parse_turtle(&doc(":x a :Unknown ."), "t.ttl").unwrap();
        let ids = IdSet::for_version(SammVersion::Samm2_1_0);
        let subject = NamedOrBlankNode::from(NamedNode::new_unchecked("urn:samm:com.example:1.0.0#x"));
        let type_node: Term = NamedNode::new_unchecked("urn:samm:com.example:1.0.0#Unknown").into();
        assert!(import_subject(&parsed.graph, &ids, &subject, &type_node, &mut NoInline).is_none());
    }

    #[test]
    fn test_aspect_properties_with_optional_entries() {
        let document = import_document(
            &doc(
                r#":Movement a samm:Aspect ;
   samm:preferredName "movement"@en ;
   samm:description "Vehicle movement"@en ;
   samm:properties ( :speed [ samm:property :position ; samm:optional true ] ) ;
   samm:operations ( ) ;
   samm:events ( ) ."#,
            ),
            &ImportOptions::default(),
        )
        .unwrap();
        let aspect = document.aspect().unwrap();
        assert_eq!(
            aspect.element.references(fields::PROPERTIES),
            vec![
                OptionalReference::required("urn:samm:com.example:1.0.0#speed"),
                OptionalReference::new("urn:samm:com.example:1.0.0#position", true),
            ]
        );
        assert!(aspect.element.references(fields::OPERATIONS).is_empty());
        assert_eq!(aspect.description, vec![LangString::new("en", "Vehicle movement")]);
        assert_eq!(
            aspect.element.lang_strings(fields::PREFERRED_NAME),
            &[LangString::new("en", "movement")]
        );
        assert_eq!(
            aspect.element.namespaces().unwrap().get("samm-c"),
            Some("urn:samm:org.eclipse.esmf.samm:characteristic:2.1.0#")
        );
    }

    #[test]
    fn test_inline_constraint_is_promoted() {
        let document = import_document(
            &doc(
                r#":Code a samm-c:Trait ;
   samm-c:baseCharacteristic samm-c:Text ;
   samm-c:constraint [ a samm-c:RegularExpressionConstraint ; samm:value "[A-Z]{3}" ] ."#,
            ),
            &ImportOptions::default(),
        )
        .unwrap();
        let trait_record = document.record("urn:samm:com.example:1.0.0#Code").unwrap();
        let constraints = trait_record.element.references(fields::CONSTRAINT);
        assert_eq!(constraints.len(), 1);
        assert_eq!(
            constraints[0].value,
            "urn:samm:com.example:1.0.0#AutoElement1"
        );
        let constraint = document.record(&constraints[0].value).unwrap();
        assert_eq!(constraint.kind(), ElementKind::RegularExpressionConstraint);
        assert_eq!(constraint.element.scalar(fields::VALUE), Some("[A-Z]{3}"));
        assert_eq!(constraint.id_short, "AutoElement1");
    }

    #[test]
    fn test_minted_names_skip_declared_subjects() {
        let document = import_document(
            &doc(
                r#":AutoElement1 a samm:Property .
:Code a samm-c:Trait ;
   samm-c:constraint ( [ a samm-c:LanguageConstraint ; samm-c:languageCode "de" ] ) ."#,
            ),
            &ImportOptions::default(),
        )
        .unwrap();
        let code = document.record("urn:samm:com.example:1.0.0#Code").unwrap();
        assert_eq!(
            code.element.references(fields::CONSTRAINT)[0].value,
            "urn:samm:com.example:1.0.0#AutoElement2"
        );
    }

    #[test]
    fn test_bad_numeric_scalar_keeps_default() {
        let document = import_document(
            &doc(r#":Len a samm-c:LengthConstraint ; samm-c:minValue "-3" ; samm-c:maxValue "10"^^xsd:nonNegativeInteger ."#),
            &ImportOptions::default(),
        )
        .unwrap();
        let record = document.record("urn:samm:com.example:1.0.0#Len").unwrap();
        assert_eq!(record.element.scalar(fields::MIN_VALUE), None);
        assert_eq!(record.element.scalar(fields::MAX_VALUE), Some("10"));
    }

    #[test]
    fn test_enum_field_decoding() {
        let document = import_document(
            &doc(r#":Range a samm-c:RangeConstraint ; samm-c:minValue "0" ; samm-c:lowerBoundDefinition samm-c:AT_LEAST ; samm-c:upperBoundDefinition samm-c:SIDEWAYS ."#),
            &ImportOptions::default(),
        )
        .unwrap();
        let record = document.record("urn:samm:com.example:1.0.0#Range").unwrap();
        assert_eq!(record.element.scalar(fields::LOWER_BOUND), Some("AT_LEAST"));
        assert_eq!(record.element.scalar(fields::UPPER_BOUND), None);
    }

    #[test]
    fn test_bamm_name_becomes_id_short() {
        let content = r#"
@prefix bamm: <urn:bamm:io.openmanufacturing:meta-model:1.0.0#> .
@prefix : <urn:bamm:com.example:1.0.0#> .
:speed a bamm:Property ; bamm:name "vehicleSpeed" .
"#;
        let document = import_document(content, &ImportOptions::default()).unwrap();
        let record = document.record("urn:bamm:com.example:1.0.0#speed").unwrap();
        assert_eq!(record.id_short, "vehicleSpeed");
        assert_eq!(document.id_set.version, SammVersion::Bamm1_0_0);
    }

    #[test]
    fn test_forced_vocabulary_ignores_other_versions() {
        let options = ImportOptions {
            id_set: Some(IdSet::for_version(SammVersion::Samm2_0_0)),
            ..ImportOptions::default()
        };
        let document = import_document(&doc(":p a samm:Property ."), &options).unwrap();
        assert!(document.records.is_empty());
        assert!(document.aspect_id.is_none());
    }

    #[test]
    fn test_version_detected_from_terms_without_prefixes() {
        let mut graph = Graph::default();
        let ids = IdSet::for_version(SammVersion::Samm2_2_0);
        graph.assert_triple(
            NamedNode::new_unchecked("urn:x:1.0.0#p").into(),
            ids.rdf_type(),
            NamedNode::new_unchecked(ElementKind::Property.urn(&ids)).into(),
        );
        let parsed = ParsedTurtle {
            graph,
            ..ParsedTurtle::default()
        };
        let document = import_parsed(parsed, &ImportOptions::default()).unwrap();
        assert_eq!(document.id_set.version, SammVersion::Samm2_2_0);
        assert_eq!(document.records.len(), 1);
        assert_eq!(document.environment.len(), 1);
    }
}
