//! Triple graph access and Turtle I/O
//!
//! The codecs only see the [`TripleGraph`] trait. [`oxrdf::Graph`] implements
//! it; Turtle text goes in and out through `oxttl`.

use oxrdf::{BlankNode, Graph, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use oxttl::{TurtleParser, TurtleSerializer};
use tracing::{debug, warn};

use crate::error::{Result, SammError};
use crate::id::NamespaceMap;

/// Graph operations needed by import and export
pub trait TripleGraph {
    /// Objects of every triple with the given subject and predicate
    fn objects_for(&self, subject: &NamedOrBlankNode, predicate: &NamedNode) -> Vec<Term>;

    /// Subject and object of every triple with the given predicate
    fn subjects_with(&self, predicate: &NamedNode) -> Vec<(NamedOrBlankNode, Term)>;

    /// Add a triple; returns false if it was already present
    fn assert_triple(&mut self, subject: NamedOrBlankNode, predicate: NamedNode, object: Term)
        -> bool;

    fn create_blank_node(&mut self) -> BlankNode {
        BlankNode::default()
    }

    fn create_uri_node(&self, uri: &str) -> Result<NamedNode> {
        NamedNode::new(uri).map_err(|e| SammError::InvalidIri {
            iri: uri.to_string(),
            reason: e.to_string(),
        })
    }

    /// Literal with either a language tag or a datatype
    fn create_literal_node(
        &self,
        text: &str,
        language: Option<&str>,
        datatype: Option<&NamedNode>,
    ) -> Term {
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            match Literal::new_language_tagged_literal(text, lang) {
                Ok(literal) => return literal.into(),
                Err(e) => warn!(language = lang, error = %e, "Dropping invalid language tag"),
            }
        }
        match datatype {
            Some(dt) => Literal::new_typed_literal(text, dt.clone()).into(),
            None => Literal::new_simple_literal(text).into(),
        }
    }
}

impl TripleGraph for Graph {
    fn objects_for(&self, subject: &NamedOrBlankNode, predicate: &NamedNode) -> Vec<Term> {
        self.objects_for_subject_predicate(subject, predicate)
            .map(|t| t.into_owned())
            .collect()
    }

    fn subjects_with(&self, predicate: &NamedNode) -> Vec<(NamedOrBlankNode, Term)> {
        self.triples_for_predicate(predicate)
            .map(|t| (t.subject.into_owned(), t.object.into_owned()))
            .collect()
    }

    fn assert_triple(
        &mut self,
        subject: NamedOrBlankNode,
        predicate: NamedNode,
        object: Term,
    ) -> bool {
        self.insert(&Triple::new(subject, predicate, object))
    }
}

/// Whether a term is a URI or literal, as opposed to a blank node
pub fn is_terminal(term: &Term) -> bool {
    matches!(term, Term::NamedNode(_) | Term::Literal(_))
}

/// String form of a term: the IRI, the literal's lexical value or `_:label`
pub fn term_string(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.as_str().to_string(),
        Term::Literal(l) => l.value().to_string(),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

/// Result of parsing one Turtle document
#[derive(Debug, Default)]
pub struct ParsedTurtle {
    pub graph: Graph,
    /// Declared prefixes in document order
    pub prefixes: NamespaceMap,
    /// Leading `#` comment lines, verbatim
    pub comments: Vec<String>,
}

/// Parse Turtle text into a graph plus its declared prefixes
pub fn parse_turtle(content: &str, source_name: &str) -> Result<ParsedTurtle> {
    let mut graph = Graph::default();
    let mut parser = TurtleParser::new().for_slice(content.as_bytes());

    for result in parser.by_ref() {
        let triple = result.map_err(|e| SammError::Syntax {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        graph.insert(&triple);
    }

    let declared: Vec<(String, String)> = parser
        .prefixes()
        .map(|(p, iri)| (p.to_string(), iri.to_string()))
        .collect();

    let mut prefixes = NamespaceMap::new();
    for (prefix, iri) in order_by_declaration(content, declared) {
        if let Err(e) = prefixes.insert(prefix.as_str(), iri.as_str()) {
            warn!(prefix = %prefix, error = %e, "Skipping unusable prefix declaration");
        }
    }

    debug!(
        source = source_name,
        triples = graph.len(),
        prefixes = prefixes.len(),
        "Parsed Turtle document"
    );

    Ok(ParsedTurtle {
        graph,
        prefixes,
        comments: header_comments(content),
    })
}

/// Sort parser-reported prefixes by where they are declared in the text
fn order_by_declaration(content: &str, mut declared: Vec<(String, String)>) -> Vec<(String, String)> {
    let order: Vec<String> = content.lines().filter_map(declared_prefix).collect();
    declared.sort_by_key(|(prefix, _)| {
        (
            order.iter().position(|p| p == prefix).unwrap_or(usize::MAX),
            prefix.clone(),
        )
    });
    declared
}

fn declared_prefix(line: &str) -> Option<String> {
    let line = line.trim_start();
    let rest = if let Some(rest) = line.strip_prefix("@prefix") {
        rest
    } else if line.get(..6).is_some_and(|kw| kw.eq_ignore_ascii_case("PREFIX")) {
        &line[6..]
    } else {
        return None;
    };
    let name = rest.trim_start().split_once(':')?.0;
    Some(name.trim().to_string())
}

/// Leading comment lines of a Turtle document
///
/// Blank lines between comments are skipped; the first statement line ends
/// the header.
pub fn header_comments(content: &str) -> Vec<String> {
    let mut comments = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('#') {
            break;
        }
        comments.push(line.trim_end().to_string());
    }
    comments
}

/// Serialize a graph as Turtle, prefixes from `namespaces`, comments on top
///
/// The `@prefix` lines are written in map order ahead of the body. Triples
/// are written sorted so that the output is stable across runs.
pub fn serialize_turtle(graph: &Graph, namespaces: &NamespaceMap, comments: &[String]) -> Result<String> {
    let mut serializer = TurtleSerializer::new();
    for (prefix, uri) in namespaces.iter() {
        serializer = serializer
            .with_prefix(prefix, uri)
            .map_err(|e| SammError::InvalidIri {
                iri: uri.to_string(),
                reason: e.to_string(),
            })?;
    }

    let mut triples: Vec<Triple> = graph.iter().map(|t| t.into_owned()).collect();
    triples.sort_by_cached_key(|t| (t.subject.to_string(), t.predicate.to_string(), t.object.to_string()));

    let mut writer = serializer.for_writer(Vec::new());
    for triple in &triples {
        writer.serialize_triple(triple)?;
    }
    let body = writer.finish()?;
    let body = String::from_utf8_lossy(&body);

    let mut output = String::new();
    for comment in comments {
        output.push_str(comment);
        output.push('\n');
    }
    if !comments.is_empty() {
        output.push('\n');
    }
    for (prefix, uri) in namespaces.iter() {
        output.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
    }
    if !namespaces.is_empty() {
        output.push('\n');
    }
    output.push_str(skip_prefix_header(&body));
    Ok(output)
}

/// The serializer's own prefix block, if any, is dropped in favour of the
/// ordered one
fn skip_prefix_header(body: &str) -> &str {
    let mut rest = body;
    loop {
        let line_end = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let line = &rest[..line_end];
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("@prefix") {
            return rest;
        }
        if line_end == rest.len() {
            return &rest[line_end..];
        }
        rest = &rest[line_end..];
    }
}
