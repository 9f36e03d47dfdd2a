//! SAMM Import/Export Library
//!
//! This library converts Semantic Aspect Meta Model (SAMM) documents between
//! their RDF/Turtle form and a typed, self-describing model of elements, and
//! derives submodel templates from Aspects.
//!
//! # Overview
//!
//! A SAMM document is a graph of model elements (Aspects, Properties,
//! Characteristics, Entities, Constraints, ...). The library:
//!
//! 1. Detects the meta model release (BAMM 1.0, SAMM 2.x) from the document
//! 2. Decodes every typed subject field by field using static descriptor tables
//! 3. Promotes inline (blank node) elements to records with minted identifiers
//! 4. Stores each record as a container with a typed extension payload
//! 5. Exports an Aspect and everything it reaches back to Turtle
//! 6. Transforms an Aspect into a tree of submodel elements with qualifiers
//!
//! # Usage
//!
//! ## Round trip a document
//!
//! ```ignore
//! use samm_bridge::{export_document, import_document, ExportOptions, ImportOptions};
//!
//! let ttl = std::fs::read_to_string("Movement.ttl")?;
//! let document = import_document(&ttl, &ImportOptions::default())?;
//! let aspect_id = document.aspect_id.clone().ok_or(samm_bridge::SammError::MissingAspect)?;
//!
//! let turtle = export_document(&document.environment, &aspect_id, &ExportOptions::default())?;
//! println!("{}", turtle);
//! ```
//!
//! ## Derive a submodel template
//!
//! ```ignore
//! use samm_bridge::{transform_to_submodel, LookupStore, TransformOptions};
//!
//! let store = LookupStore::build(&document.environment);
//! let template = transform_to_submodel(&store, &aspect_id, &TransformOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&template)?);
//! ```

pub mod codec;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod export;
pub mod graph;
pub mod id;
pub mod import;
pub mod store;
pub mod transform;
pub mod vocab;

// Re-export main types for convenience
pub use crate::descriptor::{describe, ElementKind, FieldDescriptor, FieldKind};
pub use crate::element::{
    FieldValue, LangString, ModelElement, OptionalReference, Reference, ScalarValue,
};
pub use crate::error::{Result, SammError};
pub use crate::export::{export_document, export_element, export_graph, ExportContext, ExportOptions};
pub use crate::graph::{parse_turtle, serialize_turtle, ParsedTurtle, TripleGraph};
pub use crate::id::NamespaceMap;
pub use crate::import::{
    import_document, import_file, import_parsed, import_subject, ImportOptions, ImportedDocument,
};
pub use crate::store::{
    ConceptDescription, ContainerStore, Environment, Extension, IdentifierRecord, LookupStore,
};
pub use crate::transform::{
    transform, transform_to_submodel, transform_with, Cardinality, Qualifier,
    SubmodelElementKind, SubmodelElementNode, SubmodelTemplate, TransformOptions, ValueType,
};
pub use crate::vocab::{IdSet, SammVersion};
