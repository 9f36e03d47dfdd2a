//! Containers and the identifier lookup store
//!
//! Each decoded record is persisted as a [`ConceptDescription`] whose
//! [`Extension`] carries the element: the type URN as marker and the field
//! payload as serialized JSON. [`LookupStore`] scans the containers once and
//! indexes the decoded records by identifier.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::descriptor::ElementKind;
use crate::element::{LangString, ModelElement};
use crate::error::{Result, SammError};
use crate::vocab::{IdSet, SammVersion};

/// Opaque payload attached to a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Type marker: the element kind's version-specific URN
    pub name: String,
    /// Serialized field data
    pub value: String,
}

/// Identified container for one model element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDescription {
    pub id: String,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

/// Source of containers for the lookup store and target of imports
pub trait ContainerStore {
    fn find_by_id(&self, id: &str) -> Option<&ConceptDescription>;

    /// Add a container, replacing any with the same id
    fn add(&mut self, container: ConceptDescription);

    fn containers(&self) -> Box<dyn Iterator<Item = &ConceptDescription> + '_>;
}

/// In-memory document holding concept descriptions in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(with = "container_list")]
    concept_descriptions: IndexMap<String, ConceptDescription>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.concept_descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concept_descriptions.is_empty()
    }
}

impl ContainerStore for Environment {
    fn find_by_id(&self, id: &str) -> Option<&ConceptDescription> {
        self.concept_descriptions.get(id)
    }

    fn add(&mut self, container: ConceptDescription) {
        self.concept_descriptions
            .insert(container.id.clone(), container);
    }

    fn containers(&self) -> Box<dyn Iterator<Item = &ConceptDescription> + '_> {
        Box::new(self.concept_descriptions.values())
    }
}

/// Environment serializes its containers as a plain list
mod container_list {
    use super::ConceptDescription;
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &IndexMap<String, ConceptDescription>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, ConceptDescription>, D::Error> {
        let list = Vec::<ConceptDescription>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|cd| (cd.id.clone(), cd)).collect())
    }
}

/// One identified model element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRecord {
    pub id: String,
    pub id_short: String,
    pub description: Vec<LangString>,
    pub element: ModelElement,
    /// Release whose URN table produced the type marker
    pub version: SammVersion,
}

impl IdentifierRecord {
    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }
}

/// Encode a record's element as a container extension
pub fn encode_payload(element: &ModelElement, ids: &IdSet) -> Result<Extension> {
    let payload = element.to_payload()?;
    Ok(Extension {
        name: element.kind().urn(ids),
        value: serde_json::to_string(&payload)?,
    })
}

/// Decode a container extension back into an element and its release
pub fn decode_payload(extension: &Extension) -> Result<(ModelElement, SammVersion)> {
    let (kind, ids) = ElementKind::from_any_urn(&extension.name)
        .ok_or_else(|| SammError::UnknownTypeMarker(extension.name.clone()))?;
    let payload: serde_json::Value = serde_json::from_str(&extension.value)?;
    let element = ModelElement::from_payload(kind, &payload)?;
    Ok((element, ids.version))
}

/// Wrap a record into its container
pub fn to_container(record: &IdentifierRecord) -> Result<ConceptDescription> {
    let ids = IdSet::for_version(record.version);
    Ok(ConceptDescription {
        id: record.id.clone(),
        id_short: record.id_short.clone(),
        description: record.description.clone(),
        extensions: vec![encode_payload(&record.element, &ids)?],
    })
}

/// Read-only index from identifier to decoded record
#[derive(Debug, Default)]
pub struct LookupStore {
    records: HashMap<String, IdentifierRecord>,
}

impl LookupStore {
    /// Decode every container once
    ///
    /// Containers without a recognizable payload are skipped; a payload that
    /// fails to decode is logged and skipped.
    pub fn build(containers: &dyn ContainerStore) -> Self {
        let mut records = HashMap::new();
        let mut skipped = 0usize;

        for container in containers.containers() {
            let decoded = container.extensions.iter().find_map(|ext| {
                match decode_payload(ext) {
                    Ok(decoded) => Some(decoded),
                    Err(SammError::UnknownTypeMarker(_)) => None,
                    Err(e) => {
                        warn!(id = %container.id, error = %e, "Failed to decode element payload");
                        None
                    }
                }
            });

            let Some((element, version)) = decoded else {
                skipped += 1;
                continue;
            };

            records.insert(
                container.id.clone(),
                IdentifierRecord {
                    id: container.id.clone(),
                    id_short: container.id_short.clone(),
                    description: container.description.clone(),
                    element,
                    version,
                },
            );
        }

        debug!(records = records.len(), skipped, "Built lookup store");
        Self { records }
    }

    pub fn lookup(&self, id: &str) -> Option<&IdentifierRecord> {
        self.records.get(id)
    }

    /// Lookup that also requires the element to be of `kind`
    pub fn lookup_typed(&self, id: &str, kind: ElementKind) -> Option<&IdentifierRecord> {
        self.lookup_matching(id, |k| k == kind)
    }

    pub fn lookup_matching(
        &self,
        id: &str,
        accept: impl Fn(ElementKind) -> bool,
    ) -> Option<&IdentifierRecord> {
        self.lookup(id).filter(|r| accept(r.kind()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
