//! Aspect to submodel transformation
//!
//! Walks an Aspect's properties through the lookup store and derives a tree
//! of submodel elements: scalar properties, multi-language properties and
//! nested collections or lists for Entity-typed properties. Structural facts
//! found on the way (cardinality, default and example values, allowed-value
//! patterns, required languages) become qualifiers on the nodes.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::descriptor::{fields, ElementKind};
use crate::element::{LangString, OptionalReference};
use crate::error::{Result, SammError};
use crate::id::local_name;
use crate::store::{IdentifierRecord, LookupStore};
use crate::vocab::{SammVersion, RDF_NS, XSD_NS};

/// Primitive value types of scalar submodel properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueType {
    #[serde(rename = "xs:string")]
    String,
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:decimal")]
    Decimal,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:float")]
    Float,
    #[serde(rename = "xs:byte")]
    Byte,
    #[serde(rename = "xs:short")]
    Short,
    #[serde(rename = "xs:int")]
    Int,
    #[serde(rename = "xs:long")]
    Long,
    #[serde(rename = "xs:unsignedByte")]
    UnsignedByte,
    #[serde(rename = "xs:unsignedShort")]
    UnsignedShort,
    #[serde(rename = "xs:unsignedInt")]
    UnsignedInt,
    #[serde(rename = "xs:unsignedLong")]
    UnsignedLong,
    #[serde(rename = "xs:positiveInteger")]
    PositiveInteger,
    #[serde(rename = "xs:nonNegativeInteger")]
    NonNegativeInteger,
    #[serde(rename = "xs:negativeInteger")]
    NegativeInteger,
    #[serde(rename = "xs:nonPositiveInteger")]
    NonPositiveInteger,
    #[serde(rename = "xs:date")]
    Date,
    #[serde(rename = "xs:time")]
    Time,
    #[serde(rename = "xs:dateTime")]
    DateTime,
    #[serde(rename = "xs:duration")]
    Duration,
    #[serde(rename = "xs:gYear")]
    GYear,
    #[serde(rename = "xs:gMonth")]
    GMonth,
    #[serde(rename = "xs:gDay")]
    GDay,
    #[serde(rename = "xs:gYearMonth")]
    GYearMonth,
    #[serde(rename = "xs:gMonthDay")]
    GMonthDay,
    #[serde(rename = "xs:hexBinary")]
    HexBinary,
    #[serde(rename = "xs:base64Binary")]
    Base64Binary,
    #[serde(rename = "xs:anyURI")]
    AnyUri,
}

impl ValueType {
    /// Map an XSD local name such as `int` or `dateTimeStamp`
    pub fn from_xsd_name(name: &str) -> Option<ValueType> {
        let value_type = match name {
            "string" => ValueType::String,
            "boolean" => ValueType::Boolean,
            "decimal" => ValueType::Decimal,
            "integer" => ValueType::Integer,
            "double" => ValueType::Double,
            "float" => ValueType::Float,
            "byte" => ValueType::Byte,
            "short" => ValueType::Short,
            "int" => ValueType::Int,
            "long" => ValueType::Long,
            "unsignedByte" => ValueType::UnsignedByte,
            "unsignedShort" => ValueType::UnsignedShort,
            "unsignedInt" => ValueType::UnsignedInt,
            "unsignedLong" => ValueType::UnsignedLong,
            "positiveInteger" => ValueType::PositiveInteger,
            "nonNegativeInteger" => ValueType::NonNegativeInteger,
            "negativeInteger" => ValueType::NegativeInteger,
            "nonPositiveInteger" => ValueType::NonPositiveInteger,
            "date" => ValueType::Date,
            "time" => ValueType::Time,
            "dateTime" | "dateTimeStamp" => ValueType::DateTime,
            "duration" | "dayTimeDuration" | "yearMonthDuration" => ValueType::Duration,
            "gYear" => ValueType::GYear,
            "gMonth" => ValueType::GMonth,
            "gDay" => ValueType::GDay,
            "gYearMonth" => ValueType::GYearMonth,
            "gMonthDay" => ValueType::GMonthDay,
            "hexBinary" => ValueType::HexBinary,
            "base64Binary" => ValueType::Base64Binary,
            "anyURI" => ValueType::AnyUri,
            _ => return None,
        };
        Some(value_type)
    }

    /// Value type for a characteristic's data type URI; string when unmapped
    pub fn from_data_type(data_type: Option<&str>) -> ValueType {
        let Some(data_type) = data_type else {
            return ValueType::String;
        };
        let mapped = data_type
            .strip_prefix(XSD_NS)
            .or_else(|| data_type.strip_prefix("xsd:"))
            .and_then(ValueType::from_xsd_name);
        match mapped {
            Some(value_type) => value_type,
            None => {
                debug!(data_type, "Unmapped data type, using xs:string");
                ValueType::String
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    One,
    ZeroToOne,
    OneToMany,
    ZeroToMany,
}

/// Derived structural annotation on a submodel element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Qualifier {
    Cardinality(Cardinality),
    DefaultValue(String),
    ExampleValue(String),
    /// Regular expression every value has to match
    AllowedValue(String),
    RequiredLang(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "modelType")]
pub enum SubmodelElementKind {
    Property {
        #[serde(rename = "valueType")]
        value_type: ValueType,
    },
    MultiLanguageProperty,
    SubmodelElementCollection,
    SubmodelElementList {
        #[serde(rename = "orderRelevant")]
        order_relevant: bool,
    },
}

/// Node of the transformation output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelElementNode {
    #[serde(flatten)]
    pub kind: SubmodelElementKind,
    pub id_short: String,
    pub semantic_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SubmodelElementNode>,
}

impl SubmodelElementNode {
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.qualifiers.iter().find_map(|q| match q {
            Qualifier::Cardinality(c) => Some(*c),
            _ => None,
        })
    }
}

/// Submodel template derived from one Aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelTemplate {
    pub id_short: String,
    pub semantic_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    pub elements: Vec<SubmodelElementNode>,
}

/// Options for the transformation
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Maximum Entity nesting below the Aspect
    pub max_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

/// Transform an Aspect's properties with default options
pub fn transform(store: &LookupStore, aspect: &IdentifierRecord) -> Vec<SubmodelElementNode> {
    transform_with(store, aspect, &TransformOptions::default())
}

/// Transform an Aspect's properties
///
/// Property references that do not resolve are left out of the result.
pub fn transform_with(
    store: &LookupStore,
    aspect: &IdentifierRecord,
    options: &TransformOptions,
) -> Vec<SubmodelElementNode> {
    let mut walker = Walker {
        store,
        options,
        on_path: HashSet::new(),
    };
    walker.properties(&aspect.element.references(fields::PROPERTIES), 0)
}

/// Look up `aspect_id` and wrap its transformed properties in a template
pub fn transform_to_submodel(
    store: &LookupStore,
    aspect_id: &str,
    options: &TransformOptions,
) -> Result<SubmodelTemplate> {
    let record = store
        .lookup(aspect_id)
        .ok_or_else(|| SammError::UnknownContainer(aspect_id.to_string()))?;
    if record.kind() != ElementKind::Aspect {
        return Err(SammError::NotAnAspect(aspect_id.to_string()));
    }
    Ok(SubmodelTemplate {
        id_short: record.id_short.clone(),
        semantic_id: record.id.clone(),
        description: record.description.clone(),
        elements: transform_with(store, record, options),
    })
}

/// Facts collected along a characteristic chain
#[derive(Debug, Default)]
struct ResolvedCharacteristic {
    /// Innermost non-Trait kind, `None` for built-ins and misses
    kind: Option<ElementKind>,
    data_type: Option<String>,
    constraints: Vec<String>,
    default_value: Option<String>,
}

struct Walker<'a> {
    store: &'a LookupStore,
    options: &'a TransformOptions,
    /// Entities on the current path, to stop self-nesting
    on_path: HashSet<String>,
}

impl Walker<'_> {
    fn properties(&mut self, refs: &[OptionalReference], depth: usize) -> Vec<SubmodelElementNode> {
        refs.iter()
            .filter_map(|r| self.property(r, depth))
            .collect()
    }

    fn property(&mut self, owner: &OptionalReference, depth: usize) -> Option<SubmodelElementNode> {
        let store = self.store;
        let Some(property) = store.lookup_typed(&owner.value, ElementKind::Property) else {
            debug!(id = %owner.value, "Skipping unresolved property");
            return None;
        };

        let characteristic = property
            .element
            .reference(fields::CHARACTERISTIC)
            .map(|id| self.characteristic(&id, &mut HashSet::new()))
            .unwrap_or_default();

        let mut qualifiers = Vec::new();
        let entity = characteristic
            .data_type
            .as_deref()
            .and_then(|dt| store.lookup_matching(dt, ElementKind::is_entity));

        let (kind, children) = match entity {
            Some(entity) => {
                let collection = characteristic.kind.filter(|k| k.is_collection());
                let cardinality = match (collection.is_some(), owner.optional) {
                    (true, false) => Some(Cardinality::OneToMany),
                    (true, true) => Some(Cardinality::ZeroToMany),
                    (false, true) => Some(Cardinality::ZeroToOne),
                    (false, false) => None,
                };
                qualifiers.extend(cardinality.map(Qualifier::Cardinality));
                let kind = match collection {
                    Some(k) => SubmodelElementKind::SubmodelElementList {
                        order_relevant: !matches!(k, ElementKind::Set | ElementKind::Collection),
                    },
                    None => SubmodelElementKind::SubmodelElementCollection,
                };
                (kind, self.entity(entity, depth + 1))
            }
            None => {
                if owner.optional {
                    qualifiers.push(Qualifier::Cardinality(Cardinality::ZeroToOne));
                }
                let kind = if is_multi_language(characteristic.data_type.as_deref()) {
                    SubmodelElementKind::MultiLanguageProperty
                } else {
                    SubmodelElementKind::Property {
                        value_type: ValueType::from_data_type(characteristic.data_type.as_deref()),
                    }
                };
                (kind, Vec::new())
            }
        };

        if let Some(default) = &characteristic.default_value {
            qualifiers.push(Qualifier::DefaultValue(default.clone()));
        }
        if let Some(example) = property.element.scalar(fields::EXAMPLE_VALUE) {
            qualifiers.push(Qualifier::ExampleValue(example.to_string()));
        }
        qualifiers.extend(self.constraint_qualifiers(&characteristic.constraints));

        Some(SubmodelElementNode {
            kind,
            id_short: property.id_short.clone(),
            semantic_id: property.id.clone(),
            description: property.description.clone(),
            qualifiers,
            children,
        })
    }

    /// Properties of an Entity and of the entities it extends
    fn entity(&mut self, entity: &IdentifierRecord, depth: usize) -> Vec<SubmodelElementNode> {
        let store = self.store;
        if depth > self.options.max_depth {
            warn!(id = %entity.id, max_depth = self.options.max_depth, "Entity nesting too deep, truncating");
            return Vec::new();
        }
        if !self.on_path.insert(entity.id.clone()) {
            debug!(id = %entity.id, "Entity contains itself, stopping recursion");
            return Vec::new();
        }

        let mut refs = Vec::new();
        let mut current = Some(entity);
        let mut seen = HashSet::new();
        while let Some(record) = current {
            if !seen.insert(record.id.as_str()) {
                break;
            }
            let mut own = record.element.references(fields::PROPERTIES);
            own.extend(refs);
            refs = own;
            current = record
                .element
                .reference(fields::EXTENDS)
                .and_then(|id| store.lookup_matching(&id, ElementKind::is_entity));
        }

        let children = self.properties(&refs, depth);
        self.on_path.remove(&entity.id);
        children
    }

    fn characteristic(&self, id: &str, seen: &mut HashSet<String>) -> ResolvedCharacteristic {
        let mut resolved = ResolvedCharacteristic::default();
        let mut current = Some(id.to_string());

        while let Some(id) = current.take() {
            if !seen.insert(id.clone()) {
                break;
            }
            let Some(record) = self.store.lookup_matching(&id, ElementKind::is_characteristic) else {
                match builtin_data_type(&id) {
                    Some(data_type) => resolved.data_type = Some(data_type),
                    None => debug!(id = %id, "Unresolved characteristic"),
                }
                break;
            };

            let element = &record.element;
            if record.kind() == ElementKind::Trait {
                resolved
                    .constraints
                    .extend(element.references(fields::CONSTRAINT).into_iter().map(|r| r.value));
                current = element.reference(fields::BASE_CHARACTERISTIC);
                continue;
            }

            resolved.kind = Some(record.kind());
            resolved.data_type = element.reference(fields::DATA_TYPE);
            if record.kind() == ElementKind::State {
                resolved.default_value = element.scalar(fields::DEFAULT_VALUE).map(str::to_string);
            }
            if resolved.data_type.is_none() && record.kind().is_collection() {
                if let Some(inner) = element.reference(fields::ELEMENT_CHARACTERISTIC) {
                    resolved.data_type = self.characteristic(&inner, seen).data_type;
                }
            }
        }

        resolved
    }

    fn constraint_qualifiers(&self, constraints: &[String]) -> Vec<Qualifier> {
        let mut qualifiers = Vec::new();
        for id in constraints {
            let Some(constraint) = self.store.lookup_matching(id, ElementKind::is_constraint) else {
                debug!(id = %id, "Skipping unresolved constraint");
                continue;
            };
            match constraint.kind() {
                ElementKind::RegularExpressionConstraint => {
                    if let Some(pattern) = constraint.element.scalar(fields::VALUE) {
                        qualifiers.push(Qualifier::AllowedValue(pattern.to_string()));
                    }
                }
                ElementKind::LanguageConstraint => {
                    if let Some(language) = constraint.element.scalar(fields::LANGUAGE_CODE) {
                        qualifiers.push(Qualifier::RequiredLang(language.to_string()));
                    }
                }
                _ => {}
            }
        }
        qualifiers
    }
}

fn is_multi_language(data_type: Option<&str>) -> bool {
    data_type.is_some_and(|dt| dt == format!("{RDF_NS}langString") || dt == "rdf:langString")
}

/// Data type of a predefined characteristic from any known release
fn builtin_data_type(id: &str) -> Option<String> {
    let predefined = SammVersion::ALL
        .iter()
        .any(|v| id.starts_with(&v.characteristic_ns()));
    if !predefined {
        return None;
    }
    let xsd = |name: &str| Some(format!("{XSD_NS}{name}"));
    match local_name(id) {
        "Text" | "Language" | "Locale" | "MimeType" | "UnitReference" => xsd("string"),
        "MultiLanguageText" => Some(format!("{RDF_NS}langString")),
        "Boolean" => xsd("boolean"),
        "Timestamp" => xsd("dateTime"),
        "ResourcePath" => xsd("anyURI"),
        _ => None,
    }
}
