//! Static field descriptor tables for SAMM model elements
//!
//! Every element kind owns a fixed list of fields. Each field has exactly one
//! [`FieldKind`], which selects its encode/decode strategy in the import and
//! export engines, and binds to one predicate written with a canonical
//! prefix (`samm:`, `samm-c:`) that an [`IdSet`] expands per release.

use serde::{Deserialize, Serialize};

use crate::vocab::IdSet;

/// Closed set of field shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Scalar,
    OptionalScalar,
    StringList,
    LangStringList,
    Reference,
    OptionalReference,
    ReferenceList,
    OptionalReferenceList,
    Enum,
    NamespaceMap,
}

/// Literal shape of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralType {
    Plain,
    NonNegativeInteger,
}

/// Enumerations whose members are encoded as vocabulary IRIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumType {
    BoundDefinition,
    Encoding,
}

impl EnumType {
    pub fn members(self) -> &'static [&'static str] {
        match self {
            EnumType::BoundDefinition => &["OPEN", "AT_LEAST", "GREATER_THAN", "LESS_THAN", "AT_MOST"],
            EnumType::Encoding => &[
                "US-ASCII",
                "ISO-8859-1",
                "UTF-8",
                "UTF-16",
                "UTF-16BE",
                "UTF-16LE",
            ],
        }
    }

    /// Find the member encoded by `encoded`, which may be a full IRI, a
    /// prefixed name or the bare member name
    pub fn decode(self, encoded: &str, prefix: &str, ids: &IdSet) -> Option<&'static str> {
        let expanded_prefix = ids.expand(prefix);
        self.members().iter().copied().find(|member| {
            encoded == *member
                || encoded == format!("{expanded_prefix}{member}")
                || encoded == format!("{prefix}{member}")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Bound predicate in canonical prefixed form. `None` for document-level
    /// fields that are not carried by triples.
    pub predicate: Option<&'static str>,
    /// Predicate naming the content inside an optional-reference wrapper node
    pub content_predicate: Option<&'static str>,
    pub literal: LiteralType,
    pub enum_type: Option<EnumType>,
    /// Prefix prepended to an enum member to form its IRI
    pub enum_prefix: &'static str,
}

impl FieldDescriptor {
    const fn new(name: &'static str, kind: FieldKind, predicate: Option<&'static str>) -> Self {
        Self {
            name,
            kind,
            predicate,
            content_predicate: None,
            literal: LiteralType::Plain,
            enum_type: None,
            enum_prefix: "",
        }
    }

    pub const fn scalar(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar, Some(predicate))
    }

    pub const fn optional_scalar(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::OptionalScalar, Some(predicate))
    }

    pub const fn string_list(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::StringList, Some(predicate))
    }

    pub const fn lang_strings(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::LangStringList, Some(predicate))
    }

    pub const fn reference(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::Reference, Some(predicate))
    }

    pub const fn optional_reference(
        name: &'static str,
        predicate: &'static str,
        content: &'static str,
    ) -> Self {
        let mut d = Self::new(name, FieldKind::OptionalReference, Some(predicate));
        d.content_predicate = Some(content);
        d
    }

    pub const fn reference_list(name: &'static str, predicate: &'static str) -> Self {
        Self::new(name, FieldKind::ReferenceList, Some(predicate))
    }

    pub const fn optional_reference_list(
        name: &'static str,
        predicate: &'static str,
        content: &'static str,
    ) -> Self {
        let mut d = Self::new(name, FieldKind::OptionalReferenceList, Some(predicate));
        d.content_predicate = Some(content);
        d
    }

    pub const fn enumeration(
        name: &'static str,
        predicate: &'static str,
        enum_type: EnumType,
        prefix: &'static str,
    ) -> Self {
        let mut d = Self::new(name, FieldKind::Enum, Some(predicate));
        d.enum_type = Some(enum_type);
        d.enum_prefix = prefix;
        d
    }

    pub const fn document(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, None)
    }

    pub const fn non_negative(mut self) -> Self {
        self.literal = LiteralType::NonNegativeInteger;
        self
    }
}

/// Field names shared with other modules
pub mod fields {
    pub const PREFERRED_NAME: &str = "preferredName";
    pub const SEE: &str = "see";
    pub const PROPERTIES: &str = "properties";
    pub const OPERATIONS: &str = "operations";
    pub const EVENTS: &str = "events";
    pub const COMMENTS: &str = "comments";
    pub const NAMESPACES: &str = "namespaces";
    pub const CHARACTERISTIC: &str = "characteristic";
    pub const EXAMPLE_VALUE: &str = "exampleValue";
    pub const DATA_TYPE: &str = "dataType";
    pub const BASE_CHARACTERISTIC: &str = "baseCharacteristic";
    pub const CONSTRAINT: &str = "constraint";
    pub const UNIT: &str = "unit";
    pub const VALUES: &str = "values";
    pub const DEFAULT_VALUE: &str = "defaultValue";
    pub const ELEMENT_CHARACTERISTIC: &str = "elementCharacteristic";
    pub const LEFT: &str = "left";
    pub const RIGHT: &str = "right";
    pub const DECONSTRUCTION_RULE: &str = "deconstructionRule";
    pub const ELEMENTS: &str = "elements";
    pub const EXTENDS: &str = "extends";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const PARAMETERS: &str = "parameters";
    pub const MIN_VALUE: &str = "minValue";
    pub const MAX_VALUE: &str = "maxValue";
    pub const LOWER_BOUND: &str = "lowerBoundDefinition";
    pub const UPPER_BOUND: &str = "upperBoundDefinition";
    pub const VALUE: &str = "value";
    pub const LANGUAGE_CODE: &str = "languageCode";
    pub const LOCALE_CODE: &str = "localeCode";
    pub const SCALE: &str = "scale";
    pub const INTEGER: &str = "integer";
}

use fields::*;

type D = FieldDescriptor;

const COMMON: [D; 2] = [
    D::lang_strings(PREFERRED_NAME, "samm:preferredName"),
    D::string_list(SEE, "samm:see"),
];

const ASPECT: [D; 5] = [
    D::optional_reference_list(PROPERTIES, "samm:properties", "samm:property"),
    D::reference_list(OPERATIONS, "samm:operations"),
    D::reference_list(EVENTS, "samm:events"),
    D::document(COMMENTS, FieldKind::StringList),
    D::document(NAMESPACES, FieldKind::NamespaceMap),
];

const PROPERTY: [D; 2] = [
    D::reference(CHARACTERISTIC, "samm:characteristic"),
    D::optional_scalar(EXAMPLE_VALUE, "samm:exampleValue"),
];

const DATA_TYPED: [D; 1] = [D::reference(DATA_TYPE, "samm:dataType")];

const TRAIT: [D; 2] = [
    D::reference(BASE_CHARACTERISTIC, "samm-c:baseCharacteristic"),
    D::reference_list(CONSTRAINT, "samm-c:constraint"),
];

const QUANTIFIABLE: [D; 2] = [
    D::reference(DATA_TYPE, "samm:dataType"),
    D::reference(UNIT, "samm-c:unit"),
];

const ENUMERATION: [D; 2] = [
    D::reference(DATA_TYPE, "samm:dataType"),
    D::reference_list(VALUES, "samm-c:values"),
];

const STATE: [D; 3] = [
    D::reference(DATA_TYPE, "samm:dataType"),
    D::reference_list(VALUES, "samm-c:values"),
    D::optional_scalar(DEFAULT_VALUE, "samm-c:defaultValue"),
];

const COLLECTION: [D; 2] = [
    D::reference(DATA_TYPE, "samm:dataType"),
    D::reference(ELEMENT_CHARACTERISTIC, "samm-c:elementCharacteristic"),
];

const EITHER: [D; 2] = [
    D::reference(LEFT, "samm-c:left"),
    D::reference(RIGHT, "samm-c:right"),
];

const STRUCTURED_VALUE: [D; 3] = [
    D::reference(DATA_TYPE, "samm:dataType"),
    D::scalar(DECONSTRUCTION_RULE, "samm-c:deconstructionRule"),
    D::reference_list(ELEMENTS, "samm-c:elements"),
];

const ENTITY: [D; 2] = [
    D::reference(EXTENDS, "samm:extends"),
    D::optional_reference_list(PROPERTIES, "samm:properties", "samm:property"),
];

const OPERATION: [D; 2] = [
    D::reference_list(INPUT, "samm:input"),
    D::optional_reference(OUTPUT, "samm:output", "samm:property"),
];

const EVENT: [D; 1] = [D::reference_list(PARAMETERS, "samm:parameters")];

const RANGE_CONSTRAINT: [D; 4] = [
    D::optional_scalar(MIN_VALUE, "samm-c:minValue"),
    D::optional_scalar(MAX_VALUE, "samm-c:maxValue"),
    D::enumeration(LOWER_BOUND, "samm-c:lowerBoundDefinition", EnumType::BoundDefinition, "samm-c:"),
    D::enumeration(UPPER_BOUND, "samm-c:upperBoundDefinition", EnumType::BoundDefinition, "samm-c:"),
];

const LENGTH_CONSTRAINT: [D; 2] = [
    D::optional_scalar(MIN_VALUE, "samm-c:minValue").non_negative(),
    D::optional_scalar(MAX_VALUE, "samm-c:maxValue").non_negative(),
];

const REGULAR_EXPRESSION_CONSTRAINT: [D; 1] = [D::scalar(VALUE, "samm:value")];

const LANGUAGE_CONSTRAINT: [D; 1] = [D::scalar(LANGUAGE_CODE, "samm-c:languageCode")];

const LOCALE_CONSTRAINT: [D; 1] = [D::scalar(LOCALE_CODE, "samm-c:localeCode")];

const ENCODING_CONSTRAINT: [D; 1] =
    [D::enumeration(VALUE, "samm:value", EnumType::Encoding, "samm:")];

const FIXED_POINT_CONSTRAINT: [D; 2] = [
    D::scalar(SCALE, "samm-c:scale").non_negative(),
    D::scalar(INTEGER, "samm-c:integer").non_negative(),
];

/// Element kinds known to the codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Aspect,
    Property,
    Characteristic,
    Trait,
    Quantifiable,
    Measurement,
    Enumeration,
    State,
    Duration,
    Collection,
    List,
    Set,
    SortedSet,
    TimeSeries,
    Code,
    Either,
    SingleEntity,
    StructuredValue,
    Entity,
    AbstractEntity,
    Operation,
    Event,
    Constraint,
    RangeConstraint,
    LengthConstraint,
    RegularExpressionConstraint,
    LanguageConstraint,
    LocaleConstraint,
    EncodingConstraint,
    FixedPointConstraint,
}

impl ElementKind {
    pub const ALL: [ElementKind; 30] = [
        ElementKind::Aspect,
        ElementKind::Property,
        ElementKind::Characteristic,
        ElementKind::Trait,
        ElementKind::Quantifiable,
        ElementKind::Measurement,
        ElementKind::Enumeration,
        ElementKind::State,
        ElementKind::Duration,
        ElementKind::Collection,
        ElementKind::List,
        ElementKind::Set,
        ElementKind::SortedSet,
        ElementKind::TimeSeries,
        ElementKind::Code,
        ElementKind::Either,
        ElementKind::SingleEntity,
        ElementKind::StructuredValue,
        ElementKind::Entity,
        ElementKind::AbstractEntity,
        ElementKind::Operation,
        ElementKind::Event,
        ElementKind::Constraint,
        ElementKind::RangeConstraint,
        ElementKind::LengthConstraint,
        ElementKind::RegularExpressionConstraint,
        ElementKind::LanguageConstraint,
        ElementKind::LocaleConstraint,
        ElementKind::EncodingConstraint,
        ElementKind::FixedPointConstraint,
    ];

    /// Stable short name, identical to the local name of the type URN
    pub fn short_name(self) -> &'static str {
        match self {
            ElementKind::Aspect => "Aspect",
            ElementKind::Property => "Property",
            ElementKind::Characteristic => "Characteristic",
            ElementKind::Trait => "Trait",
            ElementKind::Quantifiable => "Quantifiable",
            ElementKind::Measurement => "Measurement",
            ElementKind::Enumeration => "Enumeration",
            ElementKind::State => "State",
            ElementKind::Duration => "Duration",
            ElementKind::Collection => "Collection",
            ElementKind::List => "List",
            ElementKind::Set => "Set",
            ElementKind::SortedSet => "SortedSet",
            ElementKind::TimeSeries => "TimeSeries",
            ElementKind::Code => "Code",
            ElementKind::Either => "Either",
            ElementKind::SingleEntity => "SingleEntity",
            ElementKind::StructuredValue => "StructuredValue",
            ElementKind::Entity => "Entity",
            ElementKind::AbstractEntity => "AbstractEntity",
            ElementKind::Operation => "Operation",
            ElementKind::Event => "Event",
            ElementKind::Constraint => "Constraint",
            ElementKind::RangeConstraint => "RangeConstraint",
            ElementKind::LengthConstraint => "LengthConstraint",
            ElementKind::RegularExpressionConstraint => "RegularExpressionConstraint",
            ElementKind::LanguageConstraint => "LanguageConstraint",
            ElementKind::LocaleConstraint => "LocaleConstraint",
            ElementKind::EncodingConstraint => "EncodingConstraint",
            ElementKind::FixedPointConstraint => "FixedPointConstraint",
        }
    }

    /// Canonical prefix of the namespace that defines this kind
    fn namespace_prefix(self) -> &'static str {
        match self {
            ElementKind::Aspect
            | ElementKind::Property
            | ElementKind::Characteristic
            | ElementKind::Entity
            | ElementKind::AbstractEntity
            | ElementKind::Operation
            | ElementKind::Event
            | ElementKind::Constraint => "samm",
            _ => "samm-c",
        }
    }

    /// Type term in canonical prefixed form, e.g. `samm-c:Trait`
    pub fn type_term(self) -> String {
        format!("{}:{}", self.namespace_prefix(), self.short_name())
    }

    /// Version-specific type URN used as the `rdf:type` marker
    pub fn urn(self, ids: &IdSet) -> String {
        ids.expand(&self.type_term())
    }

    /// Resolve a type URN against the URN table of one release
    pub fn from_urn(ids: &IdSet, urn: &str) -> Option<ElementKind> {
        ElementKind::ALL.iter().copied().find(|k| k.urn(ids) == urn)
    }

    /// Resolve a type URN against every known release
    pub fn from_any_urn(urn: &str) -> Option<(ElementKind, IdSet)> {
        crate::vocab::SammVersion::ALL.iter().find_map(|v| {
            let ids = IdSet::for_version(*v);
            ElementKind::from_urn(&ids, urn).map(|k| (k, ids))
        })
    }

    pub fn is_characteristic(self) -> bool {
        matches!(
            self,
            ElementKind::Characteristic
                | ElementKind::Trait
                | ElementKind::Quantifiable
                | ElementKind::Measurement
                | ElementKind::Enumeration
                | ElementKind::State
                | ElementKind::Duration
                | ElementKind::Collection
                | ElementKind::List
                | ElementKind::Set
                | ElementKind::SortedSet
                | ElementKind::TimeSeries
                | ElementKind::Code
                | ElementKind::Either
                | ElementKind::SingleEntity
                | ElementKind::StructuredValue
        )
    }

    /// Collection-valued characteristics
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            ElementKind::Collection
                | ElementKind::List
                | ElementKind::Set
                | ElementKind::SortedSet
                | ElementKind::TimeSeries
        )
    }

    pub fn is_entity(self) -> bool {
        matches!(self, ElementKind::Entity | ElementKind::AbstractEntity)
    }

    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            ElementKind::Constraint
                | ElementKind::RangeConstraint
                | ElementKind::LengthConstraint
                | ElementKind::RegularExpressionConstraint
                | ElementKind::LanguageConstraint
                | ElementKind::LocaleConstraint
                | ElementKind::EncodingConstraint
                | ElementKind::FixedPointConstraint
        )
    }

    /// Kind-specific fields, without the common ones
    fn own_fields(self) -> &'static [FieldDescriptor] {
        match self {
            ElementKind::Aspect => &ASPECT,
            ElementKind::Property => &PROPERTY,
            ElementKind::Characteristic | ElementKind::Code | ElementKind::SingleEntity => {
                &DATA_TYPED
            }
            ElementKind::Trait => &TRAIT,
            ElementKind::Quantifiable | ElementKind::Measurement | ElementKind::Duration => {
                &QUANTIFIABLE
            }
            ElementKind::Enumeration => &ENUMERATION,
            ElementKind::State => &STATE,
            ElementKind::Collection
            | ElementKind::List
            | ElementKind::Set
            | ElementKind::SortedSet
            | ElementKind::TimeSeries => &COLLECTION,
            ElementKind::Either => &EITHER,
            ElementKind::StructuredValue => &STRUCTURED_VALUE,
            ElementKind::Entity | ElementKind::AbstractEntity => &ENTITY,
            ElementKind::Operation => &OPERATION,
            ElementKind::Event => &EVENT,
            ElementKind::Constraint => &[],
            ElementKind::RangeConstraint => &RANGE_CONSTRAINT,
            ElementKind::LengthConstraint => &LENGTH_CONSTRAINT,
            ElementKind::RegularExpressionConstraint => &REGULAR_EXPRESSION_CONSTRAINT,
            ElementKind::LanguageConstraint => &LANGUAGE_CONSTRAINT,
            ElementKind::LocaleConstraint => &LOCALE_CONSTRAINT,
            ElementKind::EncodingConstraint => &ENCODING_CONSTRAINT,
            ElementKind::FixedPointConstraint => &FIXED_POINT_CONSTRAINT,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// All fields of a kind: the common fields first, then the kind's own
pub fn describe(kind: ElementKind) -> impl Iterator<Item = &'static FieldDescriptor> {
    let common: &'static [FieldDescriptor] = &COMMON;
    common.iter().chain(kind.own_fields().iter())
}

/// Look up a single field descriptor by name
pub fn field(kind: ElementKind, name: &str) -> Option<&'static FieldDescriptor> {
    describe(kind).find(|d| d.name == name)
}
