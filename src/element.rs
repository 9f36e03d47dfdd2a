//! Typed model elements
//!
//! A [`ModelElement`] stores one [`FieldValue`] per descriptor of its kind, in
//! descriptor order. The value variant always matches the descriptor's
//! [`FieldKind`]; [`ModelElement::set`] rejects anything else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::{describe, fields, ElementKind, FieldDescriptor, FieldKind};
use crate::error::{Result, SammError};
use crate::id::NamespaceMap;

/// Global identifier of another model element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(pub String);

impl Reference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference carrying a cardinality flag at the point of use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionalReference {
    pub value: String,
    #[serde(default)]
    pub optional: bool,
}

impl OptionalReference {
    pub fn new(value: impl Into<String>, optional: bool) -> Self {
        Self {
            value: value.into(),
            optional,
        }
    }

    pub fn required(value: impl Into<String>) -> Self {
        Self::new(value, false)
    }
}

/// Text with a language tag; an empty tag marks an untagged literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

impl LangString {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Content of a scalar field together with the RDF term shape it came from
///
/// Plain string literals serialize as a bare JSON string; IRIs and typed
/// literals as an object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ScalarRepr", into = "ScalarRepr")]
pub struct ScalarValue {
    pub value: String,
    /// Datatype IRI of a typed literal other than `xsd:string`
    pub datatype: Option<String>,
    /// The value is an IRI, not a literal
    pub iri: bool,
}

impl ScalarValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            iri: false,
        }
    }

    pub fn iri(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            iri: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::plain(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::plain(value)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ScalarRepr {
    Plain(String),
    Tagged {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        iri: bool,
    },
}

impl From<ScalarRepr> for ScalarValue {
    fn from(repr: ScalarRepr) -> Self {
        match repr {
            ScalarRepr::Plain(value) => Self::plain(value),
            ScalarRepr::Tagged {
                value,
                datatype,
                iri,
            } => Self {
                value,
                datatype,
                iri,
            },
        }
    }
}

impl From<ScalarValue> for ScalarRepr {
    fn from(scalar: ScalarValue) -> Self {
        if scalar.datatype.is_none() && !scalar.iri {
            return ScalarRepr::Plain(scalar.value);
        }
        ScalarRepr::Tagged {
            value: scalar.value,
            datatype: scalar.datatype,
            iri: scalar.iri,
        }
    }
}

/// Value of one field; the variant mirrors [`FieldKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(ScalarValue),
    OptionalScalar(Option<ScalarValue>),
    StringList(Vec<String>),
    LangStringList(Vec<LangString>),
    Reference(Option<Reference>),
    OptionalReference(Option<OptionalReference>),
    ReferenceList(Vec<Reference>),
    OptionalReferenceList(Vec<OptionalReference>),
    /// Member name of the field's enum type, e.g. `AT_MOST`
    Enum(Option<String>),
    NamespaceMap(NamespaceMap),
}

impl FieldValue {
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => FieldValue::Scalar(ScalarValue::default()),
            FieldKind::OptionalScalar => FieldValue::OptionalScalar(None),
            FieldKind::StringList => FieldValue::StringList(Vec::new()),
            FieldKind::LangStringList => FieldValue::LangStringList(Vec::new()),
            FieldKind::Reference => FieldValue::Reference(None),
            FieldKind::OptionalReference => FieldValue::OptionalReference(None),
            FieldKind::ReferenceList => FieldValue::ReferenceList(Vec::new()),
            FieldKind::OptionalReferenceList => FieldValue::OptionalReferenceList(Vec::new()),
            FieldKind::Enum => FieldValue::Enum(None),
            FieldKind::NamespaceMap => FieldValue::NamespaceMap(NamespaceMap::new()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::OptionalScalar(_) => FieldKind::OptionalScalar,
            FieldValue::StringList(_) => FieldKind::StringList,
            FieldValue::LangStringList(_) => FieldKind::LangStringList,
            FieldValue::Reference(_) => FieldKind::Reference,
            FieldValue::OptionalReference(_) => FieldKind::OptionalReference,
            FieldValue::ReferenceList(_) => FieldKind::ReferenceList,
            FieldValue::OptionalReferenceList(_) => FieldKind::OptionalReferenceList,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::NamespaceMap(_) => FieldKind::NamespaceMap,
        }
    }

    pub fn is_default(&self) -> bool {
        match self {
            FieldValue::Scalar(s) => s.value.is_empty(),
            FieldValue::OptionalScalar(v) => v.is_none(),
            FieldValue::Enum(v) => v.is_none(),
            FieldValue::StringList(v) => v.is_empty(),
            FieldValue::LangStringList(v) => v.is_empty(),
            FieldValue::Reference(v) => v.is_none(),
            FieldValue::OptionalReference(v) => v.is_none(),
            FieldValue::ReferenceList(v) => v.is_empty(),
            FieldValue::OptionalReferenceList(v) => v.is_empty(),
            FieldValue::NamespaceMap(m) => m.is_empty(),
        }
    }

    /// Every reference held by this value, with its optional flag
    pub fn references(&self) -> Vec<OptionalReference> {
        match self {
            FieldValue::Reference(Some(r)) => vec![OptionalReference::required(r.0.clone())],
            FieldValue::OptionalReference(Some(r)) => vec![r.clone()],
            FieldValue::ReferenceList(list) => list
                .iter()
                .map(|r| OptionalReference::required(r.0.clone()))
                .collect(),
            FieldValue::OptionalReferenceList(list) => list.clone(),
            _ => Vec::new(),
        }
    }

    fn to_json(&self) -> Result<Value> {
        let value = match self {
            FieldValue::Scalar(s) => serde_json::to_value(s)?,
            FieldValue::OptionalScalar(v) => serde_json::to_value(v)?,
            FieldValue::Enum(v) => serde_json::to_value(v)?,
            FieldValue::StringList(v) => serde_json::to_value(v)?,
            FieldValue::LangStringList(v) => serde_json::to_value(v)?,
            FieldValue::Reference(v) => serde_json::to_value(v)?,
            FieldValue::OptionalReference(v) => serde_json::to_value(v)?,
            FieldValue::ReferenceList(v) => serde_json::to_value(v)?,
            FieldValue::OptionalReferenceList(v) => serde_json::to_value(v)?,
            FieldValue::NamespaceMap(m) => serde_json::to_value(m)?,
        };
        Ok(value)
    }

    fn from_json(kind: FieldKind, value: Value) -> Result<Self> {
        let parsed = match kind {
            FieldKind::Scalar => FieldValue::Scalar(serde_json::from_value(value)?),
            FieldKind::OptionalScalar => FieldValue::OptionalScalar(serde_json::from_value(value)?),
            FieldKind::StringList => FieldValue::StringList(serde_json::from_value(value)?),
            FieldKind::LangStringList => FieldValue::LangStringList(serde_json::from_value(value)?),
            FieldKind::Reference => FieldValue::Reference(serde_json::from_value(value)?),
            FieldKind::OptionalReference => {
                FieldValue::OptionalReference(serde_json::from_value(value)?)
            }
            FieldKind::ReferenceList => FieldValue::ReferenceList(serde_json::from_value(value)?),
            FieldKind::OptionalReferenceList => {
                FieldValue::OptionalReferenceList(serde_json::from_value(value)?)
            }
            FieldKind::Enum => FieldValue::Enum(serde_json::from_value(value)?),
            FieldKind::NamespaceMap => FieldValue::NamespaceMap(serde_json::from_value(value)?),
        };
        Ok(parsed)
    }
}

/// A decoded SAMM model element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelElement {
    kind: ElementKind,
    values: Vec<FieldValue>,
}

impl ModelElement {
    /// Default-valued element of `kind`
    pub fn new(kind: ElementKind) -> Self {
        let values = describe(kind)
            .map(|d| FieldValue::default_for(d.kind))
            .collect();
        Self { kind, values }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    fn position(&self, name: &str) -> Option<usize> {
        describe(self.kind).position(|d| d.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.position(name).and_then(|i| self.values.get(i))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        let index = self.position(name)?;
        self.values.get_mut(index)
    }

    /// Replace a field value; the variant must match the field's kind
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let kind = self.kind;
        let slot = self.get_mut(name).ok_or_else(|| {
            SammError::InvalidStructure(format!("{kind} has no field '{name}'"))
        })?;
        if slot.kind() != value.kind() {
            return Err(SammError::InvalidStructure(format!(
                "field '{name}' of {kind} is {:?}, got {:?}",
                slot.kind(),
                value.kind()
            )));
        }
        *slot = value;
        Ok(())
    }

    /// Descriptor and value pairs in descriptor order
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldDescriptor, &FieldValue)> {
        describe(self.kind).zip(self.values.iter())
    }

    /// Scalar, optional scalar or enum content
    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Scalar(s) if !s.value.is_empty() => Some(s.as_str()),
            FieldValue::OptionalScalar(Some(s)) => Some(s.as_str()),
            FieldValue::Enum(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Scalar content with its datatype and IRI flag
    pub fn scalar_value(&self, name: &str) -> Option<&ScalarValue> {
        match self.get(name)? {
            FieldValue::Scalar(s) if !s.value.is_empty() => Some(s),
            FieldValue::OptionalScalar(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// First reference held by the field
    pub fn reference(&self, name: &str) -> Option<String> {
        self.get(name)?.references().into_iter().next().map(|r| r.value)
    }

    pub fn references(&self, name: &str) -> Vec<OptionalReference> {
        self.get(name).map(FieldValue::references).unwrap_or_default()
    }

    pub fn string_list(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(FieldValue::StringList(v)) => v,
            _ => &[],
        }
    }

    pub fn lang_strings(&self, name: &str) -> &[LangString] {
        match self.get(name) {
            Some(FieldValue::LangStringList(v)) => v,
            _ => &[],
        }
    }

    pub fn namespaces(&self) -> Option<&NamespaceMap> {
        match self.get(fields::NAMESPACES)? {
            FieldValue::NamespaceMap(m) => Some(m),
            _ => None,
        }
    }

    /// Identifiers of every element this one refers to, in field order
    pub fn referenced_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (_, value) in self.fields() {
            for r in value.references() {
                if !ids.contains(&r.value) {
                    ids.push(r.value);
                }
            }
        }
        ids
    }

    /// Field data as a JSON object keyed by field name; defaults are omitted
    pub fn to_payload(&self) -> Result<Value> {
        let mut map = Map::new();
        for (descriptor, value) in self.fields() {
            if value.is_default() {
                continue;
            }
            map.insert(descriptor.name.to_string(), value.to_json()?);
        }
        Ok(Value::Object(map))
    }

    /// Rebuild an element from [`ModelElement::to_payload`] output
    ///
    /// Unknown keys are ignored, missing keys keep their defaults.
    pub fn from_payload(kind: ElementKind, payload: &Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            SammError::InvalidStructure(format!("{kind} payload is not a JSON object"))
        })?;
        let mut element = ModelElement::new(kind);
        for (descriptor, slot) in describe(kind).zip(element.values.iter_mut()) {
            if let Some(value) = object.get(descriptor.name) {
                *slot = FieldValue::from_json(descriptor.kind, value.clone())?;
            }
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_property() -> ModelElement {
        let mut p = ModelElement::new(ElementKind::Property);
        p.set(
            fields::CHARACTERISTIC,
            FieldValue::Reference(Some(Reference::new("urn:samm:com.example:1.0.0#Speed"))),
        )
        .unwrap();
        p.set(
            fields::EXAMPLE_VALUE,
            FieldValue::OptionalScalar(Some("42".into())),
        )
        .unwrap();
        p.set(
            fields::PREFERRED_NAME,
            FieldValue::LangStringList(vec![LangString::new("en", "speed")]),
        )
        .unwrap();
        p
    }

    #[test]
    fn test_new_element_has_default_values() {
        let e = ModelElement::new(ElementKind::Aspect);
        assert_eq!(e.fields().count(), describe(ElementKind::Aspect).count());
        assert!(e.fields().all(|(_, v)| v.is_default()));
    }

    #[test]
    fn test_set_rejects_kind_mismatch() {
        let mut e = ModelElement::new(ElementKind::Property);
        let err = e
            .set(fields::EXAMPLE_VALUE, FieldValue::StringList(vec![]))
            .unwrap_err();
        assert!(matches!(err, SammError::InvalidStructure(_)));
        assert!(e.set("nope", FieldValue::Scalar("x".into())).is_err());
    }

    #[test]
    fn test_typed_accessors() {
        let p = sample_property();
        assert_eq!(p.scalar(fields::EXAMPLE_VALUE), Some("42"));
        assert_eq!(
            p.reference(fields::CHARACTERISTIC).as_deref(),
            Some("urn:samm:com.example:1.0.0#Speed")
        );
        assert_eq!(p.lang_strings(fields::PREFERRED_NAME)[0].text, "speed");
        assert!(p.string_list(fields::SEE).is_empty());
    }

    #[test]
    fn test_referenced_ids_are_deduplicated_in_field_order() {
        let mut aspect = ModelElement::new(ElementKind::Aspect);
        aspect
            .set(
                fields::PROPERTIES,
                FieldValue::OptionalReferenceList(vec![
                    OptionalReference::required(":a"),
                    OptionalReference::new(":b", true),
                    OptionalReference::required(":a"),
                ]),
            )
            .unwrap();
        aspect
            .set(
                fields::EVENTS,
                FieldValue::ReferenceList(vec![Reference::new(":e")]),
            )
            .unwrap();
        assert_eq!(aspect.referenced_ids(), vec![":a", ":b", ":e"]);
    }

    #[test]
    fn test_payload_omits_defaults() {
        let p = sample_property();
        let payload = p.to_payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "preferredName": [{"language": "en", "text": "speed"}],
                "characteristic": "urn:samm:com.example:1.0.0#Speed",
                "exampleValue": "42"
            })
        );
        let back = ModelElement::from_payload(ElementKind::Property, &payload).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_typed_and_iri_scalars_keep_their_shape_in_payloads() {
        let mut state = ModelElement::new(ElementKind::State);
        let green = ScalarValue::iri("urn:samm:com.example:1.0.0#Green");
        state
            .set(fields::DEFAULT_VALUE, FieldValue::OptionalScalar(Some(green.clone())))
            .unwrap();
        let payload = state.to_payload().unwrap();
        assert_eq!(
            payload["defaultValue"],
            json!({"value": "urn:samm:com.example:1.0.0#Green", "iri": true})
        );
        let back = ModelElement::from_payload(ElementKind::State, &payload).unwrap();
        assert_eq!(back.scalar_value(fields::DEFAULT_VALUE), Some(&green));

        let mut p = ModelElement::new(ElementKind::Property);
        let typed = ScalarValue::typed("42", "http://www.w3.org/2001/XMLSchema#int");
        p.set(fields::EXAMPLE_VALUE, FieldValue::OptionalScalar(Some(typed)))
            .unwrap();
        let payload = p.to_payload().unwrap();
        assert_eq!(
            payload["exampleValue"]["datatype"],
            "http://www.w3.org/2001/XMLSchema#int"
        );
        assert_eq!(ModelElement::from_payload(ElementKind::Property, &payload).unwrap(), p);
        assert_eq!(p.scalar(fields::EXAMPLE_VALUE), Some("42"));
    }

    #[test]
    fn test_payload_with_optional_references_and_namespaces() {
        let payload = json!({
            "properties": [{"value": ":a"}, {"value": ":b", "optional": true}],
            "namespaces": [["", "urn:samm:com.example:1.0.0#"]]
        });
        let aspect = ModelElement::from_payload(ElementKind::Aspect, &payload).unwrap();
        assert_eq!(
            aspect.references(fields::PROPERTIES),
            vec![
                OptionalReference::required(":a"),
                OptionalReference::new(":b", true)
            ]
        );
        assert_eq!(aspect.namespaces().unwrap().len(), 1);
    }

    #[test]
    fn test_payload_shape_errors_surface() {
        let bad = json!({"characteristic": ["not", "a", "string"]});
        assert!(ModelElement::from_payload(ElementKind::Property, &bad).is_err());
        assert!(ModelElement::from_payload(ElementKind::Property, &json!("x")).is_err());
    }
}
