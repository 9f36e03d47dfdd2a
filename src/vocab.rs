//! Vocabulary definitions for SAMM documents
//!
//! SAMM (and its predecessor BAMM) publish one URN namespace per release.
//! An [`IdSet`] bundles the namespaces of one release together with the RDF
//! and XSD terms the codecs need, so that every import and export call works
//! against exactly one vocabulary.

use oxrdf::{Literal, NamedNode};

use crate::id::NamespaceMap;

/// RDF namespace
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// RDFS namespace
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// XML Schema datatypes namespace
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Canonical prefix for the meta model namespace
pub const SAMM_PREFIX: &str = "samm";

/// Canonical prefix for the characteristic namespace
pub const SAMM_C_PREFIX: &str = "samm-c";

/// Canonical prefix for the entity namespace
pub const SAMM_E_PREFIX: &str = "samm-e";

/// Canonical prefix for the unit catalog namespace
pub const UNIT_PREFIX: &str = "unit";

const BAMM_BASE: &str = "urn:bamm:io.openmanufacturing:";
const SAMM_BASE: &str = "urn:samm:org.eclipse.esmf.samm:";

/// Released meta model versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SammVersion {
    /// BAMM 1.0.0, the pre-Eclipse release
    Bamm1_0_0,
    Samm2_0_0,
    Samm2_1_0,
    Samm2_2_0,
    Samm2_3_0,
}

impl SammVersion {
    /// All known versions, oldest first
    pub const ALL: [SammVersion; 5] = [
        SammVersion::Bamm1_0_0,
        SammVersion::Samm2_0_0,
        SammVersion::Samm2_1_0,
        SammVersion::Samm2_2_0,
        SammVersion::Samm2_3_0,
    ];

    /// The newest supported version, used when a document gives no hint
    pub const LATEST: SammVersion = SammVersion::Samm2_3_0;

    /// Version tag as it appears inside the namespace URNs
    pub fn tag(self) -> &'static str {
        match self {
            SammVersion::Bamm1_0_0 => "1.0.0",
            SammVersion::Samm2_0_0 => "2.0.0",
            SammVersion::Samm2_1_0 => "2.1.0",
            SammVersion::Samm2_2_0 => "2.2.0",
            SammVersion::Samm2_3_0 => "2.3.0",
        }
    }

    /// Prefix stem documents of this release use: `bamm` or `samm`
    pub fn prefix_stem(self) -> &'static str {
        match self {
            SammVersion::Bamm1_0_0 => "bamm",
            _ => SAMM_PREFIX,
        }
    }

    fn base(self) -> &'static str {
        match self {
            SammVersion::Bamm1_0_0 => BAMM_BASE,
            _ => SAMM_BASE,
        }
    }

    /// Meta model namespace, e.g. `urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#`
    pub fn meta_model_ns(self) -> String {
        format!("{}meta-model:{}#", self.base(), self.tag())
    }

    pub fn characteristic_ns(self) -> String {
        format!("{}characteristic:{}#", self.base(), self.tag())
    }

    pub fn entity_ns(self) -> String {
        format!("{}entity:{}#", self.base(), self.tag())
    }

    pub fn unit_ns(self) -> String {
        format!("{}unit:{}#", self.base(), self.tag())
    }
}

impl std::fmt::Display for SammVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SammVersion::Bamm1_0_0 => write!(f, "BAMM {}", self.tag()),
            _ => write!(f, "SAMM {}", self.tag()),
        }
    }
}

/// Version-scoped bundle of vocabulary URIs
///
/// Descriptor predicates and type terms are written with the canonical
/// prefixes (`samm:`, `samm-c:`, ...). The `namespaces` map binds those
/// prefixes to the URNs of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSet {
    pub version: SammVersion,
    pub namespaces: NamespaceMap,
}

impl IdSet {
    pub fn for_version(version: SammVersion) -> Self {
        let mut namespaces = NamespaceMap::new();
        namespaces.insert_unchecked(SAMM_PREFIX, version.meta_model_ns());
        namespaces.insert_unchecked(SAMM_C_PREFIX, version.characteristic_ns());
        namespaces.insert_unchecked(SAMM_E_PREFIX, version.entity_ns());
        namespaces.insert_unchecked(UNIT_PREFIX, version.unit_ns());
        namespaces.insert_unchecked("rdf", RDF_NS);
        namespaces.insert_unchecked("rdfs", RDFS_NS);
        namespaces.insert_unchecked("xsd", XSD_NS);
        Self {
            version,
            namespaces,
        }
    }

    /// Prefixes a document of this release declares by convention
    ///
    /// Unlike `namespaces`, the names follow the release: BAMM documents get
    /// `bamm:`, `bamm-c:` and `bamm-e:`.
    pub fn document_prefixes(&self) -> NamespaceMap {
        let stem = self.version.prefix_stem();
        let mut namespaces = NamespaceMap::new();
        namespaces.insert_unchecked(stem, self.version.meta_model_ns());
        namespaces.insert_unchecked(format!("{stem}-c"), self.version.characteristic_ns());
        namespaces.insert_unchecked(format!("{stem}-e"), self.version.entity_ns());
        namespaces.insert_unchecked(UNIT_PREFIX, self.version.unit_ns());
        namespaces.insert_unchecked("xsd", XSD_NS);
        namespaces
    }

    pub fn latest() -> Self {
        Self::for_version(SammVersion::LATEST)
    }

    /// Detect the release from a document's declared namespaces
    ///
    /// Any declared URI equal to one of a release's namespaces selects that
    /// release, regardless of the prefix name the document chose for it.
    pub fn detect(namespaces: &NamespaceMap) -> Option<Self> {
        namespaces
            .iter()
            .find_map(|(_, uri)| version_of_namespace(uri))
            .map(Self::for_version)
    }

    /// Detect the release from any IRI mentioned in a document
    pub fn detect_from_iris<'a>(iris: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        iris.into_iter()
            .find_map(|iri| {
                SammVersion::ALL.iter().rev().copied().find(|v| {
                    iri.starts_with(&v.meta_model_ns()) || iri.starts_with(&v.characteristic_ns())
                })
            })
            .map(Self::for_version)
    }

    /// Expand a canonical prefixed term such as `samm:properties`
    pub fn expand(&self, term: &str) -> String {
        self.namespaces
            .expand(term)
            .unwrap_or_else(|| term.to_string())
    }

    pub fn node(&self, term: &str) -> NamedNode {
        NamedNode::new_unchecked(self.expand(term))
    }

    pub fn rdf_type(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{RDF_NS}type"))
    }

    pub fn rdf_first(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{RDF_NS}first"))
    }

    pub fn rdf_rest(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{RDF_NS}rest"))
    }

    pub fn rdf_nil(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{RDF_NS}nil"))
    }

    pub fn rdf_lang_string(&self) -> String {
        format!("{RDF_NS}langString")
    }

    /// Marker predicate for optional references inside collections
    pub fn optional(&self) -> NamedNode {
        self.node("samm:optional")
    }

    pub fn description(&self) -> NamedNode {
        self.node("samm:description")
    }

    /// `samm:name` only exists in BAMM 1.0; later releases derive the name
    /// from the element URN.
    pub fn name(&self) -> Option<NamedNode> {
        match self.version {
            SammVersion::Bamm1_0_0 => Some(self.node("samm:name")),
            _ => None,
        }
    }

    pub fn xsd_string(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{XSD_NS}string"))
    }

    pub fn xsd_boolean(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{XSD_NS}boolean"))
    }

    pub fn xsd_non_negative_integer(&self) -> NamedNode {
        NamedNode::new_unchecked(format!("{XSD_NS}nonNegativeInteger"))
    }

    /// Canonical `true` literal that marks an optional reference
    pub fn true_literal(&self) -> Literal {
        Literal::new_typed_literal("true", self.xsd_boolean())
    }

    /// Base namespace of the meta model for this release
    pub fn meta_model_ns(&self) -> String {
        self.version.meta_model_ns()
    }

    pub fn characteristic_ns(&self) -> String {
        self.version.characteristic_ns()
    }
}

impl Default for IdSet {
    fn default() -> Self {
        Self::latest()
    }
}

fn version_of_namespace(uri: &str) -> Option<SammVersion> {
    SammVersion::ALL.iter().copied().find(|v| {
        uri == v.meta_model_ns()
            || uri == v.characteristic_ns()
            || uri == v.entity_ns()
            || uri == v.unit_ns()
    })
}
