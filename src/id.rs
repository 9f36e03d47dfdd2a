//! Identifier handling for SAMM documents
//!
//! Classifies identifiers, compresses and expands them through a document's
//! namespace map, derives short names and mints names for anonymous elements
//! that have to become first-class records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SammError;

/// Classification of an identifier string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// Blank node label: "_:b0"
    Blank,
    /// Compact form whose prefix is declared: "samm:Aspect", ":temperature"
    Prefixed,
    /// Absolute IRI or URN: "urn:samm:...#x", "http://..."
    Absolute,
    /// Anything else, typically a plain literal value
    Literal,
}

/// Classify an identifier against a namespace map
///
/// A declared prefix wins over a URI scheme, so `xsd:string` is prefixed
/// when `xsd` is declared even though it parses as an IRI.
pub fn classify_id(id: &str, namespaces: &NamespaceMap) -> IdKind {
    if id.starts_with("_:") {
        return IdKind::Blank;
    }
    if let Some((prefix, _)) = id.split_once(':') {
        if namespaces.contains_prefix(prefix) {
            return IdKind::Prefixed;
        }
        if is_absolute_iri(id) {
            return IdKind::Absolute;
        }
    }
    IdKind::Literal
}

fn is_absolute_iri(id: &str) -> bool {
    if id.chars().any(char::is_whitespace) {
        return false;
    }
    match url::Url::parse(id) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            scheme == "urn" || scheme == "http" || scheme == "https" || scheme == "file"
                || scheme == "mailto"
        }
        Err(_) => false,
    }
}

/// Ordered prefix to URI mapping
///
/// Insertion order is kept; the first entry acts as the document's base
/// namespace. Prefixes are unique, re-inserting a prefix replaces its URI in
/// place. Two maps are equal only if their entries match in order.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct NamespaceMap {
    entries: IndexMap<String, String>,
}

impl PartialEq for NamespaceMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prefix after validating both parts
    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<(), SammError> {
        let prefix = prefix.into();
        let uri = uri.into();
        if !is_valid_prefix(&prefix) {
            return Err(SammError::InvalidPrefix(prefix));
        }
        url::Url::parse(&uri).map_err(|e| SammError::InvalidIri {
            iri: uri.clone(),
            reason: e.to_string(),
        })?;
        self.entries.insert(prefix, uri);
        Ok(())
    }

    /// Add a prefix known to be valid
    pub fn insert_unchecked(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.entries.insert(prefix.into(), uri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    pub fn contains_uri(&self, uri: &str) -> bool {
        self.entries.values().any(|u| u == uri)
    }

    /// First declared URI, treated as the document base
    pub fn base(&self) -> Option<&str> {
        self.entries.first().map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every entry of `other` whose prefix and URI are both unused here
    pub fn merge_missing(&mut self, other: &NamespaceMap) {
        for (prefix, uri) in other.iter() {
            if !self.contains_prefix(prefix) && !self.contains_uri(uri) {
                self.insert_unchecked(prefix, uri);
            }
        }
    }

    /// Expand `prefix:local` into a full IRI; `None` if the prefix is unknown
    pub fn expand(&self, compact: &str) -> Option<String> {
        let (prefix, local) = compact.split_once(':')?;
        self.get(prefix).map(|uri| format!("{uri}{local}"))
    }

    /// Expand when the identifier is prefixed, otherwise return it unchanged
    pub fn expand_or_keep(&self, id: &str) -> String {
        match classify_id(id, self) {
            IdKind::Prefixed => self.expand(id).unwrap_or_else(|| id.to_string()),
            _ => id.to_string(),
        }
    }

    /// Compress a full IRI with the longest matching namespace
    pub fn compress(&self, iri: &str) -> Option<String> {
        self.iter()
            .filter(|(_, uri)| !uri.is_empty() && iri.starts_with(uri))
            .max_by_key(|(_, uri)| uri.len())
            .map(|(prefix, uri)| format!("{}:{}", prefix, &iri[uri.len()..]))
    }
}

impl TryFrom<Vec<(String, String)>> for NamespaceMap {
    type Error = SammError;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self, Self::Error> {
        let mut map = NamespaceMap::new();
        for (prefix, uri) in pairs {
            map.insert(prefix, uri)?;
        }
        Ok(map)
    }
}

impl From<NamespaceMap> for Vec<(String, String)> {
    fn from(map: NamespaceMap) -> Self {
        map.entries.into_iter().collect()
    }
}

/// Turtle PN_PREFIX, restricted to ASCII
fn is_valid_prefix(prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    let mut chars = prefix.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    first_ok
        && !prefix.ends_with('.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Short name of an identifier: the fragment, or the last path segment
///
/// "urn:samm:com.example:1.0.0#temperature" -> "temperature"
/// "samm-c:Text" -> "Text"
pub fn local_name(id: &str) -> &str {
    if let Some(pos) = id.rfind('#') {
        return &id[pos + 1..];
    }
    let trimmed = id.trim_end_matches('/');
    match trimmed.rfind(['/', ':']) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Prefix used for names minted for anonymous elements
pub const AUTO_NAME_PREFIX: &str = "AutoElement";

/// Mints unique identifiers for anonymous elements within one import run
///
/// Names are `<base><AUTO_NAME_PREFIX><n>` with a strictly increasing `n`.
/// Candidates already taken in the caller's registry are skipped.
#[derive(Debug, Clone)]
pub struct AutoNamer {
    base: String,
    counter: u64,
}

impl AutoNamer {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            counter: 0,
        }
    }

    /// Next free identifier according to `is_taken`
    pub fn next_id(&mut self, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{}{}{}", self.base, AUTO_NAME_PREFIX, self.counter);
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}
