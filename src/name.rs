//! Qualified element and attribute names.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// An XML name made of an optional namespace URI and a local name.
///
/// The prefix is only a hint for serialization. Two names are equal when
/// their namespace URI and local name are equal, whatever their prefixes.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    namespace: Option<String>,
    local_name: String,
    prefix: Option<String>,
}

impl QName {
    /// Creates a namespaced name. An empty URI means "no namespace".
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Creates a name without namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Tests `self`, used as a location path step, against an element name.
    ///
    /// A step without namespace matches any element with the same local
    /// name, whatever namespace that element is in.
    pub fn matches_step(&self, element: &QName) -> bool {
        match self.namespace {
            None => self.local_name == element.local_name,
            Some(_) => self == element,
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

/// Clark notation, `{uri}local` or `local`.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const GML: &str = "http://www.opengis.net/gml/3.2";

    #[test]
    fn test_equality_ignores_prefix() {
        let a = QName::new(GML, "featureMember").with_prefix("gml");
        let b = QName::new(GML, "featureMember").with_prefix("g");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_empty_namespace_is_absent() {
        let name = QName::new("", "a");
        assert_eq!(name.namespace(), None);
        assert_eq!(name, QName::local("a"));
    }

    #[test]
    fn test_namespace_must_match() {
        assert_ne!(QName::new(GML, "a"), QName::local("a"));
        assert_ne!(QName::new(GML, "a"), QName::new("urn:other", "a"));
    }

    #[test]
    fn test_unqualified_step_matches_local_name_only() {
        let step = QName::local("Envelope");
        assert!(step.matches_step(&QName::new(GML, "Envelope")));
        assert!(step.matches_step(&QName::local("Envelope")));
        assert!(!step.matches_step(&QName::local("envelope")));

        let qualified = QName::new(GML, "Envelope");
        assert!(qualified.matches_step(&QName::new(GML, "Envelope")));
        assert!(!qualified.matches_step(&QName::local("Envelope")));
    }

    #[test]
    fn test_display_clark_notation() {
        assert_eq!(QName::new(GML, "pos").to_string(), format!("{{{}}}pos", GML));
        assert_eq!(QName::local("pos").to_string(), "pos");
    }
}
