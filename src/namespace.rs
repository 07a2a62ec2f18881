//! Namespace prefix registry
//!
//! A [`Namespaces`] value maps short prefixes used in compact names to
//! namespace URIs. One registry is threaded through a single encode or decode
//! call; decoding may add synthesized prefixes for URIs it has not seen.

use log::debug;

use crate::xml::NamespaceDecl;

/// Canonical NETCONF base namespace
pub const NETCONF_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Prefix inserted for the base namespace when the caller supplied none
pub const DEFAULT_NETCONF_PREFIX: &str = "rfc6020";

/// Prefix meaning "no prefix in output" (the default XML namespace)
pub const ROOT_PREFIX: &str = "_";

/// Whether `prefix` denotes the default (unprefixed) namespace
pub fn is_root_prefix(prefix: &str) -> bool {
    prefix.is_empty() || prefix == ROOT_PREFIX
}

/// Ordered prefix -> URI mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    entries: Vec<(String, String)>,
}

impl Namespaces {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only `{"_": NETCONF_NAMESPACE}`
    pub fn netconf_default() -> Self {
        let mut namespaces = Self::new();
        namespaces.insert(ROOT_PREFIX, NETCONF_NAMESPACE);
        namespaces
    }

    /// Bind `prefix` to `uri`, returning the previous URI if it was bound
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, existing)) => Some(std::mem::replace(existing, uri)),
            None => {
                self.entries.push((prefix, uri));
                None
            }
        }
    }

    /// URI bound to `prefix`
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// First prefix (in insertion order) bound to `uri`
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.get(prefix).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(prefix, uri)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Find the prefix bound to the NETCONF base namespace, inserting
    /// [`DEFAULT_NETCONF_PREFIX`] when there is none
    ///
    /// After this call the base namespace always resolves to some prefix.
    pub fn resolve_base_prefix(&mut self) -> String {
        if let Some(prefix) = self.prefix_for(NETCONF_NAMESPACE) {
            return prefix.to_string();
        }

        let mut prefix = DEFAULT_NETCONF_PREFIX.to_string();
        while self.contains_prefix(&prefix) {
            prefix.push('_');
        }
        debug!("binding base namespace to prefix {prefix:?}");
        self.insert(prefix.clone(), NETCONF_NAMESPACE);
        prefix
    }

    /// Namespace declarations to put on a root element, plus the base prefix
    ///
    /// The root prefix becomes the default namespace declaration, every other
    /// prefix an explicit `xmlns:prefix` declaration.
    pub fn render_map(&mut self) -> (Vec<NamespaceDecl>, String) {
        let base_prefix = self.resolve_base_prefix();
        let declarations = self
            .entries
            .iter()
            .map(|(prefix, uri)| {
                if is_root_prefix(prefix) {
                    NamespaceDecl::default_ns(uri.clone())
                } else {
                    NamespaceDecl::prefixed(prefix.clone(), uri.clone())
                }
            })
            .collect();
        (declarations, base_prefix)
    }

    /// Pick a prefix for a URI the registry does not know yet and bind it
    ///
    /// A named prefix the document itself declares for `uri` is preferred.
    /// Otherwise one is derived from the URI (`:` and `/` replaced by `_`,
    /// prefixed with `_`). Collisions are resolved by wrapping the candidate
    /// in further underscores.
    pub fn allocate_prefix(&mut self, uri: &str, preferred: &[NamespaceDecl]) -> String {
        let mut prefix = preferred
            .iter()
            .filter(|decl| decl.uri == uri)
            .find_map(|decl| decl.prefix.clone())
            .unwrap_or_else(|| format!("_{}", uri.replace([':', '/'], "_")));

        while self.contains_prefix(&prefix) {
            prefix = format!("_{prefix}_");
        }
        debug!("allocated prefix {prefix:?} for namespace {uri:?}");
        self.insert(prefix.clone(), uri);
        prefix
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for Namespaces {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        let mut namespaces = Self::new();
        for (prefix, uri) in iter {
            namespaces.insert(prefix, uri);
        }
        namespaces
    }
}

impl<P: Into<String>, U: Into<String>, const N: usize> From<[(P, U); N]> for Namespaces {
    fn from(pairs: [(P, U); N]) -> Self {
        pairs.into_iter().collect()
    }
}
