//! Compact name convention
//!
//! Keys of a model tree encode element and attribute identities as short
//! strings:
//!
//! | compact        | meaning                                            |
//! |----------------|----------------------------------------------------|
//! | `local`        | element in the ambient namespace                   |
//! | `p@local`      | element in the namespace bound to `p`              |
//! | `_@p@local`    | attribute in the namespace bound to `p`            |
//! | `_@@local`     | attribute using the ambient prefix                 |
//! | `_@@`          | text content of the enclosing element              |
//! | `_!_`          | raw XML fragment spliced into the enclosing element|
//!
//! [`CompactName`] is the parsed form; malformed strings are rejected when
//! they are parsed, never during tree traversal.

use std::fmt;
use std::str::FromStr;

use crate::error::{NetconfXmlError, Result};
use crate::namespace::{Namespaces, is_root_prefix};
use crate::xml::{NamespaceDecl, QName};

/// Key that sets the text of the enclosing element
pub const TEXT_KEY: &str = "_@@";

/// Key that splices a raw XML fragment into the enclosing element
pub const RAW_KEY: &str = "_!_";

/// Parsed compact name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompactName {
    /// Element in the ambient namespace
    Local(String),
    /// Element with an explicit prefix (empty prefix means ambient)
    Prefixed { prefix: String, local: String },
    /// Attribute; `None` prefix means ambient
    Attribute {
        prefix: Option<String>,
        local: String,
    },
    /// Text content of the enclosing element
    SetText,
    /// Pre-serialized XML fragment
    RawSplice,
}

impl CompactName {
    pub fn local(local: impl Into<String>) -> Self {
        CompactName::Local(local.into())
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        CompactName::Prefixed {
            prefix: prefix.into(),
            local: local.into(),
        }
    }

    /// Attribute name; an empty prefix means ambient
    pub fn attribute(prefix: &str, local: impl Into<String>) -> Self {
        CompactName::Attribute {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            local: local.into(),
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, CompactName::Attribute { .. })
    }

    /// Resolve against the ambient prefix and a registry
    ///
    /// Returns `None` for [`CompactName::SetText`] and
    /// [`CompactName::RawSplice`], which do not name a node. A prefix the
    /// registry does not know yields an unqualified name rather than an error.
    pub fn resolve(&self, ambient: &str, namespaces: &Namespaces) -> Option<ResolvedName> {
        let (attribute, prefix, local) = match self {
            CompactName::Local(local) => (false, ambient, local),
            CompactName::Prefixed { prefix, local } => (false, prefix.as_str(), local),
            CompactName::Attribute { prefix, local } => {
                (true, prefix.as_deref().unwrap_or(ambient), local)
            }
            CompactName::SetText | CompactName::RawSplice => return None,
        };
        let prefix = if prefix.is_empty() { ambient } else { prefix };

        let mut namespace = namespaces.get(prefix).map(String::from);
        // unprefixed XML attributes never take the default namespace
        if attribute && is_root_prefix(prefix) {
            namespace = None;
        }

        Some(ResolvedName {
            attribute,
            prefix: prefix.to_string(),
            name: QName {
                namespace,
                local: local.clone(),
            },
        })
    }
}

impl FromStr for CompactName {
    type Err = NetconfXmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            TEXT_KEY => return Ok(CompactName::SetText),
            RAW_KEY => return Ok(CompactName::RawSplice),
            _ => {}
        }

        let parts: Vec<&str> = s.split('@').collect();
        let name = match parts.as_slice() {
            [local] => CompactName::local(*local),
            [prefix, local] => CompactName::prefixed(*prefix, *local),
            ["_", prefix, local] => CompactName::attribute(prefix, *local),
            _ => return Err(NetconfXmlError::NameFormat(s.to_string())),
        };

        match &name {
            CompactName::Local(local)
            | CompactName::Prefixed { local, .. }
            | CompactName::Attribute { local, .. }
                if local.is_empty() =>
            {
                Err(NetconfXmlError::NameFormat(s.to_string()))
            }
            _ => Ok(name),
        }
    }
}

impl fmt::Display for CompactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactName::Local(local) => f.write_str(local),
            CompactName::Prefixed { prefix, local } => write!(f, "{}@{}", prefix, local),
            CompactName::Attribute {
                prefix: Some(prefix),
                local,
            } => write!(f, "_@{}@{}", prefix, local),
            CompactName::Attribute {
                prefix: None,
                local,
            } => write!(f, "_@@{}", local),
            CompactName::SetText => f.write_str(TEXT_KEY),
            CompactName::RawSplice => f.write_str(RAW_KEY),
        }
    }
}

impl TryFrom<&str> for CompactName {
    type Error = NetconfXmlError;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// A compact name resolved against a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub attribute: bool,
    /// Prefix the name resolved under; becomes the ambient prefix of children
    pub prefix: String,
    pub name: QName,
}

/// Parse and resolve a compact name string in one step
pub fn decode_name(compact: &str, ambient: &str, namespaces: &Namespaces) -> Result<ResolvedName> {
    let name: CompactName = compact.parse()?;
    name.resolve(ambient, namespaces).ok_or_else(|| {
        NetconfXmlError::NameFormat(format!("{compact} does not name an element or attribute"))
    })
}

/// Turn a resolved element name back into its compact form
///
/// Unqualified names stay bare. A URI the registry knows is written with its
/// first prefix (bare for the root prefix). Unknown URIs get a prefix
/// allocated in `namespaces`, preferring one from `in_scope`, the document's
/// own bindings at that node.
pub fn encode_name(name: &QName, namespaces: &mut Namespaces, in_scope: &[NamespaceDecl]) -> CompactName {
    let Some(uri) = name.namespace.as_deref() else {
        return CompactName::local(name.local.clone());
    };

    let prefix = match namespaces.prefix_for(uri) {
        Some(prefix) if is_root_prefix(prefix) => {
            return CompactName::local(name.local.clone());
        }
        Some(prefix) => prefix.to_string(),
        None => namespaces.allocate_prefix(uri, in_scope),
    };
    CompactName::prefixed(prefix, name.local.clone())
}

/// Compact form of an attribute name: the element form behind an extra
/// attribute marker
pub fn encode_attribute_name(
    name: &QName,
    namespaces: &mut Namespaces,
    in_scope: &[NamespaceDecl],
) -> CompactName {
    match encode_name(name, namespaces, in_scope) {
        CompactName::Prefixed { prefix, local } => CompactName::Attribute {
            prefix: Some(prefix),
            local,
        },
        CompactName::Local(local) => CompactName::Attribute {
            prefix: None,
            local,
        },
        other => other,
    }
}
