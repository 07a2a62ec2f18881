//! Minimal namespace-aware XML element tree
//!
//! Element and attribute names are held fully resolved (namespace URI plus
//! local name); prefixes only exist as namespace declarations and are chosen
//! again when the tree is written out.

use std::fmt;
use std::io::Write;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};

use crate::MAX_DEPTH;
use crate::error::{NetconfXmlError, Result};

/// Namespace bound to the reserved `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Resolved element or attribute name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, `None` for unqualified names
    pub namespace: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl QName {
    /// Name without a namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Name in namespace `uri`
    pub fn qualified(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(uri.into()),
            local: local.into(),
        }
    }

    /// Parse Clark notation (`{uri}local` or bare `local`)
    pub fn from_clark(expanded: &str) -> Self {
        if let Some(rest) = expanded.strip_prefix('{')
            && let Some((uri, local)) = rest.split_once('}')
        {
            return Self::qualified(uri, local);
        }
        Self::local(expanded)
    }
}

/// Clark notation: `{uri}local`, or `local` when unqualified
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(uri) => write!(f, "{{{}}}{}", uri, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A namespace declaration (`xmlns="..."` or `xmlns:prefix="..."`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` declares the default namespace
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn default_ns(uri: impl Into<String>) -> Self {
        Self {
            prefix: None,
            uri: uri.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            uri: uri.into(),
        }
    }
}

/// Collapse a stack of declarations (outermost first) into the bindings in
/// effect, dropping shadowed and undeclared (`xmlns=""`) entries
pub fn effective_bindings(stack: &[NamespaceDecl]) -> Vec<NamespaceDecl> {
    let mut bindings: Vec<NamespaceDecl> = Vec::new();
    for decl in stack {
        bindings.retain(|b| b.prefix != decl.prefix);
        if !decl.uri.is_empty() {
            bindings.push(decl.clone());
        }
    }
    bindings
}

/// Child node of an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    /// Character data (entity-decoded, CDATA merged in)
    Text(String),
    Comment(String),
}

/// An XML element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QName,
    attributes: Vec<(QName, String)>,
    declarations: Vec<NamespaceDecl>,
    children: Vec<XmlNode>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            declarations: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element carrying namespace declarations
    pub fn with_declarations(name: QName, declarations: Vec<NamespaceDecl>) -> Self {
        Self {
            declarations,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn attributes(&self) -> &[(QName, String)] {
        &self.attributes
    }

    /// Get an attribute value by resolved name
    pub fn attr(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute (overwrites if exists)
    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Namespace declarations made on this element itself
    pub fn declarations(&self) -> &[NamespaceDecl] {
        &self.declarations
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Iterate over child elements only
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Whether the element has element or comment children
    pub fn has_children(&self) -> bool {
        self.children
            .iter()
            .any(|node| !matches!(node, XmlNode::Text(_)))
    }

    /// Text before the first non-text child
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in &self.children {
            match node {
                XmlNode::Text(t) => text.get_or_insert_with(String::new).push_str(t),
                _ => break,
            }
        }
        text
    }

    /// Replace the leading text; `None` removes it
    pub fn set_text(&mut self, text: Option<String>) {
        let leading = self
            .children
            .iter()
            .take_while(|node| matches!(node, XmlNode::Text(_)))
            .count();
        self.children.drain(..leading);
        if let Some(text) = text {
            self.children.insert(0, XmlNode::Text(text));
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append text, merging with a preceding text node
    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self.children.last_mut() {
            Some(XmlNode::Text(existing)) => existing.push_str(&text),
            _ => self.children.push(XmlNode::Text(text)),
        }
    }

    pub fn push_comment(&mut self, comment: impl Into<String>) {
        self.children.push(XmlNode::Comment(comment.into()));
    }

    /// Parse a document (or fragment with a single root) into an element tree
    ///
    /// Declarations, processing instructions and DOCTYPE are skipped, as is
    /// anything outside the root element.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(NetconfXmlError::DepthExceeded(MAX_DEPTH));
                    }
                    stack.push(element_from_start(&reader, &start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&reader, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        NetconfXmlError::InvalidXml("unexpected closing tag".into())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(text.unescape()?.into_owned());
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(String::from_utf8(data.into_inner().into_owned())?);
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_comment(std::str::from_utf8(&comment)?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(NetconfXmlError::InvalidXml("unclosed element".into()));
        }
        root.ok_or_else(|| NetconfXmlError::InvalidXml("document has no root element".into()))
    }

    /// Serialize without indentation
    pub fn to_xml_string(&self) -> Result<String> {
        self.serialize(Writer::new(Vec::new()))
    }

    /// Serialize with two-space indentation
    pub fn to_xml_string_pretty(&self) -> Result<String> {
        self.serialize(Writer::new_with_indent(Vec::new(), b' ', 2))
    }

    /// Write the element into an existing quick-xml writer
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        write_element(self, writer, &mut Vec::new())
    }

    fn serialize(&self, mut writer: Writer<Vec<u8>>) -> Result<String> {
        self.write_to(&mut writer)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

impl std::str::FromStr for Element {
    type Err = NetconfXmlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(NetconfXmlError::InvalidXml(
                "more than one root element".into(),
            ));
        }
    }
    Ok(())
}

fn bound_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => {
            let uri = std::str::from_utf8(ns.into_inner())?;
            Ok((!uri.is_empty()).then(|| uri.to_string()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(NetconfXmlError::InvalidXml(format!(
            "unknown namespace prefix {:?}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn element_from_start(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> Result<Element> {
    let (resolved, local) = reader.resolve_element(start.name());
    let name = QName {
        namespace: bound_namespace(resolved)?,
        local: std::str::from_utf8(local.into_inner())?.to_string(),
    };
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        let key = attr.key.as_ref();

        if key == b"xmlns" {
            element.declarations.push(NamespaceDecl::default_ns(value));
            continue;
        }
        if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            let prefix = std::str::from_utf8(prefix)?;
            element
                .declarations
                .push(NamespaceDecl::prefixed(prefix, value));
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        let name = QName {
            namespace: bound_namespace(resolved)?,
            local: std::str::from_utf8(local.into_inner())?.to_string(),
        };
        element.attributes.push((name, value));
    }

    Ok(element)
}

fn write_error(err: impl fmt::Display) -> NetconfXmlError {
    NetconfXmlError::XmlWrite(err.to_string())
}

/// Prefix in effect for `uri`: `Some(None)` for the default namespace,
/// `Some(Some(p))` for a named prefix, `None` when unbound
///
/// Attributes cannot use the default namespace.
fn lookup_prefix(scope: &[NamespaceDecl], uri: &str, attribute: bool) -> Option<Option<String>> {
    if uri == XML_NAMESPACE {
        return Some(Some("xml".to_string()));
    }
    let mut seen: Vec<Option<&str>> = Vec::new();
    for decl in scope.iter().rev() {
        let prefix = decl.prefix.as_deref();
        if seen.contains(&prefix) {
            continue;
        }
        seen.push(prefix);
        if decl.uri == uri && !(attribute && prefix.is_none()) {
            return Some(prefix.map(String::from));
        }
    }
    None
}

/// Render a resolved name as `prefix:local`, declaring a fresh `nsN` prefix
/// when the namespace is not bound in scope
fn qualify(
    name: &QName,
    scope: &mut Vec<NamespaceDecl>,
    added: &mut Vec<NamespaceDecl>,
    attribute: bool,
) -> String {
    // unqualified names are written as-is, without an xmlns="" undeclaration
    let Some(uri) = name.namespace.as_deref() else {
        return name.local.clone();
    };

    match lookup_prefix(scope, uri, attribute) {
        Some(Some(prefix)) => format!("{}:{}", prefix, name.local),
        Some(None) => name.local.clone(),
        None => {
            let prefix = (0..)
                .map(|n| format!("ns{n}"))
                .find(|candidate| {
                    !scope
                        .iter()
                        .any(|d| d.prefix.as_deref() == Some(candidate.as_str()))
                })
                .unwrap_or_default();
            let decl = NamespaceDecl::prefixed(prefix.clone(), uri);
            scope.push(decl.clone());
            added.push(decl);
            format!("{}:{}", prefix, name.local)
        }
    }
}

fn write_element<W: Write>(
    element: &Element,
    writer: &mut Writer<W>,
    scope: &mut Vec<NamespaceDecl>,
) -> Result<()> {
    let mark = scope.len();
    scope.extend(element.declarations.iter().cloned());

    let mut added = Vec::new();
    let tag = qualify(&element.name, scope, &mut added, false);
    let attributes: Vec<(String, &str)> = element
        .attributes
        .iter()
        .map(|(name, value)| (qualify(name, scope, &mut added, true), value.as_str()))
        .collect();

    let mut start = BytesStart::new(tag.as_str());
    for decl in element.declarations.iter().chain(added.iter()) {
        let key = match &decl.prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), decl.uri.as_str()));
    }
    for (name, value) in &attributes {
        start.push_attribute((name.as_str(), *value));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(write_error)?;
    } else {
        let end = start.to_end().into_owned();
        writer
            .write_event(Event::Start(start))
            .map_err(write_error)?;
        for child in &element.children {
            match child {
                XmlNode::Element(e) => write_element(e, writer, scope)?,
                XmlNode::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?,
                XmlNode::Comment(comment) => writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                    .map_err(write_error)?,
            }
        }
        writer.write_event(Event::End(end)).map_err(write_error)?;
    }

    scope.truncate(mark);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NC: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<rpc xmlns="urn:a" xmlns:x="urn:x" x:id="1"><x:get>text</x:get><plain a="b"/></rpc>"#;
        let root = Element::parse(xml).unwrap();

        assert_eq!(root.name(), &QName::qualified("urn:a", "rpc"));
        assert_eq!(root.attr(&QName::qualified("urn:x", "id")), Some("1"));
        assert_eq!(root.declarations().len(), 2);

        let children: Vec<&Element> = root.child_elements().collect();
        assert_eq!(children[0].name(), &QName::qualified("urn:x", "get"));
        assert_eq!(children[0].text().as_deref(), Some("text"));
        assert_eq!(children[1].name(), &QName::qualified("urn:a", "plain"));
        assert_eq!(children[1].attr(&QName::local("a")), Some("b"));
    }

    #[test]
    fn test_parse_undeclared_default() {
        let root = Element::parse(r#"<a xmlns="urn:a"><b xmlns=""/></a>"#).unwrap();
        let b = root.child_elements().next().unwrap();
        assert_eq!(b.name(), &QName::local("b"));
    }

    #[test]
    fn test_parse_comments_and_cdata() {
        let root = Element::parse("<a><![CDATA[x<y]]><!-- note --></a>").unwrap();
        assert_eq!(root.text().as_deref(), Some("x<y"));
        assert!(root.has_children());
        assert!(matches!(&root.children()[1], XmlNode::Comment(c) if c == " note "));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("<a/><b/>").is_err());
        assert!(Element::parse("<p:a/>").is_err());
    }

    #[test]
    fn test_serialize_default_namespace() {
        let mut root = Element::with_declarations(
            QName::qualified(NC, "rpc"),
            vec![NamespaceDecl::default_ns(NC)],
        );
        root.set_attr(QName::local("message-id"), "101");
        let mut get = Element::new(QName::qualified(NC, "get"));
        get.push(Element::new(QName::local("filter")));
        root.push(get);

        assert_eq!(
            root.to_xml_string().unwrap(),
            format!(r#"<rpc xmlns="{NC}" message-id="101"><get><filter/></get></rpc>"#)
        );
    }

    #[test]
    fn test_serialize_invents_prefix() {
        let mut root = Element::new(QName::local("a"));
        root.set_attr(QName::qualified("urn:x", "id"), "1");
        let mut child = Element::new(QName::qualified("urn:y", "b"));
        child.set_text(Some("1 < 2".into()));
        root.push(child);

        assert_eq!(
            root.to_xml_string().unwrap(),
            r#"<a xmlns:ns0="urn:x" ns0:id="1"><ns1:b xmlns:ns1="urn:y">1 &lt; 2</ns1:b></a>"#
        );
    }

    #[test]
    fn test_reparse_serialized() {
        let xml = r#"<a xmlns="urn:a" xmlns:p="urn:p"><p:b p:c="d">e</p:b><!--x--></a>"#;
        let root = Element::parse(xml).unwrap();
        let again = Element::parse(&root.to_xml_string().unwrap()).unwrap();
        assert_eq!(root, again);
    }

    #[test]
    fn test_set_text_replaces_leading() {
        let mut root = Element::new(QName::local("a"));
        root.push_text("old");
        root.push(Element::new(QName::local("b")));
        root.set_text(Some("new".into()));
        assert_eq!(root.text().as_deref(), Some("new"));
        root.set_text(None);
        assert_eq!(root.text(), None);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_clark_notation() {
        let name = QName::from_clark("{urn:a}b");
        assert_eq!(name, QName::qualified("urn:a", "b"));
        assert_eq!(name.to_string(), "{urn:a}b");
        assert_eq!(QName::from_clark("plain"), QName::local("plain"));
    }

    #[test]
    fn test_effective_bindings() {
        let stack = vec![
            NamespaceDecl::default_ns("urn:a"),
            NamespaceDecl::prefixed("p", "urn:p"),
            NamespaceDecl::default_ns(""),
            NamespaceDecl::prefixed("p", "urn:q"),
        ];
        assert_eq!(
            effective_bindings(&stack),
            vec![NamespaceDecl::prefixed("p", "urn:q")]
        );
    }
}
