//! XML to model decoding

use log::trace;

use crate::MAX_DEPTH;
use crate::error::{NetconfXmlError, Result};
use crate::model::{Tree, Value};
use crate::name::{CompactName, encode_attribute_name, encode_name};
use crate::namespace::Namespaces;
use crate::xml::{Element, NamespaceDecl, effective_bindings};

/// Decode an element tree into a model with the element itself as the only
/// top-level key
///
/// `namespaces` seeds the prefixes used for known URIs; prefixes for unknown
/// URIs are allocated into it as they are met.
pub fn decode_document(element: &Element, namespaces: &mut Namespaces) -> Result<Tree> {
    namespaces.resolve_base_prefix();
    trace!("decoding <{}>", element.name());

    let mut accumulator = Tree::new();
    decode_element(&mut accumulator, element, namespaces, &mut Vec::new(), 0)?;
    Ok(accumulator)
}

/// Parse XML text and decode it with [`decode_document`]
pub fn decode_str(xml: &str, namespaces: &mut Namespaces) -> Result<Tree> {
    decode_document(&Element::parse(xml)?, namespaces)
}

/// Decode `element` and merge it into `accumulator`
///
/// `scope` holds the namespace declarations of all ancestors, outermost
/// first; it is restored before returning.
pub fn decode_element(
    accumulator: &mut Tree,
    element: &Element,
    namespaces: &mut Namespaces,
    scope: &mut Vec<NamespaceDecl>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(NetconfXmlError::DepthExceeded(MAX_DEPTH));
    }

    let mark = scope.len();
    scope.extend(element.declarations().iter().cloned());
    let in_scope = effective_bindings(scope);

    let name = encode_name(element.name(), namespaces, &in_scope);

    let value = if !element.has_children() && element.attributes().is_empty() {
        element.text().map_or(Value::Null, Value::Text)
    } else {
        let mut tree = Tree::new();
        if let Some(text) = element.text() {
            let text = text.trim();
            if !text.is_empty() {
                tree.insert(CompactName::SetText, text);
            }
        }
        for child in element.child_elements() {
            decode_element(&mut tree, child, namespaces, scope, depth + 1)?;
        }
        for (attribute, attribute_value) in element.attributes() {
            let attribute_name = encode_attribute_name(attribute, namespaces, &in_scope);
            tree.insert(attribute_name, attribute_value.as_str());
        }
        Value::Tree(tree)
    };

    scope.truncate(mark);
    accumulator.merge(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NETCONF_NAMESPACE;
    use serde_json::json;

    #[test]
    fn test_siblings_become_list() {
        let tree = decode_str("<a><b>x</b><b>y</b></a>", &mut Namespaces::new()).unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"b": ["x", "y"]}}));
    }

    #[test]
    fn test_empty_and_text_leaves() {
        let tree = decode_str("<a><b/><c>1</c></a>", &mut Namespaces::new()).unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"b": null, "c": "1"}}));
    }

    #[test]
    fn test_comments_skipped() {
        let tree = decode_str("<a><!-- x --><b>1</b><!-- y --></a>", &mut Namespaces::new()).unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"b": "1"}}));
    }

    #[test]
    fn test_text_with_attributes() {
        let xml = r#"<a><name kind="phy">  eth0  </name></a>"#;
        let tree = decode_str(xml, &mut Namespaces::new()).unwrap();
        assert_eq!(
            tree.to_json(),
            json!({"a": {"name": {"_@@": "eth0", "_@@kind": "phy"}}})
        );
    }

    #[test]
    fn test_whitespace_between_children_ignored() {
        let xml = "<a>\n  <b>1</b>\n  <c>2</c>\n</a>";
        let tree = decode_str(xml, &mut Namespaces::new()).unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"b": "1", "c": "2"}}));
    }

    #[test]
    fn test_known_namespaces_reused() {
        let xml = format!(
            r#"<rpc-reply xmlns="{NETCONF_NAMESPACE}" xmlns:if="urn:if"><data><if:interfaces/></data></rpc-reply>"#
        );
        let mut ns = Namespaces::from([("_", NETCONF_NAMESPACE), ("ietf-if", "urn:if")]);
        let tree = decode_str(&xml, &mut ns).unwrap();
        assert_eq!(
            tree.to_json(),
            json!({"rpc-reply": {"data": {"ietf-if@interfaces": null}}})
        );
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn test_unknown_namespace_uses_document_prefix() {
        let xml = r#"<a xmlns:v="urn:vendor"><v:b v:id="7">1</v:b></a>"#;
        let mut ns = Namespaces::new();
        let tree = decode_str(xml, &mut ns).unwrap();
        assert_eq!(
            tree.to_json(),
            json!({"a": {"v@b": {"_@@": "1", "_@v@id": "7"}}})
        );
        assert_eq!(ns.get("v"), Some("urn:vendor"));
    }

    #[test]
    fn test_unknown_default_namespace_synthesized() {
        let xml = r#"<a xmlns="urn:x:y"><b/></a>"#;
        let mut ns = Namespaces::new();
        let tree = decode_str(xml, &mut ns).unwrap();
        assert_eq!(tree.to_json(), json!({"_urn_x_y@a": {"_urn_x_y@b": null}}));
    }

    #[test]
    fn test_base_prefix_inserted() {
        let mut ns = Namespaces::new();
        let xml = format!(r#"<ok xmlns="{NETCONF_NAMESPACE}"/>"#);
        let tree = decode_str(&xml, &mut ns).unwrap();
        assert_eq!(tree.to_json(), json!({"rfc6020@ok": null}));
    }
}
