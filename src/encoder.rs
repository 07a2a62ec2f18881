//! Model to XML encoding

use log::trace;

use crate::MAX_DEPTH;
use crate::error::{NetconfXmlError, Result};
use crate::model::{Tree, Value};
use crate::name::{CompactName, decode_name};
use crate::namespace::{Namespaces, ROOT_PREFIX};
use crate::xml::Element;

/// Build an XML element named `root_tag` whose children encode `model`
///
/// `root_tag` is a compact name resolved under the base prefix. The root
/// carries namespace declarations for every prefix in `namespaces`, and the
/// base namespace is bound (see [`Namespaces::resolve_base_prefix`]) before
/// anything is encoded.
pub fn build_element(model: &Tree, namespaces: &mut Namespaces, root_tag: &str) -> Result<Element> {
    if namespaces.is_empty() {
        return Err(NetconfXmlError::MissingNamespace);
    }
    trace!("building <{root_tag}> from {} entries", model.len());

    let (declarations, base_prefix) = namespaces.render_map();
    // attributes are not supported on the root tag
    let root_name = decode_name(root_tag, &base_prefix, namespaces)?.name;
    let mut root = Element::with_declarations(root_name, declarations);

    encode_tree(&mut root, model, namespaces, ROOT_PREFIX, 0)?;
    Ok(root)
}

/// Encode every entry of `tree` into `parent`, in order
fn encode_tree(
    parent: &mut Element,
    tree: &Tree,
    namespaces: &Namespaces,
    ambient: &str,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(NetconfXmlError::DepthExceeded(MAX_DEPTH));
    }
    for (name, value) in tree.iter() {
        match value {
            Value::List(items) => {
                for item in items {
                    if matches!(item, Value::List(_)) {
                        return Err(NetconfXmlError::InvalidValue(format!(
                            "nested list under {name}"
                        )));
                    }
                    encode_element(parent, name, item, namespaces, ambient, depth)?;
                }
            }
            _ => encode_element(parent, name, value, namespaces, ambient, depth)?,
        }
    }
    Ok(())
}

/// Encode one `(name, value)` entry into `parent`
///
/// Text and raw-fragment markers modify `parent` directly. An attribute name
/// with a scalar value sets an attribute on `parent`; with a tree value it
/// becomes a child element like any other name. Lists must be unrolled by
/// the caller.
pub fn encode_element(
    parent: &mut Element,
    name: &CompactName,
    value: &Value,
    namespaces: &Namespaces,
    ambient: &str,
    depth: usize,
) -> Result<()> {
    match name {
        CompactName::SetText => {
            parent.set_text(scalar_text(name, value)?);
            return Ok(());
        }
        CompactName::RawSplice => {
            let fragment = scalar_text(name, value)?.ok_or_else(|| {
                NetconfXmlError::InvalidValue("raw fragment must not be empty".into())
            })?;
            parent.push(Element::parse(&fragment)?);
            return Ok(());
        }
        _ => {}
    }

    let Some(resolved) = name.resolve(ambient, namespaces) else {
        return Ok(());
    };

    match value {
        Value::Tree(tree) => {
            let mut element_name = resolved.name;
            if resolved.attribute {
                // attribute names carrying structure become elements in the
                // namespace of their prefix
                element_name.namespace = namespaces.get(&resolved.prefix).map(String::from);
            }
            let mut child = Element::new(element_name);
            encode_tree(&mut child, tree, namespaces, &resolved.prefix, depth + 1)?;
            parent.push(child);
        }
        _ if resolved.attribute => {
            let text = scalar_text(name, value)?.unwrap_or_default();
            parent.set_attr(resolved.name, text);
        }
        _ => {
            let mut child = Element::new(resolved.name);
            child.set_text(scalar_text(name, value)?);
            parent.push(child);
        }
    }
    Ok(())
}

fn scalar_text(name: &CompactName, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text.clone())),
        Value::Tree(_) | Value::List(_) => Err(NetconfXmlError::InvalidValue(format!(
            "{name} requires a scalar value"
        ))),
    }
}
