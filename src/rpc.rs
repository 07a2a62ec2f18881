//! NETCONF `<rpc>` envelope construction

use crate::encoder::build_element;
use crate::error::Result;
use crate::model::{Tree, Value};
use crate::name::CompactName;
use crate::namespace::Namespaces;
use crate::xml::Element;

/// Wrap `payload` in `<rpc message-id=...><operation>...</operation></rpc>`
///
/// The operation and the `message-id` attribute are named under
/// `base_prefix` unless `operation` already carries an explicit prefix
/// (`prefix@name`).
pub fn build_rpc(
    message_id: &str,
    operation: &str,
    base_prefix: &str,
    payload: impl Into<Value>,
    namespaces: &mut Namespaces,
) -> Result<Element> {
    let operation_name: CompactName = if operation.contains('@') {
        operation.parse()?
    } else {
        format!("{base_prefix}@{operation}").parse()?
    };

    let envelope = Tree::new()
        .with(operation_name, payload)
        .with(CompactName::attribute(base_prefix, "message-id"), message_id);
    build_element(&envelope, namespaces, "rpc")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NETCONF_NAMESPACE;
    use crate::xml::QName;
    use serde_json::json;

    #[test]
    fn test_rpc_under_base_prefix() {
        let mut ns = Namespaces::from([("nc", NETCONF_NAMESPACE), ("_", "urn:data")]);
        let payload = Tree::from_json(&json!({"source": {"running": null}})).unwrap();
        let rpc = build_rpc("7", "get-config", "nc", payload, &mut ns).unwrap();

        assert_eq!(rpc.name(), &QName::qualified(NETCONF_NAMESPACE, "rpc"));
        assert_eq!(
            rpc.attr(&QName::qualified(NETCONF_NAMESPACE, "message-id")),
            Some("7")
        );
        let op = rpc.child_elements().next().unwrap();
        assert_eq!(op.name(), &QName::qualified(NETCONF_NAMESPACE, "get-config"));
        let source = op.child_elements().next().unwrap();
        assert_eq!(source.name(), &QName::qualified(NETCONF_NAMESPACE, "source"));
    }

    #[test]
    fn test_rpc_explicit_operation_namespace() {
        let mut ns = Namespaces::from([("nc", NETCONF_NAMESPACE), ("sys", "urn:sys")]);
        let rpc = build_rpc("1", "sys@reboot", "nc", Value::Null, &mut ns).unwrap();
        let op = rpc.child_elements().next().unwrap();
        assert_eq!(op.name(), &QName::qualified("urn:sys", "reboot"));
        assert_eq!(op.text(), None);
    }

    #[test]
    fn test_rpc_rejects_bad_operation() {
        let mut ns = Namespaces::netconf_default();
        assert!(build_rpc("1", "a@b@c", "nc", Value::Null, &mut ns).is_err());
    }
}
