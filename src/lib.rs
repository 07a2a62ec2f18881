//! netconf-xml - model/XML codec for NETCONF messages
//!
//! This library converts between an ordered key-value tree (the model) and a
//! namespace-correct XML element tree, and builds NETCONF `<rpc>` envelopes.
//! Model keys use a compact naming convention (`prefix@local`,
//! `_@prefix@attr`, ...) described in [`name`].
//!
//! # Example
//!
//! ```no_run
//! use netconf_xml::{Namespaces, Tree, build_rpc, decode_str};
//! use serde_json::json;
//!
//! let mut namespaces = Namespaces::netconf_default();
//! let payload = Tree::from_json(&json!({"source": {"running": null}})).unwrap();
//! let rpc = build_rpc("101", "get-config", "_", payload, &mut namespaces).unwrap();
//! let xml = rpc.to_xml_string().unwrap();
//!
//! // and back again
//! let model = decode_str(&xml, &mut Namespaces::netconf_default()).unwrap();
//! println!("{}", model.to_json());
//! ```

pub mod decoder;
pub mod encoder;
mod error;
pub mod model;
pub mod name;
pub mod namespace;
mod rpc;
pub mod xml;

/// Maximum element nesting accepted by the parser, encoder and decoder
pub const MAX_DEPTH: usize = 512;

pub use decoder::{decode_document, decode_str};
pub use encoder::build_element;
pub use error::{NetconfXmlError, Result};
pub use model::{Tree, Value};
pub use name::CompactName;
pub use namespace::{NETCONF_NAMESPACE, Namespaces};
pub use rpc::build_rpc;
pub use xml::{Element, QName};
