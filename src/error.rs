//! Error types for netconf-xml

use thiserror::Error;

/// Main error type for model/XML conversion
///
/// Every variant is non-recoverable: conversions abort on the first error and
/// never retry.
#[derive(Debug, Error)]
pub enum NetconfXmlError {
    /// Compact name with an unsupported `@` layout
    #[error("wrong format of xml element name: {0:?}")]
    NameFormat(String),

    /// `build_element` called without any namespace
    #[error("node doesn't have any namespaces")]
    MissingNamespace,

    /// Value shape not allowed at this position
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Tree nesting deeper than the supported limit
    #[error("Tree depth exceeds limit of {0}")]
    DepthExceeded(usize),

    /// Structurally invalid XML document
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute parsing error
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Serializer failure
    #[error("XML write error: {0}")]
    XmlWrite(String),

    /// Non UTF-8 names or text
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::string::FromUtf8Error> for NetconfXmlError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        NetconfXmlError::Utf8(err.utf8_error())
    }
}

/// Result type alias for netconf-xml operations
pub type Result<T> = std::result::Result<T, NetconfXmlError>;
