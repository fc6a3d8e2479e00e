use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid UTF-8 in XML input: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An end element was written while no element was open.
    #[error("end element without a matching start element")]
    UnbalancedEndElement,

    /// The document was ended with elements still open.
    #[error("document ended with {0} unclosed element(s)")]
    UnclosedElements(usize),

    /// Attributes and namespace declarations must directly follow a start tag.
    #[error("{0} written without an open start tag")]
    NoOpenStartTag(&'static str),

    #[error("namespace prefix '{0}' is not declared")]
    UndeclaredPrefix(String),

    #[error("invalid location path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
