use thiserror::Error;

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { source: io::Error, path: PathBuf },

    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("Neither an events file (`-f`) nor a meeting UUID (`-u`) was specified")]
    NoInputSpecified,

    /// Errors related to reading the XML document
    #[error("Offset {offset}: Malformed XML: {source}")]
    MalformedXml {
        source: quick_xml::Error,
        offset: u64,
    },

    #[error("Reached end of document while element `{name}` is still open")]
    UnclosedElement { name: String },

    #[error("Offset {offset}: Found end tag `</{name}>` without an open element")]
    UnexpectedEndTag { name: String, offset: u64 },

    #[error("Document does not contain a root element")]
    MissingRootElement,

    #[error("Offset {offset}: Found a second root element `{name}`")]
    MultipleRootElements { name: String, offset: u64 },

    #[error("Offset {offset}: Unexpected text outside of the root element")]
    TextOutsideRootElement { offset: u64 },

    #[error("Failed to serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(source: impl Into<quick_xml::Error>, offset: u64) -> Self {
        Error::MalformedXml {
            source: source.into(),
            offset,
        }
    }
}
