//! Error type for loading rule sources.

use std::path::PathBuf;

/// Error type for rule source loading.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },
    #[error("Invalid XML in {origin}: {source}")]
    Xml {
        origin: String,
        source: quick_xml::DeError,
    },
    #[error("Invalid base64 in {origin}: {source}")]
    Base64 {
        origin: String,
        source: base64::DecodeError,
    },
    #[error("Decoded {origin} is not UTF-8: {source}")]
    Utf8 {
        origin: String,
        source: std::string::FromUtf8Error,
    },
}

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn xml(origin: impl Into<String>, source: quick_xml::DeError) -> Self {
        Self::Xml {
            origin: origin.into(),
            source,
        }
    }
}
