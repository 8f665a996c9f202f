use brandex_core::errors::ApplicationError;
use thiserror::Error;

/// Why a catalog load produced nothing. Every variant degrades to an empty catalog.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("catalog source `{source_label}` is unavailable: {reason}")]
    SourceUnavailable { source_label: String, reason: String },
    #[error("catalog file `{path}` has unsupported format `{extension}`")]
    UnsupportedFormat { path: String, extension: String },
    #[error("feed document is malformed: {reason}")]
    MalformedDocument { reason: String, excerpt: String },
    #[error("feed schema could not be resolved: {reason}")]
    SchemaUnresolved { reason: String, excerpt: String },
}

impl IngestError {
    /// Prefix of the undecoded payload (lossy UTF-8) kept for manual inspection, when the
    /// failure had a payload.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            Self::MalformedDocument { excerpt, .. } | Self::SchemaUnresolved { excerpt, .. } => {
                Some(excerpt)
            }
            Self::SourceUnavailable { .. } | Self::UnsupportedFormat { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::MalformedDocument { .. } => "malformed_document",
            Self::SchemaUnresolved { .. } => "schema_unresolved",
        }
    }
}

impl From<IngestError> for ApplicationError {
    fn from(value: IngestError) -> Self {
        ApplicationError::Ingestion(value.to_string())
    }
}
