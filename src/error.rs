// src/error.rs

use std::path::{Path, PathBuf};

/// Number of raw-text characters attached to an extraction failure.
pub const DIAGNOSTIC_EXCERPT_CHARS: usize = 6000;

/// Everything that can go wrong while resolving a notice.
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    /// The PDF could not be opened or parsed.
    #[error("could not read PDF {}: {reason}", .path.display())]
    DocumentRead { path: PathBuf, reason: String },

    /// One or more mandatory fields were not found in the notice text.
    #[error(
        "could not extract fields {missing:?} from the PDF\n\nextracted text (first {limit} chars):\n\n{excerpt}",
        limit = DIAGNOSTIC_EXCERPT_CHARS
    )]
    Extraction {
        missing: Vec<&'static str>,
        excerpt: String,
    },

    /// The resolved catalog code has no catalog row.
    #[error("COD_MULTA {code} not found in the fine catalog")]
    CatalogLookup { code: String },

    /// The requested driver is not in the roster.
    #[error("driver {name:?} not found in the roster")]
    RosterLookup { name: String },

    /// Missing file, missing column or malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A settlement amount does not fit in a decimal.
    #[error("settlement amount for base value {base} overflows")]
    AmountOverflow { base: rust_decimal::Decimal },

    /// The message template references a key with no value.
    #[error("message template references unknown key {{{0}}}")]
    MissingTemplateKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NoticeError>;

impl NoticeError {
    /// Build an extraction failure carrying the head of the raw text.
    pub fn extraction(missing: Vec<&'static str>, text: &str) -> Self {
        NoticeError::Extraction {
            missing,
            excerpt: text.chars().take(DIAGNOSTIC_EXCERPT_CHARS).collect(),
        }
    }

    /// Prefix a configuration error with the file it came from.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            NoticeError::Configuration(msg) => {
                NoticeError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        }
    }
}
