//! Traffic-fine notice resolution.
//!
//! Reads a traffic citation PDF, recovers the citation fields, matches the
//! infraction against the fine catalog and produces the driver message and
//! the authorization record. Front-ends (the `multas` CLI included) only
//! call into this library.

pub mod audit_log;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod heuristics;
pub mod message;
pub mod money;
pub mod pipeline;
pub mod roster;
pub mod settlement;
pub mod tabular;
pub mod text_extract;

pub use catalog::{CatalogCode, FineCatalog, FineRecord};
pub use error::{NoticeError, Result};
pub use heuristics::ExtractedFields;
pub use pipeline::{ExtractionPipeline, Resolution};
pub use settlement::{SettlementAmounts, SettlementRules};
