// src/pipeline.rs

use crate::catalog::{CatalogCode, FineCatalog, FineRecord};
use crate::error::Result;
use crate::heuristics::{self, ExtractedFields};
use crate::message::MessageComposer;
use crate::roster::RosterEntry;
use crate::settlement::{SettlementAmounts, SettlementRules};
use crate::text_extract;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// A notice whose fine was found in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub fields: ExtractedFields,
    pub code: CatalogCode,
    pub fine: FineRecord,
}

/// Turns one notice PDF into a resolved fine. Holds the catalog and the
/// business rules; nothing in here is mutated after construction.
pub struct ExtractionPipeline {
    catalog: FineCatalog,
    rules: SettlementRules,
    composer: MessageComposer,
}

impl ExtractionPipeline {
    pub fn new(catalog: FineCatalog, rules: SettlementRules, composer: MessageComposer) -> Self {
        Self {
            catalog,
            rules,
            composer,
        }
    }

    /// PDF → text → fields → catalog code → fine.
    ///
    /// Stops at the first failing stage; there are no partial results.
    pub fn resolve(&self, pdf_path: &Path) -> Result<Resolution> {
        let span = tracing::info_span!("resolve", pdf = %pdf_path.display());
        let _guard = span.enter();

        let text = text_extract::extract_text(pdf_path)?;
        self.resolve_text(&text)
    }

    /// Same as [`resolve`](Self::resolve) for text already pulled out of a PDF.
    pub fn resolve_text(&self, text: &str) -> Result<Resolution> {
        let fields = heuristics::extract_fields(text)?;
        let code = CatalogCode::from_notice(&fields.infraction_code_4d, &fields.subcode_1d);
        let fine = self.catalog.lookup(&code)?.clone();

        info!(
            code = %code,
            base_value = %fine.base_value,
            points = fine.points,
            severity = %fine.severity,
            "Fine resolved"
        );

        Ok(Resolution { fields, code, fine })
    }

    pub fn settlement(&self, base_value: rust_decimal::Decimal) -> Result<SettlementAmounts> {
        self.rules.compute(base_value)
    }

    pub fn compose_message(&self, driver: &RosterEntry, resolution: &Resolution) -> Result<String> {
        let amounts = self.settlement(resolution.fine.base_value)?;
        self.composer.compose(driver, resolution, &amounts)
    }

    pub fn catalog(&self) -> &FineCatalog {
        &self.catalog
    }
}
