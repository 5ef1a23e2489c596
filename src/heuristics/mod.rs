// src/heuristics/mod.rs

mod notice;

use crate::error::{NoticeError, Result};
use serde::Deserialize;
use serde::Serialize;
use tracing::{info, warn};

pub use notice::{extract_city_state, title_case};

/// Structured data recovered from a traffic-fine notice.
///
/// Every field is kept as the literal text printed on the notice. The
/// date is only parsed when the audit row is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub plate: String,
    /// `DD/MM/YYYY`
    pub citation_date: String,
    /// `HH:MM`
    pub citation_time: String,
    /// Empty when the municipality block could not be read.
    pub city: String,
    /// Two-letter UF, empty alongside `city`.
    pub state: String,
    pub infraction_code_4d: String,
    pub subcode_1d: String,
    /// Amount as printed, e.g. `R$ 130,16`. The catalog value is authoritative.
    pub raw_value_token: String,
    pub free_text_description: String,
}

/// Raw result of running every field matcher once.
#[derive(Debug, Default)]
pub(crate) struct NoticeScan {
    pub plate: Option<String>,
    pub citation_date: Option<String>,
    pub citation_time: Option<String>,
    pub infraction_code_4d: Option<String>,
    pub subcode_1d: Option<String>,
    pub raw_value_token: Option<String>,
    pub city: String,
    pub state: String,
    pub free_text_description: String,
}

impl NoticeScan {
    /// Names of the mandatory fields that did not match, in notice order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("placa", &self.plate),
            ("data_multa", &self.citation_date),
            ("hora_multa", &self.citation_time),
            ("codigo_infracao", &self.infraction_code_4d),
            ("desdobramento", &self.subcode_1d),
            ("valor_pdf", &self.raw_value_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }

    fn into_fields(self) -> ExtractedFields {
        ExtractedFields {
            plate: self.plate.unwrap_or_default(),
            citation_date: self.citation_date.unwrap_or_default(),
            citation_time: self.citation_time.unwrap_or_default(),
            city: self.city,
            state: self.state,
            infraction_code_4d: self.infraction_code_4d.unwrap_or_default(),
            subcode_1d: self.subcode_1d.unwrap_or_default(),
            raw_value_token: self.raw_value_token.unwrap_or_default(),
            free_text_description: self.free_text_description,
        }
    }
}

/// Extract the notice fields from raw PDF text.
///
/// Fails with a single [`NoticeError::Extraction`] naming every mandatory
/// field that could not be found, never just the first one.
pub fn extract_fields(text: &str) -> Result<ExtractedFields> {
    let scan = notice::scan(text);

    let missing = scan.missing();
    if !missing.is_empty() {
        warn!(missing = ?missing, chars = text.len(), "Mandatory notice fields not found");
        return Err(NoticeError::extraction(missing, text));
    }

    if scan.city.is_empty() {
        warn!("City/UF not found in notice, continuing without it");
    }

    let fields = scan.into_fields();
    info!(
        plate = %fields.plate,
        date = %fields.citation_date,
        time = %fields.citation_time,
        code = %fields.infraction_code_4d,
        subcode = %fields.subcode_1d,
        city = %fields.city,
        state = %fields.state,
        "Notice fields extracted"
    );
    Ok(fields)
}
