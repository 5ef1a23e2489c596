// src/catalog.rs

use crate::error::{NoticeError, Result};
use crate::money::parse_money;
use crate::tabular::Table;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["COD_MULTA", "DESCRICAO", "VALOR", "PONTOS", "GRAVIDADE"];

/// Largest `VALOR` accepted; the settlement multipliers must never overflow.
const MAX_BASE_VALUE: Decimal = dec!(1000000000);

/// Internal fine identifier in `XXX-YZ` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogCode(String);

impl CatalogCode {
    /// Map the notice's 4-digit infraction code and 1-digit split
    /// ("desdobramento") to the catalog code: `7455` + `0` → `745-50`.
    pub fn from_notice(code_4d: &str, subcode_1d: &str) -> Self {
        let split = code_4d
            .char_indices()
            .nth(3)
            .map_or(code_4d.len(), |(idx, _)| idx);
        let (base, suffix) = code_4d.split_at(split);
        CatalogCode(format!("{base}-{suffix}{subcode_1d}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the fine-type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineRecord {
    pub code: String,
    pub description: String,
    pub base_value: Decimal,
    pub points: u32,
    pub severity: String,
}

/// Read-only map from catalog code to fine, built once at startup.
#[derive(Debug, Default)]
pub struct FineCatalog {
    fines: HashMap<String, FineRecord>,
}

impl FineCatalog {
    /// Load `tipos_multa.csv`.
    pub fn load(path: &Path) -> Result<Self> {
        let table = Table::load(path, &REQUIRED_COLUMNS)?;
        Self::from_table(&table).map_err(|e| e.in_file(path))
    }

    pub fn from_table(table: &Table) -> Result<Self> {
        let mut catalog = FineCatalog::default();

        for row in table.rows() {
            let points_raw = row.get("PONTOS");
            let points = points_raw.parse::<u32>().map_err(|_| {
                NoticeError::Configuration(format!(
                    "line {}: PONTOS {points_raw:?} is not a non-negative integer",
                    row.line()
                ))
            })?;

            let base_value = parse_money(row.get("VALOR"));
            if base_value.abs() > MAX_BASE_VALUE {
                return Err(NoticeError::Configuration(format!(
                    "line {}: VALOR {:?} exceeds {MAX_BASE_VALUE}",
                    row.line(),
                    row.get("VALOR")
                )));
            }

            catalog.insert(FineRecord {
                code: row.get("COD_MULTA").to_string(),
                description: row.get("DESCRICAO").to_string(),
                base_value,
                points,
                severity: row.get("GRAVIDADE").to_string(),
            });
        }

        info!(fines = catalog.len(), "Fine catalog loaded");
        Ok(catalog)
    }

    /// Add a fine; the first row for a code wins.
    pub fn insert(&mut self, fine: FineRecord) {
        let code = fine.code.trim().to_string();
        if self.fines.contains_key(&code) {
            warn!(code = %code, "Duplicate COD_MULTA in catalog, keeping first row");
            return;
        }
        self.fines.insert(code, fine);
    }

    pub fn lookup(&self, code: &CatalogCode) -> Result<&FineRecord> {
        let key = code.as_str().trim();
        self.fines
            .get(key)
            .ok_or_else(|| NoticeError::CatalogLookup {
                code: key.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.fines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CATALOG_CSV: &str = "\
COD_MULTA;DESCRICAO;VALOR;PONTOS;GRAVIDADE
745-50;Transitar em velocidade superior à máxima permitida em até 20%;R$ 130,16;4;Média
 605-01 ;Avançar o sinal vermelho do semáforo;R$ 293,47;7;Gravíssima
745-50;Duplicada;R$ 1,00;0;Leve
";

    #[test]
    fn test_code_mapping() {
        assert_eq!(CatalogCode::from_notice("7455", "0").as_str(), "745-50");
        assert_eq!(CatalogCode::from_notice("6050", "1").as_str(), "605-01");
        assert_eq!(CatalogCode::from_notice("5185", "2").to_string().len(), 6);
    }

    #[test]
    fn test_load_and_lookup() {
        let table = Table::parse(CATALOG_CSV, &REQUIRED_COLUMNS).unwrap();
        let catalog = FineCatalog::from_table(&table).unwrap();
        assert_eq!(catalog.len(), 2);

        let fine = catalog.lookup(&CatalogCode::from_notice("7455", "0")).unwrap();
        assert_eq!(fine.base_value, dec!(130.16));
        assert_eq!(fine.points, 4);
        assert_eq!(fine.severity, "Média");

        let trimmed = catalog.lookup(&CatalogCode::from_notice("6050", "1")).unwrap();
        assert_eq!(trimmed.points, 7);
    }

    #[test]
    fn test_lookup_miss_names_code() {
        let table = Table::parse(CATALOG_CSV, &REQUIRED_COLUMNS).unwrap();
        let catalog = FineCatalog::from_table(&table).unwrap();
        let err = catalog
            .lookup(&CatalogCode::from_notice("7456", "0"))
            .unwrap_err();
        assert!(matches!(err, NoticeError::CatalogLookup { ref code } if code == "745-60"));
    }

    #[test]
    fn test_bad_points_rejected_at_load() {
        let csv = "COD_MULTA;DESCRICAO;VALOR;PONTOS;GRAVIDADE\n745-50;x;1;quatro;Média\n";
        let table = Table::parse(csv, &REQUIRED_COLUMNS).unwrap();
        let err = FineCatalog::from_table(&table).unwrap_err();
        assert!(err.to_string().contains("quatro"));
    }

    #[test]
    fn test_lenient_value() {
        let csv = "COD_MULTA;DESCRICAO;VALOR;PONTOS;GRAVIDADE\n745-50;x;a definir;4;Média\n";
        let table = Table::parse(csv, &REQUIRED_COLUMNS).unwrap();
        let catalog = FineCatalog::from_table(&table).unwrap();
        let fine = catalog.lookup(&CatalogCode::from_notice("7455", "0")).unwrap();
        assert_eq!(fine.base_value, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_value_rejected_at_load() {
        let csv = "COD_MULTA;DESCRICAO;VALOR;PONTOS;GRAVIDADE\n\
745-50;x;R$ 50.000.000.000.000.000.000.000.000.000,00;4;Média\n";
        let table = Table::parse(csv, &REQUIRED_COLUMNS).unwrap();
        let err = FineCatalog::from_table(&table).unwrap_err();
        assert!(matches!(err, NoticeError::Configuration(ref msg) if msg.contains("VALOR")));
    }
}
