// src/roster.rs

use crate::error::{NoticeError, Result};
use crate::tabular::Table;
use serde::Serialize;
use std::path::Path;
use tracing::info;

const NAME_COLUMN: &str = "Nome Curto";
const PHONE_COLUMN: &str = "TELEFONE";
const ID_COLUMN: &str = "Cód. Motorista";

/// A driver from `motoristas.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    /// Empty when the sheet has no driver-code column.
    pub driver_id: String,
    pub short_name: String,
    pub phone: String,
}

#[derive(Debug, Default)]
pub struct DriverRoster {
    drivers: Vec<RosterEntry>,
}

impl DriverRoster {
    pub fn load(path: &Path) -> Result<Self> {
        let table = Table::load(path, &[NAME_COLUMN, PHONE_COLUMN])?;
        Ok(Self::from_table(&table))
    }

    pub fn from_table(table: &Table) -> Self {
        let drivers: Vec<RosterEntry> = table
            .rows()
            .map(|row| RosterEntry {
                driver_id: row.get(ID_COLUMN).to_string(),
                short_name: row.get(NAME_COLUMN).to_string(),
                phone: row.get(PHONE_COLUMN).to_string(),
            })
            .collect();
        info!(
            drivers = drivers.len(),
            has_ids = table.has_column(ID_COLUMN),
            "Driver roster loaded"
        );
        Self { drivers }
    }

    pub fn from_entries(drivers: Vec<RosterEntry>) -> Self {
        Self { drivers }
    }

    /// Short names in sheet order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.iter().map(|d| d.short_name.as_str())
    }

    pub fn find(&self, short_name: &str) -> Result<&RosterEntry> {
        let wanted = short_name.trim();
        self.drivers
            .iter()
            .find(|d| d.short_name == wanted)
            .ok_or_else(|| NoticeError::RosterLookup {
                name: wanted.to_string(),
            })
    }
}
