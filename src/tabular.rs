// src/tabular.rs

use crate::error::{NoticeError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// A semicolon-separated sheet with validated headers.
#[derive(Debug)]
pub struct Table {
    columns: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Load `path`, failing if the file is missing or lacks a `required` column.
    ///
    /// Files exported from Excel arrive either as UTF-8 with a BOM or as
    /// Latin-1; both are accepted.
    pub fn load(path: &Path, required: &[&str]) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            NoticeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let content = decode(&bytes);
        let table = Self::parse(&content, required).map_err(|e| e.in_file(path))?;
        info!(path = %path.display(), rows = table.rows.len(), "Table loaded");
        Ok(table)
    }

    pub fn parse(content: &str, required: &[&str]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.replace('\u{feff}', "").trim().to_string(), idx))
            .collect();

        if let Some(missing) = required.iter().find(|col| !columns.contains_key(**col)) {
            return Err(NoticeError::Configuration(format!(
                "missing required column {missing:?}"
            )));
        }

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { columns, rows })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Trimmed cell values; absent columns and short rows yield `""`.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |record| Row {
            columns: &self.columns,
            record,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    pub fn get(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|idx| self.record.get(*idx))
            .map(str::trim)
            .unwrap_or("")
    }

    /// 1-based line number in the source file, for error messages.
    pub fn line(&self) -> u64 {
        self.record.position().map_or(0, |p| p.line())
    }
}

fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            warn!("Table is not valid UTF-8, reading as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}
