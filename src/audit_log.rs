use crate::document::DisclosureDecision;
use crate::error::Result;
use crate::pipeline::Resolution;
use crate::roster::RosterEntry;
use crate::settlement::SettlementAmounts;
use rusqlite::{Connection, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

/// Hex characters kept from the record digest.
const RECORD_ID_LEN: usize = 10;

/// Append-only trail of generated authorizations.
pub struct AuditLog {
    conn: Connection,
}

/// One authorization, with the fixed column set downstream reports read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub id_registro: String,
    pub data_registro: String,
    pub motorista_id: String,
    pub nome_motorista: String,
    pub telefone: String,
    pub placa: String,
    pub uf: String,
    pub cidade: String,
    /// ISO `YYYY-MM-DD`
    pub data_multa: String,
    pub hora_multa: String,
    pub codigo_multa: String,
    pub descricao_multa: String,
    pub valor_base: String,
    pub pontos: u32,
    pub valor_com_indicacao: String,
    pub valor_sem_indicacao: String,
    pub decisao_indicar: String,
    pub gravidade_multa: String,
}

impl AuditRow {
    pub fn new(
        record_id: &str,
        now: OffsetDateTime,
        driver: &RosterEntry,
        resolution: &Resolution,
        amounts: &SettlementAmounts,
        decision: DisclosureDecision,
    ) -> Self {
        let fields = &resolution.fields;
        let fine = &resolution.fine;

        Self {
            id_registro: record_id.to_string(),
            data_registro: now
                .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
                .unwrap_or_default(),
            motorista_id: driver.driver_id.clone(),
            nome_motorista: driver.short_name.clone(),
            telefone: driver.phone.clone(),
            placa: fields.plate.clone(),
            uf: fields.state.clone(),
            cidade: fields.city.clone(),
            data_multa: iso_date(&fields.citation_date),
            hora_multa: fields.citation_time.clone(),
            codigo_multa: resolution.code.to_string(),
            descricao_multa: fine.description.clone(),
            valor_base: fine.base_value.to_string(),
            pontos: fine.points,
            valor_com_indicacao: amounts.with_disclosure.to_string(),
            valor_sem_indicacao: amounts.without_disclosure.to_string(),
            decisao_indicar: decision.to_string(),
            gravidade_multa: fine.severity.clone(),
        }
    }
}

/// `DD/MM/YYYY` → `YYYY-MM-DD`; an impossible date becomes `""`.
pub fn iso_date(citation_date: &str) -> String {
    Date::parse(citation_date, format_description!("[day]/[month]/[year]"))
        .ok()
        .and_then(|d| d.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| {
            warn!(date = %citation_date, "Citation date is not a calendar date");
            String::new()
        })
}

impl AuditLog {
    /// Open (or create) the audit database.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS authorizations (
                id_registro TEXT PRIMARY KEY,
                data_registro TEXT NOT NULL DEFAULT '',
                motorista_id TEXT NOT NULL DEFAULT '',
                nome_motorista TEXT NOT NULL DEFAULT '',
                telefone TEXT NOT NULL DEFAULT '',
                placa TEXT NOT NULL DEFAULT '',
                uf TEXT NOT NULL DEFAULT '',
                cidade TEXT NOT NULL DEFAULT '',
                data_multa TEXT NOT NULL DEFAULT '',
                hora_multa TEXT NOT NULL DEFAULT '',
                codigo_multa TEXT NOT NULL DEFAULT '',
                descricao_multa TEXT NOT NULL DEFAULT '',
                valor_base TEXT NOT NULL DEFAULT '',
                pontos INTEGER NOT NULL DEFAULT 0,
                valor_com_indicacao TEXT NOT NULL DEFAULT '',
                valor_sem_indicacao TEXT NOT NULL DEFAULT '',
                decisao_indicar TEXT NOT NULL DEFAULT '',
                gravidade_multa TEXT NOT NULL DEFAULT ''
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_authorizations_data_registro
             ON authorizations(data_registro)",
            [],
        )?;

        info!(path = %db_path.display(), "Audit log initialized");
        Ok(Self { conn })
    }

    /// Record id from the driver, the citation and the moment it was generated.
    pub fn generate_record_id(driver: &str, plate: &str, citation: &str, now: &str) -> String {
        let mut hasher = Sha256::new();
        for part in [driver, plate, citation, now] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let mut id = format!("{:x}", hasher.finalize());
        id.truncate(RECORD_ID_LEN);
        id
    }

    pub fn record(&self, row: &AuditRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO authorizations
                (id_registro, data_registro, motorista_id, nome_motorista, telefone,
                 placa, uf, cidade, data_multa, hora_multa, codigo_multa, descricao_multa,
                 valor_base, pontos, valor_com_indicacao, valor_sem_indicacao,
                 decisao_indicar, gravidade_multa)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                row.id_registro,
                row.data_registro,
                row.motorista_id,
                row.nome_motorista,
                row.telefone,
                row.placa,
                row.uf,
                row.cidade,
                row.data_multa,
                row.hora_multa,
                row.codigo_multa,
                row.descricao_multa,
                row.valor_base,
                row.pontos,
                row.valor_com_indicacao,
                row.valor_sem_indicacao,
                row.decisao_indicar,
                row.gravidade_multa,
            ],
        )?;
        info!(id = %row.id_registro, code = %row.codigo_multa, "Authorization logged");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let total: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM authorizations", [], |row| row.get(0))?;
        Ok(total)
    }

    /// Latest rows first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id_registro, data_registro, motorista_id, nome_motorista, telefone,
                    placa, uf, cidade, data_multa, hora_multa, codigo_multa, descricao_multa,
                    valor_base, pontos, valor_com_indicacao, valor_sem_indicacao,
                    decisao_indicar, gravidade_multa
             FROM authorizations
             ORDER BY data_registro DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(AuditRow {
                id_registro: row.get(0)?,
                data_registro: row.get(1)?,
                motorista_id: row.get(2)?,
                nome_motorista: row.get(3)?,
                telefone: row.get(4)?,
                placa: row.get(5)?,
                uf: row.get(6)?,
                cidade: row.get(7)?,
                data_multa: row.get(8)?,
                hora_multa: row.get(9)?,
                codigo_multa: row.get(10)?,
                descricao_multa: row.get(11)?,
                valor_base: row.get(12)?,
                pontos: row.get(13)?,
                valor_com_indicacao: row.get(14)?,
                valor_sem_indicacao: row.get(15)?,
                decisao_indicar: row.get(16)?,
                gravidade_multa: row.get(17)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
