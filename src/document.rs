// src/document.rs

use crate::audit_log::{AuditLog, AuditRow};
use crate::money::format_brl;
use crate::pipeline::Resolution;
use crate::roster::RosterEntry;
use crate::settlement::SettlementAmounts;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};

const MAX_FILENAME_CHARS: usize = 120;

const MONTHS_PT_BR: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Whether the driver lets the company declare the points on their license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureDecision {
    Disclose,
    Withhold,
}

impl DisclosureDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            DisclosureDecision::Disclose => "SIM",
            DisclosureDecision::Withhold => "NÃO",
        }
    }
}

impl fmt::Display for DisclosureDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisclosureDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sim" | "s" | "yes" | "y" => Ok(DisclosureDecision::Disclose),
            "nao" | "não" | "n" | "no" => Ok(DisclosureDecision::Withhold),
            other => Err(format!("expected sim or nao, got {other:?}")),
        }
    }
}

impl Serialize for DisclosureDecision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Field mapping handed to the document generator that fills the
/// authorization template.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationContext {
    pub id_registro: String,
    pub data_hoje: String,
    pub data_registro: String,
    pub motorista_id: String,
    pub nome_motorista: String,
    pub telefone: String,
    pub placa: String,
    pub cidade: String,
    pub uf: String,
    pub data_multa: String,
    pub hora_multa: String,
    pub codigo_multa: String,
    pub descricao_multa: String,
    pub gravidade_multa: String,
    pub valor_base: String,
    pub pontos: u32,
    pub valor_com_indicacao: String,
    pub valor_sem_indicacao: String,
    pub decisao_indicar: DisclosureDecision,
    pub marca_com_indicacao: &'static str,
    pub marca_sem_indicacao: &'static str,
}

impl AuthorizationContext {
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
        let mark = |wanted: DisclosureDecision| if decision == wanted { "X" } else { "" };
        let registered = now
            .format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
            .unwrap_or_default();

        Self {
            id_registro: record_id.to_string(),
            data_hoje: date_in_words(now),
            data_registro: registered,
            motorista_id: driver.driver_id.clone(),
            nome_motorista: driver.short_name.clone(),
            telefone: driver.phone.clone(),
            placa: fields.plate.clone(),
            cidade: fields.city.clone(),
            uf: fields.state.clone(),
            data_multa: fields.citation_date.clone(),
            hora_multa: fields.citation_time.clone(),
            codigo_multa: resolution.code.to_string(),
            descricao_multa: fine.description.clone(),
            gravidade_multa: fine.severity.clone(),
            valor_base: format_brl(fine.base_value),
            pontos: fine.points,
            valor_com_indicacao: format_brl(amounts.with_disclosure),
            valor_sem_indicacao: format_brl(amounts.without_disclosure),
            decisao_indicar: decision,
            marca_com_indicacao: mark(DisclosureDecision::Disclose),
            marca_sem_indicacao: mark(DisclosureDecision::Withhold),
        }
    }
}

/// `13 de Janeiro de 2026`
pub fn date_in_words(dt: OffsetDateTime) -> String {
    let month = MONTHS_PT_BR[usize::from(u8::from(dt.month())) - 1];
    format!("{} de {} de {}", dt.day(), month, dt.year())
}

/// Keep word characters, `-`, `.` and spaces; spaces become `_`.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
        .collect();
    kept.trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// Output name of the merged authorization PDF.
pub fn authorization_file_name(driver_name: &str, citation_date: &str) -> String {
    format!(
        "Autorização Desconto {} {}.pdf",
        sanitize_filename(driver_name),
        citation_date.replace('/', "-")
    )
}

/// Write the field map for the document generator and log the authorization.
///
/// Either both the JSON file and the audit row exist afterwards or neither
/// does: a failed insert removes the file again. Returns the JSON path.
pub fn publish_authorization(
    output_dir: &Path,
    log: &AuditLog,
    context: &AuthorizationContext,
    row: &AuditRow,
) -> crate::error::Result<PathBuf> {
    let document_name = authorization_file_name(&context.nome_motorista, &context.data_multa);
    let out = output_dir.join(&document_name).with_extension("json");
    let json = serde_json::to_string_pretty(context)?;

    fs::create_dir_all(output_dir)?;
    fs::write(&out, json)?;

    if let Err(e) = log.record(row) {
        warn!(path = %out.display(), error = %e, "Audit insert failed, removing field map");
        if let Err(rm) = fs::remove_file(&out) {
            warn!(path = %out.display(), error = %rm, "Could not remove field map");
        }
        return Err(e);
    }

    info!(
        id = %row.id_registro,
        fields = %out.display(),
        document = %document_name,
        "Authorization ready for the document generator"
    );
    Ok(out)
}

/// Output name of the message text file.
pub fn message_file_name(driver_name: &str, citation_date: &str) -> String {
    format!(
        "Mensagem {} {}.txt",
        sanitize_filename(driver_name),
        citation_date.replace('/', "-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogCode, FineRecord};
    use crate::heuristics::ExtractedFields;
    use crate::settlement::SettlementRules;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    #[test]
    fn test_decision_parsing() {
        assert_eq!("SIM".parse::<DisclosureDecision>(), Ok(DisclosureDecision::Disclose));
        assert_eq!("Não".parse::<DisclosureDecision>(), Ok(DisclosureDecision::Withhold));
        assert_eq!("nao".parse::<DisclosureDecision>(), Ok(DisclosureDecision::Withhold));
        assert!("talvez".parse::<DisclosureDecision>().is_err());
    }

    #[test]
    fn test_date_in_words() {
        assert_eq!(
            date_in_words(datetime!(2026-01-13 09:30 UTC)),
            "13 de Janeiro de 2026"
        );
        assert_eq!(date_in_words(datetime!(2025-03-01 00:00 UTC)), "1 de Março de 2025");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(sanitize_filename("  João da Silva! "), "João_da_Silva");
        assert_eq!(sanitize_filename(&"a".repeat(200)).len(), MAX_FILENAME_CHARS);
        assert_eq!(
            authorization_file_name("JOAO SILVA", "12/03/2025"),
            "Autorização Desconto JOAO_SILVA 12-03-2025.pdf"
        );
        assert_eq!(
            message_file_name("MARIA", "01/02/2026"),
            "Mensagem MARIA 01-02-2026.txt"
        );
    }

    fn sample_driver() -> RosterEntry {
        RosterEntry {
            driver_id: "7".into(),
            short_name: "ANA".into(),
            phone: "119".into(),
        }
    }

    fn sample_resolution() -> Resolution {
        Resolution {
            fields: ExtractedFields {
                plate: "ABC1D23".into(),
                citation_date: "01/02/2026".into(),
                citation_time: "08:10".into(),
                ..Default::default()
            },
            code: CatalogCode::from_notice("7455", "0"),
            fine: FineRecord {
                code: "745-50".into(),
                description: "Velocidade".into(),
                base_value: dec!(130.16),
                points: 4,
                severity: "Média".into(),
            },
        }
    }

    #[test]
    fn test_context_markers() {
        let driver = sample_driver();
        let resolution = sample_resolution();
        let amounts = SettlementRules::default().compute(resolution.fine.base_value).unwrap();
        let now = datetime!(2026-02-03 10:05 UTC);

        let ctx = AuthorizationContext::new(
            "abc",
            now,
            &driver,
            &resolution,
            &amounts,
            DisclosureDecision::Withhold,
        );
        assert_eq!(ctx.marca_com_indicacao, "");
        assert_eq!(ctx.marca_sem_indicacao, "X");
        assert_eq!(ctx.valor_sem_indicacao, "R$ 312,38");
        assert_eq!(ctx.data_registro, "03/02/2026 10:05");

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["decisao_indicar"], "NÃO");
        assert_eq!(json["codigo_multa"], "745-50");
    }

    fn authorization(id: &str, decision: DisclosureDecision) -> (AuthorizationContext, AuditRow) {
        let driver = sample_driver();
        let resolution = sample_resolution();
        let amounts = SettlementRules::default().compute(resolution.fine.base_value).unwrap();
        let now = datetime!(2026-02-03 10:05 UTC);
        (
            AuthorizationContext::new(id, now, &driver, &resolution, &amounts, decision),
            AuditRow::new(id, now, &driver, &resolution, &amounts, decision),
        )
    }

    #[test]
    fn test_publish_writes_field_map_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("logs.db")).unwrap();
        let (ctx, row) = authorization("abc", DisclosureDecision::Disclose);

        let out = publish_authorization(&dir.path().join("out"), &log, &ctx, &row).unwrap();
        assert_eq!(
            out.file_name().unwrap().to_str().unwrap(),
            "Autorização Desconto ANA 01-02-2026.json"
        );
        assert!(out.exists());
        assert_eq!(log.count().unwrap(), 1);
    }

    #[test]
    fn test_publish_removes_field_map_when_insert_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let log = AuditLog::new(dir.path().join("logs.db")).unwrap();
        let (ctx, row) = authorization("dup", DisclosureDecision::Withhold);
        log.record(&row).unwrap();

        let err = publish_authorization(&out_dir, &log, &ctx, &row).unwrap_err();
        assert!(matches!(err, crate::error::NoticeError::Database(_)));

        let expected = out_dir
            .join(authorization_file_name("ANA", "01/02/2026"))
            .with_extension("json");
        assert!(!expected.exists());
        assert_eq!(log.count().unwrap(), 1);
    }
}
