use clap::{Parser, Subcommand};
use multas::audit_log::{AuditLog, AuditRow};
use multas::config::Config;
use multas::document::{self, AuthorizationContext, DisclosureDecision};
use multas::message::MessageComposer;
use multas::money::format_brl;
use multas::roster::DriverRoster;
use multas::{ExtractionPipeline, FineCatalog};
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "multas", about = "Resolve traffic-fine notices into messages and authorizations")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "MULTAS_CONFIG", default_value = "multas.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the fields extracted from a notice and the matching fine
    Resolve { pdf: PathBuf },
    /// Write the driver message for a notice
    Message {
        pdf: PathBuf,
        #[arg(long)]
        driver: String,
    },
    /// Produce the authorization field mapping and log it
    Authorize {
        pdf: PathBuf,
        #[arg(long)]
        driver: String,
        /// sim / nao
        #[arg(long)]
        disclose: DisclosureDecision,
    },
    /// List driver short names from the roster
    Drivers,
    /// Show the most recent logged authorizations
    Log {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;

    match cli.command {
        Command::Resolve { pdf } => {
            let pipeline = build_pipeline(&cfg)?;
            let resolution = pipeline.resolve(&pdf)?;
            let amounts = pipeline.settlement(resolution.fine.base_value)?;

            println!("\n--- Extracted Fields ---");
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            println!("--- Settlement ---");
            println!("com indicação: {}", format_brl(amounts.with_disclosure));
            println!("sem indicação: {}", format_brl(amounts.without_disclosure));
        }
        Command::Message { pdf, driver } => {
            let roster = DriverRoster::load(&cfg.paths.roster_csv)?;
            let driver = roster.find(&driver)?;
            let pipeline = build_pipeline(&cfg)?;
            let resolution = pipeline.resolve(&pdf)?;
            let message = pipeline.compose_message(driver, &resolution)?;

            fs::create_dir_all(&cfg.paths.output_dir)?;
            let out = cfg.paths.output_dir.join(document::message_file_name(
                &driver.short_name,
                &resolution.fields.citation_date,
            ));
            fs::write(&out, &message)?;
            info!(path = %out.display(), "Message written");

            println!("\n{message}\n");
        }
        Command::Authorize {
            pdf,
            driver,
            disclose,
        } => {
            let roster = DriverRoster::load(&cfg.paths.roster_csv)?;
            let driver = roster.find(&driver)?;
            let pipeline = build_pipeline(&cfg)?;
            let resolution = pipeline.resolve(&pdf)?;
            let amounts = pipeline.settlement(resolution.fine.base_value)?;

            let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
            let record_id = AuditLog::generate_record_id(
                &driver.short_name,
                &resolution.fields.plate,
                &format!(
                    "{} {}",
                    resolution.fields.citation_date, resolution.fields.citation_time
                ),
                &now.to_string(),
            );
            let context = AuthorizationContext::new(
                &record_id,
                now,
                driver,
                &resolution,
                &amounts,
                disclose,
            );

            let log = AuditLog::new(&cfg.paths.audit_db)?;
            let row = AuditRow::new(&record_id, now, driver, &resolution, &amounts, disclose);
            let out = document::publish_authorization(&cfg.paths.output_dir, &log, &context, &row)?;
            println!("{}", out.display());
        }
        Command::Drivers => {
            let roster = DriverRoster::load(&cfg.paths.roster_csv)?;
            for name in roster.names() {
                println!("{name}");
            }
        }
        Command::Log { limit } => {
            let log = AuditLog::new(&cfg.paths.audit_db)?;
            info!(total = log.count()?, "Audit log statistics");
            for row in log.recent(limit)? {
                println!(
                    "{}  {}  {}  {}  {}  {}  {}",
                    row.id_registro,
                    row.data_registro,
                    row.nome_motorista,
                    row.placa,
                    row.codigo_multa,
                    row.valor_base,
                    row.decisao_indicar
                );
            }
        }
    }

    Ok(())
}

fn build_pipeline(cfg: &Config) -> Result<ExtractionPipeline, Box<dyn std::error::Error>> {
    let catalog = FineCatalog::load(&cfg.paths.catalog_csv)?;
    Ok(ExtractionPipeline::new(
        catalog,
        cfg.settlement,
        MessageComposer::new(cfg.message.template.clone()),
    ))
}
