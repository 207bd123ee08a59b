mod wiring;

use crate::cli::{self, Mode};
use crate::configuration::Configuration;
use crate::context;
use crate::keys::Entity;
use crate::payload;
use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use std::time::Instant;

/// What gets printed for each inserted row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub id: i64,
    pub bytes_length: usize,
    pub sha256: String,
}

impl EntityReport {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            bytes_length: entity.payload_len(),
            sha256: payload::sha256_hex(entity.payload.as_deref().unwrap_or_default()),
        }
    }
}

pub struct App {
    config: Configuration,
}

impl App {
    pub fn from_cli(cli: &cli::Cli) -> Self {
        let ctx = context::Context::from_cli(cli);
        log_startup_info(&ctx.config);
        Self::new(ctx.config)
    }

    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Insert the configured batch and report the generated keys.
    pub fn run(&self) -> Result<Vec<EntityReport>> {
        let conn = wiring::init_db(&self.config)?;
        let payload = payload::load(self.config.payload_file.as_deref(), self.config.payload_size)
            .context("loading payload")?;
        let expected_sha = payload::sha256_hex(&payload);
        log::info!("📦 Payload: {} bytes, sha256 {}", payload.len(), expected_sha);

        let batch = wiring::build_batch(self.config.rows, &payload);
        let started = Instant::now();
        let entities = match self.config.mode {
            Mode::Runner => wiring::insert_with_runner(&conn, &batch),
            Mode::Direct => wiring::insert_direct(&conn, &batch),
        }
        .with_context(|| format!("inserting {} rows ({:?} mode)", batch.len(), self.config.mode))?;
        log::info!("✅ Inserted {} rows in {:?}", entities.len(), started.elapsed());

        let reports: Vec<EntityReport> = entities.iter().map(EntityReport::from_entity).collect();
        for report in reports.iter().filter(|r| r.sha256 != expected_sha) {
            log::warn!("payload of id {} came back altered", report.id);
        }
        Ok(reports)
    }
}

fn log_startup_info(cfg: &Configuration) {
    log::info!("🚀 Starting keybatch");
    log::info!("📂 Database: {}", cfg.db_path.display());
    log::info!("🧮 Rows: {}", cfg.rows);
    log::info!("🔀 Mode: {:?}", cfg.mode);
    if let Some(path) = cfg.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.display());
    }
}

fn print_reports(reports: &[EntityReport], json: bool) -> Result<()> {
    for report in reports {
        if json {
            println!("{}", serde_json::to_string(report)?);
        } else {
            println!("Id = {}, bytes length = {}", report.id, report.bytes_length);
        }
    }
    Ok(())
}

// --- Entry Point ---

pub fn run(cli: &cli::Cli) -> Result<()> {
    let reports = App::from_cli(cli).run()?;
    print_reports(&reports, cli.json)
}
