use std::time::Duration;

use crate::configuration::Configuration;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let cfg = Configuration {
            db_path: cli.db.clone(),
            rows: cli.rows,
            payload_file: cli.payload_file.clone(),
            payload_size: cli.payload_size,
            mode: cli.mode,
            busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
            reset: cli.reset,
            log_file: cli.log_file.clone(),
            json: cli.json,
        };
        Self { config: cfg }
    }
}
