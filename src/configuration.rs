use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Mode;

#[derive(Clone, Debug)]
pub struct Configuration {
    pub db_path: PathBuf,
    pub rows: usize,
    pub payload_file: Option<PathBuf>,
    pub payload_size: usize,
    pub mode: Mode,
    pub busy_timeout: Duration,
    pub reset: bool,
    pub log_file: Option<PathBuf>,
    pub json: bool,
}
