use clap::{Parser, ValueEnum};
use std::env;
use std::path::PathBuf;

/// Which code path performs the insert.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Batched insert through the query runner
    Runner,
    /// Plain rusqlite prepare/query loop, for comparison
    Direct,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Insert a batch of rows into SQLite and print the generated keys",
    long_about = "Inserts N rows of (sequential id, binary payload) as one batch and prints the keys the database generated for them, in submission order."
)]
pub struct Cli {
    #[arg(
        long,
        env = "KEYBATCH_DB",
        default_value = ".keybatch/keybatch.sqlite",
        value_name = "PATH",
        help = "SQLite database file"
    )]
    pub db: PathBuf,

    #[arg(
        short = 'n',
        long,
        default_value_t = 5usize,
        value_name = "N",
        help = "Number of rows to insert"
    )]
    pub rows: usize,

    #[arg(
        long,
        env = "KEYBATCH_PAYLOAD_FILE",
        value_name = "PATH",
        help = "Read the blob payload from PATH instead of generating one"
    )]
    pub payload_file: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = 10 * 1024 * 1024,
        value_name = "BYTES",
        help = "Size of the generated payload"
    )]
    pub payload_size: usize,

    #[arg(short, long, value_enum, default_value_t = Mode::Runner)]
    pub mode: Mode,

    #[arg(
        long,
        default_value_t = 5000u64,
        value_name = "MS",
        help = "How long to wait on a locked database before failing"
    )]
    pub busy_timeout_ms: u64,

    #[arg(
        long,
        default_value_t = false,
        help = "Delete the SQLite database before starting"
    )]
    pub reset: bool,

    #[arg(
        long = "log-file",
        env = "KEYBATCH_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Print one JSON object per entity")]
    pub json: bool,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    if dotenvy::from_filename(&dotenv_path).is_ok() {
        log::info!("Loaded env from {}", dotenv_path);
    }
    Cli::parse()
}
