//! Batched inserts that hand back the keys the database generated for each
//! row, in the order the rows were submitted.

pub mod app;
pub mod batch;
pub mod cli;
pub mod configuration;
pub mod context;
pub mod db;
pub mod error;
pub mod executor;
pub mod keys;
pub mod payload;
mod runner;
pub mod tracing;

pub use batch::{ParameterBatch, SqlType, Value};
pub use error::{BatchError, BindError, DecodeError, ExecutorError};
pub use executor::{BatchResult, KeyColumns, PreparedBatch, StatementExecutor};
pub use keys::{Entities, Entity, EntityDecoder, KeyDecoder, RawKeyRow, RawKeyRows};
pub use runner::QueryRunner;
