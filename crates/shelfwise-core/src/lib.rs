pub mod config;
pub mod error;
pub mod lending;
pub mod models;
pub mod storage;

pub use config::AppConfig;
pub use error::{ExitCode, Result, ShelfwiseError};
pub use lending::{LendingService, ReturnOutcome};
pub use models::*;

pub use storage::repositories::{CatalogRepository, LoanLedger, Repository};
pub use storage::{JsonFileStore, RecordStore};
