use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in shelfwise-core.
#[derive(Debug, Error)]
pub enum ShelfwiseError {
    #[error("Failed to read records from {}: {source}", .path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    #[error("Failed to write records to {}: {source}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    #[error("Book not found: {0}")]
    BookNotFound(i32),

    #[error("No issued book found with id: {0}")]
    LoanNotFound(i32),

    #[error("A book with id {0} already exists")]
    DuplicateId(i32),

    #[error("Quantity of book {id} would drop below zero ({quantity} {delta:+})")]
    NegativeQuantity { id: i32, quantity: u32, delta: i32 },

    #[error("Book {0} is out of stock")]
    OutOfStock(i32),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Underlying cause of a storage failure.
#[derive(Debug, Error)]
pub enum StorageCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

impl ShelfwiseError {
    /// True for both the catalog and the ledger flavour of "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BookNotFound(_) | Self::LoanNotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageRead { .. } | Self::StorageWrite { .. } | Self::Io(_))
    }

    /// Exit code the shell should terminate with for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::BookNotFound(_) | Self::LoanNotFound(_) => ExitCode::NotFound,
            Self::DuplicateId(_) | Self::NegativeQuantity { .. } | Self::OutOfStock(_) => {
                ExitCode::Conflict
            }
            Self::Validation(_) => ExitCode::InvalidArgs,
            Self::StorageRead { .. } | Self::StorageWrite { .. } | Self::Io(_) => {
                ExitCode::FileSystemError
            }
            Self::Config(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => ExitCode::GeneralError,
        }
    }
}

/// Exit codes used by the command-line shell.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    Conflict = 7,
    ConfirmRequired = 8,
}

pub type Result<T> = std::result::Result<T, ShelfwiseError>;
