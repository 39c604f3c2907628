//! Issue and return: the two operations that touch both the catalog and the
//! loan ledger.
//!
//! Each step is its own full-file write. If the ledger append fails after the
//! catalog decrement has been saved, the catalog stays decremented with no
//! matching loan. Return runs the other way round: the loan is removed first,
//! so a failed catalog save leaves the loan gone and the quantity not
//! restored. Nothing here repairs either case.

use chrono::{Days, Local, NaiveDate};

use crate::config::AppConfig;
use crate::error::{Result, ShelfwiseError};
use crate::models::{BookRecord, LoanRecord};
use crate::storage::repositories::{CatalogRepository, LoanLedger};
use crate::storage::{JsonFileStore, RecordStore};

/// Result of returning a book.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    /// The ledger entry that was removed.
    pub loan: LoanRecord,
    /// Catalog record after the increment, `None` if the book was deleted
    /// from the catalog while on loan.
    pub book: Option<BookRecord>,
}

pub struct LendingService<C = JsonFileStore<BookRecord>, L = JsonFileStore<LoanRecord>> {
    catalog: CatalogRepository<C>,
    ledger: LoanLedger<L>,
    loan_period_days: u32,
}

impl LendingService {
    /// Build the service over the files named in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            CatalogRepository::new(JsonFileStore::new(config.book_file_path())),
            LoanLedger::new(JsonFileStore::new(config.loan_file_path())),
            config.lending.loan_period_days,
        )
    }
}

impl<C, L> LendingService<C, L>
where
    C: RecordStore<BookRecord>,
    L: RecordStore<LoanRecord>,
{
    pub fn new(catalog: CatalogRepository<C>, ledger: LoanLedger<L>, loan_period_days: u32) -> Self {
        Self {
            catalog,
            ledger,
            loan_period_days,
        }
    }

    pub fn catalog(&self) -> &CatalogRepository<C> {
        &self.catalog
    }

    pub fn ledger(&self) -> &LoanLedger<L> {
        &self.ledger
    }

    pub fn loan_period_days(&self) -> u32 {
        self.loan_period_days
    }

    /// Lend one copy of `book_id` to `student_name`, due `loan_period_days` from today.
    pub fn issue(&self, book_id: i32, student_name: &str, loan_period_days: u32) -> Result<LoanRecord> {
        self.issue_on(book_id, student_name, loan_period_days, Local::now().date_naive())
    }

    /// [`issue`](Self::issue) with the configured loan period.
    pub fn issue_default(&self, book_id: i32, student_name: &str) -> Result<LoanRecord> {
        self.issue(book_id, student_name, self.loan_period_days)
    }

    /// [`issue`](Self::issue) with an explicit issue date.
    pub fn issue_on(
        &self,
        book_id: i32,
        student_name: &str,
        loan_period_days: u32,
        today: NaiveDate,
    ) -> Result<LoanRecord> {
        let book = self.catalog.get(book_id)?;
        if !book.is_in_stock() {
            return Err(ShelfwiseError::OutOfStock(book_id));
        }

        let due_date = today
            .checked_add_days(Days::new(u64::from(loan_period_days)))
            .ok_or_else(|| {
                ShelfwiseError::Validation(format!(
                    "loan period of {loan_period_days} days is out of range"
                ))
            })?;

        let snapshot = self.catalog.adjust_quantity(book_id, -1)?;
        let loan = LoanRecord::new(snapshot, student_name, today, due_date);
        self.ledger.add_loan(loan.clone())?;

        tracing::info!(
            id = book_id,
            student = %student_name,
            due = %due_date,
            "issued book"
        );
        Ok(loan)
    }

    /// Take back the earliest outstanding loan of `book_id`.
    pub fn return_book(&self, book_id: i32) -> Result<ReturnOutcome> {
        let loan = self.ledger.remove_loan(book_id)?;

        let book = match self.catalog.adjust_quantity(book_id, 1) {
            Ok(book) => Some(book),
            Err(ShelfwiseError::BookNotFound(_)) => {
                tracing::warn!(
                    id = book_id,
                    "returned book is no longer in the catalog, quantity not restored"
                );
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(id = book_id, student = %loan.student_name, "returned book");
        Ok(ReturnOutcome { loan, book })
    }
}
