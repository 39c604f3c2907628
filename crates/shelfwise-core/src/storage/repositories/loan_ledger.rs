use chrono::NaiveDate;

use crate::error::{Result, ShelfwiseError};
use crate::models::LoanRecord;
use crate::storage::{JsonFileStore, RecordStore};

use super::Repository;

/// Ledger of books currently lent out.
///
/// Several loans may share a book id (one per lent copy). Lookups and
/// removals always act on the earliest matching entry.
pub struct LoanLedger<S = JsonFileStore<LoanRecord>> {
    store: S,
}

impl<S: RecordStore<LoanRecord>> LoanLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_loan(&self, loan: LoanRecord) -> Result<()> {
        let mut loans = self.store.load()?;
        tracing::info!(
            id = loan.id(),
            student = %loan.student_name,
            due = %loan.due_date,
            "recording loan"
        );
        loans.push(loan);
        self.store.save(&loans)
    }

    /// Remove the first loan for `id` and return it.
    pub fn remove_loan(&self, id: i32) -> Result<LoanRecord> {
        let mut loans = self.store.load()?;
        let pos = loans
            .iter()
            .position(|l| l.id() == id)
            .ok_or(ShelfwiseError::LoanNotFound(id))?;

        let removed = loans.remove(pos);
        self.store.save(&loans)?;
        tracing::info!(id, student = %removed.student_name, "removed loan");
        Ok(removed)
    }

    pub fn list_for_student(&self, student_name: &str) -> Result<Vec<LoanRecord>> {
        let wanted = student_name.to_lowercase();
        let loans = self.store.load()?;
        Ok(loans
            .into_iter()
            .filter(|l| l.student_name.to_lowercase() == wanted)
            .collect())
    }

    /// Loans whose due date lies before `today`.
    pub fn list_overdue(&self, today: NaiveDate) -> Result<Vec<LoanRecord>> {
        let loans = self.store.load()?;
        Ok(loans.into_iter().filter(|l| l.is_overdue(today)).collect())
    }
}

impl<S: RecordStore<LoanRecord>> Repository for LoanLedger<S> {
    type Entity = LoanRecord;
    type Id = i32;

    /// First loan recorded for `id`.
    fn find_by_id(&self, id: &i32) -> Result<Option<LoanRecord>> {
        let loans = self.store.load()?;
        Ok(loans.into_iter().find(|l| l.id() == *id))
    }

    fn list_all(&self) -> Result<Vec<LoanRecord>> {
        self.store.load()
    }
}
