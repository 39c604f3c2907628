use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::BookRecord;

/// A book copy lent to a student.
///
/// `book` is a snapshot taken at issue time; it is not kept in sync with the
/// catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(flatten)]
    pub book: BookRecord,
    pub student_name: String,
    pub issued_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl LoanRecord {
    pub fn new(
        book: BookRecord,
        student_name: impl Into<String>,
        issued_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            book,
            student_name: student_name.into(),
            issued_date,
            due_date,
        }
    }

    /// Catalog id this loan refers to.
    pub fn id(&self) -> i32 {
        self.book.id
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date
    }

    /// Whole days past the due date, zero if not overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }
}
