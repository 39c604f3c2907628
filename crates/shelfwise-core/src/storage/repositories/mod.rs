mod catalog_repository;
mod loan_ledger;

pub use catalog_repository::CatalogRepository;
pub use loan_ledger::LoanLedger;

use crate::error::Result;

/// Read access shared by the catalog and the ledger.
pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn list_all(&self) -> Result<Vec<Self::Entity>>;
}
