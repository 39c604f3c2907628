use crate::error::{Result, ShelfwiseError};
use crate::models::{BookRecord, BookUpdate, Category};
use crate::storage::{JsonFileStore, RecordStore};

use super::Repository;

/// Book inventory backed by a [`RecordStore`].
///
/// Every call reloads the full catalog, applies its change and writes the
/// whole collection back. Nothing is cached between calls.
pub struct CatalogRepository<S = JsonFileStore<BookRecord>> {
    store: S,
}

impl<S: RecordStore<BookRecord>> CatalogRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Like `find_by_id`, but a missing book is an error.
    pub fn get(&self, id: i32) -> Result<BookRecord> {
        self.find_by_id(&id)?.ok_or(ShelfwiseError::BookNotFound(id))
    }

    /// All books whose name equals `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Result<Vec<BookRecord>> {
        let books = self.store.load()?;
        Ok(books.into_iter().filter(|b| b.name_matches(name)).collect())
    }

    pub fn list_by_category(&self, category: Category) -> Result<Vec<BookRecord>> {
        let books = self.store.load()?;
        Ok(books.into_iter().filter(|b| b.category == category).collect())
    }

    /// Sum of quantities across the catalog.
    pub fn total_copies(&self) -> Result<u64> {
        let books = self.store.load()?;
        Ok(books.iter().map(|b| u64::from(b.quantity)).sum())
    }

    pub fn add(&self, book: BookRecord) -> Result<()> {
        book.validate()?;

        let mut books = self.store.load()?;
        if books.iter().any(|b| b.id == book.id) {
            return Err(ShelfwiseError::DuplicateId(book.id));
        }

        tracing::info!(id = book.id, name = %book.name, "adding book");
        books.push(book);
        self.store.save(&books)
    }

    /// Remove a book and return what was stored.
    pub fn remove(&self, id: i32) -> Result<BookRecord> {
        let mut books = self.store.load()?;
        let pos = books
            .iter()
            .position(|b| b.id == id)
            .ok_or(ShelfwiseError::BookNotFound(id))?;

        let removed = books.remove(pos);
        self.store.save(&books)?;
        tracing::info!(id, name = %removed.name, "removed book");
        Ok(removed)
    }

    /// Apply the supplied fields of `diff` and return the updated book.
    pub fn update(&self, id: i32, diff: &BookUpdate) -> Result<BookRecord> {
        diff.validate()?;

        let mut books = self.store.load()?;
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ShelfwiseError::BookNotFound(id))?;

        if diff.is_empty() {
            return Ok(book.clone());
        }

        diff.apply(book);
        let updated = book.clone();
        self.store.save(&books)?;
        tracing::info!(id, "updated book");
        Ok(updated)
    }

    /// Add `delta` to the stored quantity and return the updated book.
    pub fn adjust_quantity(&self, id: i32, delta: i32) -> Result<BookRecord> {
        let mut books = self.store.load()?;
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ShelfwiseError::BookNotFound(id))?;

        let quantity = match book.quantity.checked_add_signed(delta) {
            Some(q) => q,
            None if delta < 0 => {
                return Err(ShelfwiseError::NegativeQuantity {
                    id,
                    quantity: book.quantity,
                    delta,
                });
            }
            None => {
                return Err(ShelfwiseError::Validation(format!(
                    "quantity of book {id} overflows"
                )));
            }
        };

        book.quantity = quantity;
        let updated = book.clone();
        self.store.save(&books)?;
        tracing::info!(id, delta, quantity, "adjusted quantity");
        Ok(updated)
    }
}

impl<S: RecordStore<BookRecord>> Repository for CatalogRepository<S> {
    type Entity = BookRecord;
    type Id = i32;

    fn find_by_id(&self, id: &i32) -> Result<Option<BookRecord>> {
        let books = self.store.load()?;
        Ok(books.into_iter().find(|b| b.id == *id))
    }

    /// Books in stored (insertion) order.
    fn list_all(&self) -> Result<Vec<BookRecord>> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> CatalogRepository {
        CatalogRepository::new(JsonFileStore::new(dir.path().join("library_books.json")))
    }

    fn book(id: i32, name: &str, quantity: u32) -> BookRecord {
        BookRecord::new(id, name, "A", quantity, Decimal::new(999, 2), 3, Category::Civil)
    }

    #[test]
    fn test_add_then_find_by_id() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);

        repo.add(book(1, "X", 2)).unwrap();

        let found = repo.find_by_id(&1).unwrap().unwrap();
        assert_eq!(found.name, "X");
        assert_eq!(found.author, "A");
        assert_eq!(found.quantity, 2);
        assert_eq!(found.price, Decimal::new(999, 2));
        assert_eq!(found.rack_no, 3);
        assert_eq!(found.category, Category::Civil);
        assert!(repo.find_by_id(&2).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected_and_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 2)).unwrap();

        let err = repo.add(book(1, "Other", 5)).unwrap_err();
        assert!(matches!(err, ShelfwiseError::DuplicateId(1)));

        let all = repo.list_all().unwrap();
        assert_eq!(all, vec![book(1, "X", 2)]);
    }

    #[test]
    fn test_add_rejects_negative_price() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let mut bad = book(1, "X", 2);
        bad.price = Decimal::new(-500, 2);

        assert!(matches!(repo.add(bad), Err(ShelfwiseError::Validation(_))));
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_all_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        for id in [5, 1, 3] {
            repo.add(book(id, "B", 1)).unwrap();
        }

        let ids: Vec<i32> = repo.list_all().unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![5, 1, 3]);
    }

    #[test]
    fn test_find_by_name_is_case_insensitive_exact() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "Fluid Mechanics", 1)).unwrap();
        repo.add(book(2, "fluid mechanics", 1)).unwrap();
        repo.add(book(3, "Fluid Mechanics II", 1)).unwrap();

        let hits = repo.find_by_name("FLUID MECHANICS").unwrap();
        let ids: Vec<i32> = hits.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(repo.find_by_name("Fluid").unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 2)).unwrap();
        let before = std::fs::read_to_string(repo.store().path()).unwrap();

        let err = repo.remove(42).unwrap_err();
        assert!(matches!(err, ShelfwiseError::BookNotFound(42)));

        let after = std::fs::read_to_string(repo.store().path()).unwrap();
        assert_eq!(before, after);
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_existing() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 2)).unwrap();
        repo.add(book(2, "Y", 1)).unwrap();

        let removed = repo.remove(1).unwrap();
        assert_eq!(removed.name, "X");
        assert!(repo.find_by_id(&1).unwrap().is_none());
        assert!(repo.find_by_id(&2).unwrap().is_some());
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 2)).unwrap();

        let diff = BookUpdate {
            name: Some("X, 2nd ed.".to_string()),
            price: Some(Decimal::new(1250, 2)),
            ..Default::default()
        };
        let updated = repo.update(1, &diff).unwrap();
        assert_eq!(updated.name, "X, 2nd ed.");
        assert_eq!(updated.price, Decimal::new(1250, 2));
        assert_eq!(updated.quantity, 2);

        let stored = repo.get(1).unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_missing_book() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let err = repo.update(9, &BookUpdate::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_adjust_quantity_floor() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 1)).unwrap();

        let err = repo.adjust_quantity(1, -2).unwrap_err();
        assert!(matches!(
            err,
            ShelfwiseError::NegativeQuantity { id: 1, quantity: 1, delta: -2 }
        ));
        assert_eq!(repo.get(1).unwrap().quantity, 1);

        assert_eq!(repo.adjust_quantity(1, -1).unwrap().quantity, 0);
        assert_eq!(repo.adjust_quantity(1, 4).unwrap().quantity, 4);
        assert!(repo.adjust_quantity(2, 1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_total_copies_and_category_filter() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.add(book(1, "X", 2)).unwrap();
        let mut other = book(2, "Y", 5);
        other.category = Category::Computer;
        repo.add(other).unwrap();

        assert_eq!(repo.total_copies().unwrap(), 7);
        let civil = repo.list_by_category(Category::Civil).unwrap();
        assert_eq!(civil.len(), 1);
        assert_eq!(civil[0].id, 1);
    }

    #[test]
    fn test_state_survives_new_repository_instance() {
        let dir = TempDir::new().unwrap();
        repo(&dir).add(book(1, "X", 2)).unwrap();

        let reopened = repo(&dir);
        assert_eq!(reopened.get(1).unwrap().name, "X");
    }
}
