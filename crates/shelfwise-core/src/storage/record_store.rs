use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::{Result, ShelfwiseError, StorageCause};

/// Whole-collection persistence for one kind of record.
pub trait RecordStore<T> {
    /// Load every stored record in stored order.
    fn load(&self) -> Result<Vec<T>>;

    /// Replace the stored collection with `records`.
    fn save(&self, records: &[T]) -> Result<()>;
}

/// Stores a record sequence as a single JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, source: impl Into<StorageCause>) -> ShelfwiseError {
        ShelfwiseError::StorageRead {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    fn write_error(&self, source: impl Into<StorageCause>) -> ShelfwiseError {
        ShelfwiseError::StorageWrite {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

impl<T> RecordStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<T>> {
        if !self.path.try_exists().map_err(|e| self.read_error(e))? {
            tracing::debug!(path = %self.path.display(), "record file missing, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.read_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<T> = serde_json::from_str(&contents).map_err(|e| self.read_error(e))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded records");
        Ok(records)
    }

    fn save(&self, records: &[T]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        let json = serde_json::to_string_pretty(records).map_err(|e| self.write_error(e))?;

        // Write beside the target and rename over it so readers never see a torn file.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| self.write_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_error(e))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "saved records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookRecord, Category, LoanRecord};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn books() -> Vec<BookRecord> {
        vec![
            BookRecord::new(7, "Thermodynamics", "Cengel", 3, Decimal::new(5999, 2), 1, Category::Mechanical),
            BookRecord::new(2, "Compilers", "Aho", 1, Decimal::new(8000, 2), 5, Category::Computer),
            BookRecord::new(4, "Circuits", "Nilsson", 0, Decimal::ZERO, 2, Category::Electrical),
        ]
    }

    #[test]
    fn test_save_then_load_preserves_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<BookRecord> = JsonFileStore::new(dir.path().join("books.json"));

        let records = books();
        store.save(&records).unwrap();

        let loaded: Vec<BookRecord> = store.load().unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<BookRecord> = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "  \n").unwrap();

        let store: JsonFileStore<BookRecord> = JsonFileStore::new(path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "{ not a record list").unwrap();

        let store: JsonFileStore<BookRecord> = JsonFileStore::new(&path);
        match store.load() {
            Err(ShelfwiseError::StorageRead { path: p, source: StorageCause::Json(_) }) => {
                assert_eq!(p, path);
            }
            other => panic!("expected StorageRead, got {other:?}"),
        }
    }

    #[test]
    fn test_save_overwrites_previous_contents() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<BookRecord> = JsonFileStore::new(dir.path().join("books.json"));

        store.save(&books()).unwrap();
        let shorter = vec![books().remove(1)];
        store.save(&shorter).unwrap();

        assert_eq!(store.load().unwrap(), shorter);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<BookRecord> = JsonFileStore::new(dir.path().join("nested").join("data").join("books.json"));

        store.save(&books()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_into_unwritable_location_is_write_error() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store: JsonFileStore<BookRecord> = JsonFileStore::new(blocker.join("books.json"));
        assert!(matches!(
            store.save(&books()),
            Err(ShelfwiseError::StorageWrite { .. })
        ));
    }

    #[test]
    fn test_load_under_non_directory_parent_is_read_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store: JsonFileStore<BookRecord> = JsonFileStore::new(blocker.join("books.json"));
        assert!(matches!(
            store.load(),
            Err(ShelfwiseError::StorageRead { source: StorageCause::Io(_), .. })
        ));
    }

    #[test]
    fn test_save_over_directory_is_persist_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("books.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let store: JsonFileStore<BookRecord> = JsonFileStore::new(&target);
        assert!(matches!(
            store.save(&books()),
            Err(ShelfwiseError::StorageWrite { source: StorageCause::Persist(_), .. })
        ));
    }

    #[test]
    fn test_empty_sequence_round_trip() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<BookRecord> = JsonFileStore::new(dir.path().join("books.json"));

        store.save(&books()).unwrap();
        store.save(&[]).unwrap();

        assert!(store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_loan_sequence_round_trip() {
        let dir = TempDir::new().unwrap();
        let store: JsonFileStore<LoanRecord> = JsonFileStore::new(dir.path().join("issued_books.json"));

        let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        let [first, second, third] = books().try_into().unwrap();
        let loans = vec![
            LoanRecord::new(first.clone(), "Alice", day(1, 30), day(2, 14)),
            LoanRecord::new(second, "Bob", day(2, 29), day(3, 15)),
            LoanRecord::new(first, "Carol", day(12, 20), NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()),
            LoanRecord::new(third, "dave", day(6, 1), day(6, 16)),
        ];
        store.save(&loans).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, loans);
        assert_eq!(loaded[0].book.price, Decimal::new(5999, 2));
        assert_eq!(loaded[2].due_date, NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
    }
}
