//! In-process recipe store for tests, benchmarks, and embedding.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{RecipeStore, StoredIteration};
use crate::core::types::{DateKey, Definition, JournalEvent, RawRecord};
use crate::error::{GalleyError, GalleyResult};

/// Definitions, snapshots, and journals held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    definitions: RefCell<BTreeMap<String, RawRecord>>,
    iterations: RefCell<BTreeMap<(String, String), StoredIteration>>,
    events: RefCell<BTreeMap<String, Vec<JournalEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, convenient for fixtures.
    pub fn with(self, slug: &str, definition: Definition) -> Self {
        // a Definition always serializes to a JSON object
        let raw = definition.to_raw().unwrap_or_default();
        self.with_raw(slug, raw)
    }

    /// Builder-style insert of a record exactly as given.
    pub fn with_raw(self, slug: &str, raw: RawRecord) -> Self {
        self.definitions.borrow_mut().insert(slug.to_string(), raw);
        self
    }

    /// Journal entries recorded for `slug`, oldest first.
    pub fn events(&self, slug: &str) -> Vec<JournalEvent> {
        self.events.borrow().get(slug).cloned().unwrap_or_default()
    }
}

impl RecipeStore for MemoryStore {
    fn exists(&self, slug: &str) -> bool {
        self.definitions.borrow().contains_key(slug)
    }

    fn read_raw(&self, slug: &str) -> GalleyResult<RawRecord> {
        self.definitions
            .borrow()
            .get(slug)
            .cloned()
            .ok_or_else(|| GalleyError::NotFound {
                slug: slug.to_string(),
            })
    }

    fn write_raw(&self, slug: &str, raw: &RawRecord) -> GalleyResult<()> {
        self.definitions
            .borrow_mut()
            .insert(slug.to_string(), raw.clone());
        Ok(())
    }

    fn list_slugs(&self) -> GalleyResult<Vec<String>> {
        Ok(self.definitions.borrow().keys().cloned().collect())
    }

    fn list_iterations(&self, slug: &str) -> GalleyResult<Vec<String>> {
        Ok(self
            .iterations
            .borrow()
            .keys()
            .filter(|(s, _)| s == slug)
            .map(|(_, date)| date.clone())
            .collect())
    }

    fn read_iteration(&self, slug: &str, date: &DateKey) -> GalleyResult<Option<StoredIteration>> {
        Ok(self
            .iterations
            .borrow()
            .get(&(slug.to_string(), date.to_string()))
            .cloned())
    }

    fn write_iteration(
        &self,
        slug: &str,
        date: &DateKey,
        iteration: &StoredIteration,
    ) -> GalleyResult<String> {
        let mut stored = iteration.clone();
        stored.note = stored
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.iterations
            .borrow_mut()
            .insert((slug.to_string(), date.to_string()), stored);
        Ok(format!("memory:{}/{}", slug, date))
    }

    fn append_event(&self, slug: &str, event: JournalEvent) -> GalleyResult<()> {
        self.events
            .borrow_mut()
            .entry(slug.to_string())
            .or_default()
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_definitions() {
        let store = MemoryStore::new().with("b", Definition::default());
        store.write_definition("a", &Definition::default()).unwrap();
        assert!(store.exists("a"));
        assert!(!store.exists("c"));
        assert_eq!(store.list_slugs().unwrap(), vec!["a", "b"]);
        assert!(store.read_definition("c").unwrap_err().is_not_found());
    }

    #[test]
    fn test_memory_store_iterations_sorted_per_slug() {
        let store = MemoryStore::new();
        let it = StoredIteration {
            raw: RawRecord::new(),
            resolved: None,
            note: Some(String::new()),
        };
        for (slug, d) in [("x", "2024-02-01"), ("y", "2024-01-01"), ("x", "2024-01-01")] {
            store
                .write_iteration(slug, &DateKey::parse(d).unwrap(), &it)
                .unwrap();
        }
        assert_eq!(store.list_iterations("x").unwrap(), vec!["2024-01-01", "2024-02-01"]);
        let loaded = store
            .read_iteration("x", &DateKey::parse("2024-01-01").unwrap())
            .unwrap()
            .unwrap();
        assert!(loaded.note.is_none());
    }

    #[test]
    fn test_memory_store_note_matches_fs_store() {
        let dir = tempfile::tempdir().unwrap();
        let fs = crate::store::fs::FsStore::new(dir.path());
        let mem = MemoryStore::new();
        let d = DateKey::parse("2024-01-01").unwrap();
        let it = StoredIteration {
            raw: RawRecord::new(),
            resolved: None,
            note: Some("  more salt \n\n".into()),
        };
        fs.write_iteration("bread", &d, &it).unwrap();
        mem.write_iteration("bread", &d, &it).unwrap();

        let from_fs = fs.read_iteration("bread", &d).unwrap().unwrap().note;
        let from_mem = mem.read_iteration("bread", &d).unwrap().unwrap().note;
        assert_eq!(from_mem.as_deref(), Some("more salt"));
        assert_eq!(from_mem, from_fs);
    }
}
