//! Store adapters — where definitions, iterations, and journals live.
//!
//! The core only talks to [`RecipeStore`]. [`fs::FsStore`] is the on-disk
//! layout; [`memory::MemoryStore`] keeps everything in process.

pub mod fs;
pub mod memory;

use crate::core::types::{DateKey, Definition, JournalEvent, RawRecord, ResolvedRecipe};
use crate::error::GalleyResult;

/// Everything persisted for one dated snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIteration {
    /// The live record as it was, untouched by typing
    pub raw: RawRecord,
    pub resolved: Option<ResolvedRecipe>,
    pub note: Option<String>,
}

/// Storage for recipe definitions and their iteration history.
pub trait RecipeStore {
    /// Whether a live definition exists for `slug`.
    fn exists(&self, slug: &str) -> bool;

    /// Read the live record as stored. Fails with `NotFound` when absent.
    fn read_raw(&self, slug: &str) -> GalleyResult<RawRecord>;

    /// Overwrite (or create) the live record verbatim.
    fn write_raw(&self, slug: &str, raw: &RawRecord) -> GalleyResult<()>;

    /// Read the live definition. Fails with `NotFound` when absent and
    /// `InvalidRecord` when the record does not fit the definition shape.
    fn read_definition(&self, slug: &str) -> GalleyResult<Definition> {
        Definition::from_raw(slug, &self.read_raw(slug)?)
    }

    /// Overwrite (or create) the live definition.
    fn write_definition(&self, slug: &str, definition: &Definition) -> GalleyResult<()> {
        self.write_raw(slug, &definition.to_raw()?)
    }

    /// Sorted slugs that have a live definition.
    fn list_slugs(&self) -> GalleyResult<Vec<String>>;

    /// Sorted date keys with a snapshot for `slug`. Entries that are not
    /// calendar dates are not snapshots.
    fn list_iterations(&self, slug: &str) -> GalleyResult<Vec<String>>;

    /// Read a snapshot. `Ok(None)` when no raw record exists for that date.
    fn read_iteration(&self, slug: &str, date: &DateKey) -> GalleyResult<Option<StoredIteration>>;

    /// Persist a snapshot, replacing anything stored for that date.
    /// Returns a human-readable location.
    fn write_iteration(
        &self,
        slug: &str,
        date: &DateKey,
        iteration: &StoredIteration,
    ) -> GalleyResult<String>;

    /// Append an event to the recipe's journal.
    fn append_event(&self, slug: &str, event: JournalEvent) -> GalleyResult<()>;
}
