//! On-disk recipe store.
//!
//! ```text
//! <root>/<slug>/recipe.json
//! <root>/<slug>/events.jsonl
//! <root>/<slug>/iterations/<YYYY-MM-DD>/recipe.json
//! <root>/<slug>/iterations/<YYYY-MM-DD>/resolved.json   (optional)
//! <root>/<slug>/iterations/<YYYY-MM-DD>/NOTE.md         (optional)
//! ```
//!
//! JSON is written pretty-printed with a trailing newline, atomically
//! (temp file + rename).

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{RecipeStore, StoredIteration};
use crate::core::types::{DateKey, JournalEvent, RawRecord};
use crate::error::{GalleyError, GalleyResult};
use crate::history::journal;

const RECIPE_FILE: &str = "recipe.json";
const RESOLVED_FILE: &str = "resolved.json";
const NOTE_FILE: &str = "NOTE.md";
const ITERATIONS_DIR: &str = "iterations";

/// Recipes stored as one directory per slug under a root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for `slug`.
    pub fn recipe_dir(&self, slug: &str) -> GalleyResult<PathBuf> {
        check_slug(slug)?;
        Ok(self.root.join(slug))
    }

    /// Path of the live definition.
    pub fn recipe_file(&self, slug: &str) -> GalleyResult<PathBuf> {
        Ok(self.recipe_dir(slug)?.join(RECIPE_FILE))
    }

    /// Directory holding all snapshots of `slug`.
    pub fn iteration_dir(&self, slug: &str) -> GalleyResult<PathBuf> {
        Ok(self.recipe_dir(slug)?.join(ITERATIONS_DIR))
    }

    /// Directory of one dated snapshot.
    pub fn iteration_path(&self, slug: &str, date: &DateKey) -> GalleyResult<PathBuf> {
        Ok(self.iteration_dir(slug)?.join(date.as_str()))
    }
}

/// A slug names exactly one directory below the root.
fn check_slug(slug: &str) -> GalleyResult<()> {
    if slug.is_empty() || slug == "." || slug == ".." || slug.contains(['/', '\\']) {
        return Err(GalleyError::InvalidSlug {
            slug: slug.to_string(),
        });
    }
    Ok(())
}

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> GalleyResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| GalleyError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| GalleyError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write JSON pretty-printed with a trailing newline, atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> GalleyResult<()> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| GalleyError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    write_atomic(path, &json)
}

/// Write a file via temp + rename so readers never see a partial write.
pub fn write_atomic(path: &Path, content: &str) -> GalleyResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GalleyError::io(parent, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, content).map_err(|e| GalleyError::io(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(GalleyError::io(path, e));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> GalleyResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GalleyError::io(path, e)),
    }
}

/// Sorted names of the subdirectories of `dir` accepted by `keep`.
fn sorted_subdirs(dir: &Path, keep: impl Fn(&Path) -> bool) -> GalleyResult<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| GalleyError::io(dir, e))?;
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir() && keep(&entry.path()))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}

impl RecipeStore for FsStore {
    fn exists(&self, slug: &str) -> bool {
        self.recipe_file(slug).is_ok_and(|p| p.is_file())
    }

    fn read_raw(&self, slug: &str) -> GalleyResult<RawRecord> {
        let path = self.recipe_file(slug)?;
        if !path.is_file() {
            return Err(GalleyError::NotFound {
                slug: slug.to_string(),
            });
        }
        read_json(&path)
    }

    fn write_raw(&self, slug: &str, raw: &RawRecord) -> GalleyResult<()> {
        write_json(&self.recipe_file(slug)?, raw)
    }

    fn list_slugs(&self) -> GalleyResult<Vec<String>> {
        sorted_subdirs(&self.root, |dir| dir.join(RECIPE_FILE).is_file())
    }

    fn list_iterations(&self, slug: &str) -> GalleyResult<Vec<String>> {
        sorted_subdirs(&self.iteration_dir(slug)?, |dir| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| DateKey::parse(name).is_ok())
        })
    }

    fn read_iteration(&self, slug: &str, date: &DateKey) -> GalleyResult<Option<StoredIteration>> {
        let dir = self.iteration_path(slug, date)?;
        let raw_path = dir.join(RECIPE_FILE);
        if !raw_path.is_file() {
            return Ok(None);
        }
        let raw = read_json(&raw_path)?;

        let resolved_path = dir.join(RESOLVED_FILE);
        let resolved = if resolved_path.is_file() {
            Some(read_json(&resolved_path)?)
        } else {
            None
        };

        let note_path = dir.join(NOTE_FILE);
        let note = if note_path.is_file() {
            let text =
                std::fs::read_to_string(&note_path).map_err(|e| GalleyError::io(&note_path, e))?;
            Some(text.trim().to_string())
        } else {
            None
        };

        Ok(Some(StoredIteration {
            raw,
            resolved,
            note,
        }))
    }

    fn write_iteration(
        &self,
        slug: &str,
        date: &DateKey,
        iteration: &StoredIteration,
    ) -> GalleyResult<String> {
        let dir = self.iteration_path(slug, date)?;
        write_json(&dir.join(RECIPE_FILE), &iteration.raw)?;

        let resolved_path = dir.join(RESOLVED_FILE);
        match &iteration.resolved {
            Some(resolved) => write_json(&resolved_path, resolved)?,
            None => remove_if_exists(&resolved_path)?,
        }

        let note_path = dir.join(NOTE_FILE);
        match iteration.note.as_deref().filter(|n| !n.is_empty()) {
            Some(note) => write_atomic(&note_path, &format!("{}\n", note))?,
            None => remove_if_exists(&note_path)?,
        }

        Ok(dir.display().to_string())
    }

    fn append_event(&self, slug: &str, event: JournalEvent) -> GalleyResult<()> {
        journal::append_event(&self.recipe_dir(slug)?, event)
    }
}
