//! Dated iterations — snapshot, list, load, promote.
//!
//! A snapshot always records the live record verbatim, whether or not it
//! fits the definition shape. The resolved form is best-effort: when
//! resolution fails the snapshot is still written and the outcome says why
//! the resolved form is missing.

use serde::Serialize;

use super::hasher;
use crate::core::resolver;
use crate::core::types::{DateKey, JournalEvent, RawRecord, ResolvedRecipe};
use crate::error::{GalleyError, GalleyResult};
use crate::store::{RecipeStore, StoredIteration};

/// Whether a snapshot captured the resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotResolution {
    Resolved,
    RawOnly { reason: String },
}

/// Result of taking a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    pub location: String,
    pub raw_hash: String,
    pub resolution: SnapshotResolution,
}

/// A loaded iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    pub date: String,
    pub raw: RawRecord,
    pub resolved: ResolvedRecipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Snapshot the live definition of `slug` under `date`.
pub fn snapshot<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
    date: &DateKey,
    note: Option<&str>,
) -> GalleyResult<SnapshotOutcome> {
    let raw = store.read_raw(slug)?;
    let raw_hash = hasher::hash_record(&raw)?;

    let (resolved, resolution) = match resolver::resolve(store, slug) {
        Ok(doc) => (Some(doc), SnapshotResolution::Resolved),
        Err(e) => (
            None,
            SnapshotResolution::RawOnly {
                reason: e.to_string(),
            },
        ),
    };

    let location = store.write_iteration(
        slug,
        date,
        &StoredIteration {
            raw,
            resolved,
            note: note.map(str::to_string),
        },
    )?;

    if let SnapshotResolution::RawOnly { reason } = &resolution {
        store.append_event(
            slug,
            JournalEvent::SnapshotResolveSkipped {
                slug: slug.to_string(),
                date: date.to_string(),
                error: reason.clone(),
            },
        )?;
    }
    store.append_event(
        slug,
        JournalEvent::SnapshotTaken {
            slug: slug.to_string(),
            date: date.to_string(),
            raw_hash: raw_hash.clone(),
            resolved: resolution == SnapshotResolution::Resolved,
        },
    )?;

    Ok(SnapshotOutcome {
        location,
        raw_hash,
        resolution,
    })
}

/// Sorted date keys with a snapshot for `slug`.
pub fn list<S: RecipeStore + ?Sized>(store: &S, slug: &str) -> GalleyResult<Vec<String>> {
    store.list_iterations(slug)
}

/// Load one iteration. Without a stored resolved form, the live definition
/// is resolved now and any failure propagates.
pub fn load<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
    date: &DateKey,
) -> GalleyResult<Iteration> {
    let stored = read(store, slug, date)?;
    let resolved = match stored.resolved {
        Some(doc) => doc,
        None => resolver::resolve(store, slug)?,
    };
    Ok(Iteration {
        date: date.to_string(),
        raw: stored.raw,
        resolved,
        note: stored.note,
    })
}

/// Overwrite the live record with the one captured on `date`.
pub fn promote<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
    date: &DateKey,
) -> GalleyResult<RawRecord> {
    let stored = read(store, slug, date)?;
    store.write_raw(slug, &stored.raw)?;
    store.append_event(
        slug,
        JournalEvent::IterationPromoted {
            slug: slug.to_string(),
            date: date.to_string(),
            raw_hash: hasher::hash_record(&stored.raw)?,
        },
    )?;
    Ok(stored.raw)
}

fn read<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
    date: &DateKey,
) -> GalleyResult<StoredIteration> {
    store
        .read_iteration(slug, date)?
        .ok_or_else(|| GalleyError::IterationNotFound {
            slug: slug.to_string(),
            date: date.to_string(),
        })
}
