//! Drift between the live definition and its snapshots.

use serde::Serialize;

use super::{hasher, iterations};
use crate::core::types::DateKey;
use crate::error::GalleyResult;
use crate::store::RecipeStore;

/// One row of the iteration listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationSummary {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub raw_hash: String,
    /// Snapshot raw form is byte-identical to the live definition.
    pub matches_live: bool,
}

/// Live definition differs from its latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftFinding {
    pub slug: String,
    pub latest_snapshot: String,
    pub expected_hash: String,
    pub actual_hash: String,
}

/// Summaries of every snapshot of `slug`, oldest first.
pub fn summarize<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
) -> GalleyResult<Vec<IterationSummary>> {
    let live_hash = hasher::hash_record(&store.read_raw(slug)?)?;
    let mut out = Vec::new();
    for date in iterations::list(store, slug)? {
        let key = DateKey::parse(&date)?;
        let Some(stored) = store.read_iteration(slug, &key)? else {
            continue;
        };
        let raw_hash = hasher::hash_record(&stored.raw)?;
        out.push(IterationSummary {
            date,
            note: stored.note,
            matches_live: raw_hash == live_hash,
            raw_hash,
        });
    }
    Ok(out)
}

/// Compare the live definition with its latest snapshot. `None` when in
/// sync or when no snapshot exists.
pub fn check_drift<S: RecipeStore + ?Sized>(
    store: &S,
    slug: &str,
) -> GalleyResult<Option<DriftFinding>> {
    let Some(latest) = summarize(store, slug)?.pop() else {
        return Ok(None);
    };
    if latest.matches_live {
        return Ok(None);
    }
    Ok(Some(DriftFinding {
        slug: slug.to_string(),
        latest_snapshot: latest.date,
        expected_hash: latest.raw_hash,
        actual_hash: hasher::hash_record(&store.read_raw(slug)?)?,
    }))
}

/// Drift findings for every slug in the store.
pub fn detect_drift<S: RecipeStore + ?Sized>(store: &S) -> GalleyResult<Vec<DriftFinding>> {
    let mut findings = Vec::new();
    for slug in store.list_slugs()? {
        if let Some(finding) = check_drift(store, &slug)? {
            findings.push(finding);
        }
    }
    Ok(findings)
}
