//! Append-only JSONL provenance journal, one per recipe.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::core::types::{JournalEvent, TimestampedEvent};
use crate::error::{GalleyError, GalleyResult};

/// Current UTC time as RFC 3339 with second precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Journal path inside a recipe directory.
pub fn journal_path(recipe_dir: &Path) -> PathBuf {
    recipe_dir.join("events.jsonl")
}

/// Append an event to the journal in `recipe_dir`.
pub fn append_event(recipe_dir: &Path, event: JournalEvent) -> GalleyResult<()> {
    std::fs::create_dir_all(recipe_dir).map_err(|e| GalleyError::io(recipe_dir, e))?;

    let te = TimestampedEvent {
        ts: now_rfc3339(),
        event,
    };
    let path = journal_path(recipe_dir);
    let json = serde_json::to_string(&te).map_err(|source| GalleyError::Json {
        path: path.clone(),
        source,
    })?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| GalleyError::io(&path, e))?;
    writeln!(file, "{}", json).map_err(|e| GalleyError::io(&path, e))
}

/// Read every event in the journal, oldest first. A missing journal is empty.
pub fn read_events(recipe_dir: &Path) -> GalleyResult<Vec<TimestampedEvent>> {
    let path = journal_path(recipe_dir);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| GalleyError::io(&path, e))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|source| GalleyError::Json {
                path: path.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.starts_with("20"));
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_journal_path() {
        let p = journal_path(Path::new("/recipes/bread"));
        assert_eq!(p, PathBuf::from("/recipes/bread/events.jsonl"));
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let recipe_dir = dir.path().join("bread");
        for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            append_event(
                &recipe_dir,
                JournalEvent::SnapshotTaken {
                    slug: "bread".into(),
                    date: date.into(),
                    raw_hash: "blake3:xxx".into(),
                    resolved: true,
                },
            )
            .unwrap();
        }
        let content = std::fs::read_to_string(journal_path(&recipe_dir)).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("\"event\":\"snapshot_taken\""));

        let events = read_events(&recipe_dir).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[2].event,
            JournalEvent::SnapshotTaken { date, .. } if date == "2024-01-03"
        ));
    }

    #[test]
    fn test_read_missing_journal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_events(dir.path()).unwrap().is_empty());
    }
}
