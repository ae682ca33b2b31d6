//! Structural validation of resolved documents.
//!
//! Checks:
//! - ingredient ids present and unique
//! - step ids present and unique
//! - every `depends_on` names a step in the document
//! - the step dependency graph has no cycle (first cycle found is reported)
//!
//! All checks run; findings are collected rather than failing fast.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use super::patch::Keyed;
use super::types::{ResolvedRecipe, Step};

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a resolved document.
pub fn validate(doc: &ResolvedRecipe) -> Report {
    let mut errors = validate_unique_ids(&doc.ingredients, "ingredient");
    errors.extend(validate_unique_ids(&doc.steps, "step"));
    errors.extend(validate_steps_dag(&doc.steps));
    Report {
        valid: errors.is_empty(),
        errors,
    }
}

/// Flag missing ids and every repeat occurrence of an id.
pub fn validate_unique_ids<T: Keyed>(items: &[T], kind: &str) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let id = item.key();
        if id.is_empty() {
            errors.push(format!("{} #{} missing id", kind, index + 1));
            continue;
        }
        if !seen.insert(id) {
            errors.push(format!("Duplicate {} id: {}", kind, id));
        }
    }
    errors
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Check that dependencies exist and form a DAG.
pub fn validate_steps_dag(steps: &[Step]) -> Vec<String> {
    let mut errors = Vec::new();
    let ids: FxHashSet<&str> = steps
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    for step in steps {
        for dep in step.dependencies() {
            if !ids.contains(dep.as_str()) {
                errors.push(format!("Step {} depends on unknown step {}", step.id, dep));
            }
        }
    }

    let mut graph: IndexMap<&str, &[String]> = IndexMap::new();
    for step in steps.iter().filter(|s| !s.id.is_empty()) {
        graph.insert(step.id.as_str(), step.dependencies());
    }

    let mut marks: FxHashMap<&str, Mark> = FxHashMap::default();
    for &node in graph.keys() {
        if let Some(at) = find_cycle(node, &graph, &mut marks) {
            errors.push(format!("Cycle detected in steps at {}", at));
            break;
        }
    }
    errors
}

/// Depth-first search with three-colour marking. Returns the node at which
/// the search re-entered an in-progress node.
fn find_cycle<'a>(
    node: &'a str,
    graph: &IndexMap<&'a str, &'a [String]>,
    marks: &mut FxHashMap<&'a str, Mark>,
) -> Option<&'a str> {
    match marks.get(node) {
        Some(Mark::Done) => return None,
        Some(Mark::InProgress) => return Some(node),
        None => {}
    }
    marks.insert(node, Mark::InProgress);
    if let Some(&deps) = graph.get(node) {
        for dep in deps {
            if let Some(at) = find_cycle(dep.as_str(), graph, marks) {
                return Some(at);
            }
        }
    }
    marks.insert(node, Mark::Done);
    None
}
