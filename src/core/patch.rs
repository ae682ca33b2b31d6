//! Patch application, id-keyed merging, and alias namespacing.
//!
//! Id-keyed collections are held in an [`IndexMap`]: re-inserting an existing
//! id replaces the value in place, new ids append, removals keep the relative
//! order of everything else.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{Ingredient, Patch, PatchOp, Step};
use crate::error::{GalleyError, GalleyResult};

/// An entity addressed by a string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Ingredient {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Step {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Index entities by id. A later duplicate overwrites the earlier value but
/// keeps the earlier position.
pub fn index_by_id<T: Keyed + Clone>(items: &[T]) -> IndexMap<String, T> {
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        map.insert(item.key().to_string(), item.clone());
    }
    map
}

/// Apply patches in order to an id-keyed collection.
///
/// `add` and `replace` both overlay the patch fields onto the current entity
/// (or onto a bare `{id}` when the id is new). `remove` of an absent id is a
/// no-op. Patches with an empty id are skipped.
pub fn apply_patches<T>(base: &[T], patches: &[Patch]) -> GalleyResult<Vec<T>>
where
    T: Keyed + Clone + Serialize + DeserializeOwned,
{
    let mut items = index_by_id(base);

    for patch in patches {
        if patch.id.is_empty() {
            continue;
        }
        match patch.op() {
            PatchOp::Remove => {
                items.shift_remove(&patch.id);
            }
            PatchOp::Add | PatchOp::Replace => {
                let patched = overlay(items.get(&patch.id), patch)?;
                items.insert(patch.id.clone(), patched);
            }
        }
    }

    Ok(items.into_values().collect())
}

fn overlay<T>(current: Option<&T>, patch: &Patch) -> GalleyResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let invalid = |source| GalleyError::Patch {
        id: patch.id.clone(),
        source,
    };

    let mut record = match current {
        Some(entity) => match serde_json::to_value(entity).map_err(invalid)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        },
        None => serde_json::Map::new(),
    };
    record
        .entry("id")
        .or_insert_with(|| serde_json::Value::String(patch.id.clone()));
    for (key, value) in &patch.fields {
        record.insert(key.clone(), value.clone());
    }

    serde_json::from_value(serde_json::Value::Object(record)).map_err(invalid)
}

/// Merge `overrides` over `base` by id: colliding ids take the override in the
/// base position, new ids append in encounter order.
pub fn merge_by_id<T: Keyed + Clone>(base: &[T], overrides: &[T]) -> Vec<T> {
    let mut items = index_by_id(base);
    for item in overrides {
        items.insert(item.key().to_string(), item.clone());
    }
    items.into_values().collect()
}

/// Prefix step ids and their `depends_on` entries with `{alias}.`.
pub fn prefix_steps(steps: &[Step], alias: &str) -> Vec<Step> {
    steps
        .iter()
        .map(|step| {
            let mut s = step.clone();
            s.id = format!("{}.{}", alias, step.id);
            if let Some(deps) = &step.depends_on {
                s.depends_on = Some(deps.iter().map(|d| format!("{}.{}", alias, d)).collect());
            }
            s
        })
        .collect()
}

/// Tag a composed-in ingredient with its alias, prefixing the id unless an
/// earlier composition already did.
pub fn namespace_ingredient(ingredient: &Ingredient, alias: &str) -> Ingredient {
    let mut ing = ingredient.clone();
    ing.from = Some(alias.to_string());
    let prefix = format!("{}.", alias);
    if !ing.id.starts_with(&prefix) {
        ing.id = format!("{}{}", prefix, ing.id);
    }
    ing
}
