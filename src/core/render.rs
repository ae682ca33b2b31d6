//! Text output for resolved documents and lineage summaries.

use super::types::{Amount, Definition, Ingredient, ResolvedRecipe, Step};
use crate::error::{GalleyError, GalleyResult};

/// Plain text for an opaque JSON value (strings unquoted, null empty).
pub fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn amount_text(amount: &Amount) -> String {
    let mut parts = Vec::new();
    if let Some(a) = &amount.amount {
        parts.push(plain(a));
    }
    if let Some(u) = &amount.unit {
        parts.push(u.clone());
    }
    parts.join(" ")
}

fn ingredient_line(ing: &Ingredient) -> String {
    let mut parts = Vec::new();
    if let Some(q) = ing.quantity.as_ref().map(plain).filter(|q| !q.is_empty()) {
        parts.push(q);
    }
    if let Some(u) = &ing.unit {
        parts.push(u.clone());
    }
    parts.push(ing.name.clone().unwrap_or_else(|| ing.id.clone()));

    let mut line = format!("- {}", parts.join(" "));
    if let Some(from) = &ing.from {
        line.push_str(&format!(" [{}]", from));
    }
    if let Some(note) = ing.note.as_deref().filter(|n| !n.is_empty()) {
        line.push_str(&format!(" — {}", note));
    }
    line
}

fn step_line(index: usize, step: &Step) -> String {
    let text = step.text.as_deref().unwrap_or(&step.id);
    match step.time.as_ref().map(amount_text).filter(|t| !t.is_empty()) {
        Some(t) => format!("{}. {} ({})", index, text, t),
        None => format!("{}. {}", index, text),
    }
}

/// Render a resolved document as Markdown. `label` is appended to the title
/// (used for the date of an iteration).
pub fn markdown(doc: &ResolvedRecipe, label: Option<&str>) -> String {
    let name = doc.name.as_deref().or(doc.id.as_deref()).unwrap_or("Untitled");
    let version = doc.version.as_deref().unwrap_or("unversioned");
    let mut lines = vec![match label {
        Some(label) => format!("# {} ({}) — {}", name, version, label),
        None => format!("# {} ({})", name, version),
    }];
    if let Some(y) = &doc.yields {
        lines.push(format!("Yield: {}", amount_text(y)));
    }
    lines.push(String::new());

    lines.push("## Ingredients".to_string());
    lines.extend(doc.ingredients.iter().map(ingredient_line));
    lines.push(String::new());

    lines.push("## Steps".to_string());
    lines.extend(
        doc.steps
            .iter()
            .enumerate()
            .map(|(i, step)| step_line(i + 1, step)),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Pretty JSON with a trailing newline.
pub fn json(doc: &ResolvedRecipe) -> GalleyResult<String> {
    let mut out = serde_json::to_string_pretty(doc).map_err(|e| GalleyError::Serialize {
        what: "recipe as JSON",
        message: e.to_string(),
    })?;
    out.push('\n');
    Ok(out)
}

/// YAML rendering of the resolved document.
pub fn yaml(doc: &ResolvedRecipe) -> GalleyResult<String> {
    serde_yaml_ng::to_string(doc).map_err(|e| GalleyError::Serialize {
        what: "recipe as YAML",
        message: e.to_string(),
    })
}

/// Ancestry and dependency summary of a raw definition.
pub fn lineage(slug: &str, def: &Definition) -> String {
    let field = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        format!("Recipe: {}", slug),
        format!(
            "  Name: {} | Iteration: {} | Version: {}",
            field(def.name.clone()),
            field(def.iteration.as_ref().map(plain)),
            field(def.version.clone()),
        ),
    ];

    if let Some(base) = &def.derives_from {
        lines.push(format!(
            "  Derives from: {} {}",
            base.id,
            base.constraint.as_deref().unwrap_or_default()
        ));
    }

    match def.uses.as_deref() {
        Some(uses) if !uses.is_empty() => {
            lines.push("  Uses:".to_string());
            for dep in uses {
                lines.push(format!(
                    "    - {}: {} {}",
                    dep.id,
                    dep.recipe,
                    dep.constraint.as_deref().unwrap_or_default()
                ));
            }
        }
        _ => lines.push("  Uses: none".to_string()),
    }

    lines
        .into_iter()
        .map(|l| l.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
