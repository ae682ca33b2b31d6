//! Record types for recipe definitions, resolved documents, and journal events.
//!
//! Every record keeps unknown keys in a flattened, order-preserving `extra`
//! map so a load → resolve → store cycle never drops fields it does not know.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GalleyError, GalleyResult};

/// Unrecognized fields carried through untouched.
pub type Extra = IndexMap<String, serde_json::Value>;

/// A stored record exactly as read, key order and explicit nulls included.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Entities
// ============================================================================

/// An ingredient line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique within one document (empty = missing)
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Numeric or opaque; only numbers are ever scaled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Alias of the composition this ingredient came in through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A preparation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Ids of steps that must happen first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Amount>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Step {
    /// Dependency ids, empty when none are declared.
    pub fn dependencies(&self) -> &[String] {
        self.depends_on.as_deref().unwrap_or(&[])
    }
}

/// An amount with a unit — used for yield and step time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Amount {
    /// The amount as a float, if it is a JSON number.
    pub fn as_f64(&self) -> Option<f64> {
        self.amount.as_ref().and_then(serde_json::Value::as_f64)
    }
}

// ============================================================================
// References
// ============================================================================

/// Patch operation. `add` and `replace` behave identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOp {
    Add,
    #[default]
    Replace,
    Remove,
}

/// One patch against an id-keyed collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Absent means `replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<PatchOp>,

    #[serde(default)]
    pub id: String,

    /// Fields overlaid onto the target (ignored for remove)
    #[serde(flatten)]
    pub fields: Extra,
}

impl Patch {
    pub fn op(&self) -> PatchOp {
        self.op.unwrap_or_default()
    }
}

/// `derives_from`: extend a base definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationRef {
    /// Base slug
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_patches: Option<Vec<Patch>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_patches: Option<Vec<Patch>>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A `uses` entry: embed another definition under an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRef {
    /// Alias, used as the namespace prefix
    pub id: String,

    /// Slug of the referenced definition
    pub recipe: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    /// Step ids to keep from the referenced definition (before prefixing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_steps: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_ingredients: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl CompositionRef {
    pub fn exposes_ingredients(&self) -> bool {
        self.expose_ingredients.unwrap_or(true)
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A recipe definition exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Shared by every version and fork of the same recipe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Revision counter, normally an integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Opaque; strings or richer author records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<serde_json::Value>,

    /// Opaque; normally a list of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<serde_json::Value>,

    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub yields: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derives_from: Option<DerivationRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Vec<CompositionRef>>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Definition {
    /// Typed view of a stored record.
    pub fn from_raw(slug: &str, raw: &RawRecord) -> GalleyResult<Self> {
        serde_json::from_value(serde_json::Value::Object(raw.clone())).map_err(|source| {
            GalleyError::InvalidRecord {
                slug: slug.to_string(),
                source,
            }
        })
    }

    /// Record form of a definition, for writing through a store.
    pub fn to_raw(&self) -> GalleyResult<RawRecord> {
        serde_json::to_value(self)
            .and_then(serde_json::from_value)
            .map_err(|e| GalleyError::Serialize {
                what: "definition",
                message: e.to_string(),
            })
    }
}

/// The fully flattened output of resolution. Never carries references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Opaque; strings or richer author records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<serde_json::Value>,

    /// Opaque; normally a list of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<serde_json::Value>,

    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub yields: Option<Amount>,

    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl ResolvedRecipe {
    /// Version used for constraint checks; a missing version counts as 0.0.0.
    pub fn version_or_zero(&self) -> &str {
        self.version.as_deref().unwrap_or("0.0.0")
    }
}

impl From<Definition> for ResolvedRecipe {
    /// Starting document for a root definition: references are dropped.
    fn from(def: Definition) -> Self {
        Self {
            id: def.id,
            lineage_id: def.lineage_id,
            name: def.name,
            iteration: def.iteration,
            version: def.version,
            authors: def.authors,
            tags: def.tags,
            yields: def.yields,
            ingredients: def.ingredients.unwrap_or_default(),
            steps: def.steps.unwrap_or_default(),
            extra: def.extra,
        }
    }
}

// ============================================================================
// Date keys
// ============================================================================

/// A `YYYY-MM-DD` calendar date naming one iteration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(String);

impl DateKey {
    /// Parse a strict ISO calendar date.
    pub fn parse(s: &str) -> GalleyResult<Self> {
        let invalid = || GalleyError::InvalidDate { date: s.to_string() };
        if s.len() != 10 {
            return Err(invalid());
        }
        let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(Self(date.format("%Y-%m-%d").to_string()))
    }

    /// Today's date in local time.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DateKey {
    type Err = GalleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Journal events
// ============================================================================

/// Event appended to a recipe's JSONL journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    RecipeInitialized {
        slug: String,
    },
    SnapshotTaken {
        slug: String,
        date: String,
        raw_hash: String,
        resolved: bool,
    },
    SnapshotResolveSkipped {
        slug: String,
        date: String,
        error: String,
    },
    IterationPromoted {
        slug: String,
        date: String,
        raw_hash: String,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: JournalEvent,
}

// ============================================================================
// Tests
// ============================================================================
