//! galley — versioned, composable recipe definitions.
//!
//! Recipes derive from a base recipe through id-keyed patches, embed other
//! recipes as namespaced sub-components, and keep dated snapshots that can be
//! re-rendered or promoted back to live. Everything resolves to one flat,
//! validated document.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod store;

pub use crate::core::resolver::resolve;
pub use crate::core::types::{Definition, ResolvedRecipe};
pub use crate::error::{GalleyError, GalleyResult};
