//! Recipe resolution — derivation, composition, and cycle detection.
//!
//! `resolve(slug)` loads a definition and recursively materializes its
//! `derives_from` base and every `uses` dependency into one flat document.
//! The set of slugs currently being resolved is created fresh for each
//! top-level call and threaded through the recursion; re-entering a slug in
//! that set is a cycle. Nothing is memoized, so a dependency shared by two
//! siblings is resolved twice.

use indexmap::IndexSet;

use super::patch::{apply_patches, merge_by_id, namespace_ingredient, prefix_steps};
use super::types::{CompositionRef, Definition, DerivationRef, ResolvedRecipe};
use super::version;
use crate::error::{GalleyError, GalleyResult};
use crate::store::RecipeStore;

/// Resolves recipes from a store.
pub struct Resolver<'a, S: RecipeStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecipeStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve `slug` into a fully flattened document.
    pub fn resolve(&self, slug: &str) -> GalleyResult<ResolvedRecipe> {
        let mut active = IndexSet::new();
        self.resolve_in(slug, &mut active)
    }

    fn resolve_in(&self, slug: &str, active: &mut IndexSet<String>) -> GalleyResult<ResolvedRecipe> {
        if active.contains(slug) {
            let mut chain: Vec<String> = active.iter().cloned().collect();
            chain.push(slug.to_string());
            return Err(GalleyError::Cycle { chain });
        }
        active.insert(slug.to_string());

        let mut raw = self.store.read_definition(slug)?;
        let derivation = raw.derives_from.take();
        let uses = raw.uses.take().unwrap_or_default();

        let mut doc = match derivation {
            Some(base_ref) => self.derive(slug, raw, &base_ref, active)?,
            None => ResolvedRecipe::from(raw),
        };

        for dep in &uses {
            self.compose(slug, &mut doc, dep, active)?;
        }

        active.shift_remove(slug);
        Ok(doc)
    }

    /// Build the starting document of a derived definition.
    fn derive(
        &self,
        slug: &str,
        raw: Definition,
        base_ref: &DerivationRef,
        active: &mut IndexSet<String>,
    ) -> GalleyResult<ResolvedRecipe> {
        let base = self.resolve_in(&base_ref.id, active)?;
        check_constraint(slug, &base_ref.id, &base, base_ref.constraint.as_deref())?;

        let mut ingredients = apply_patches(
            &base.ingredients,
            base_ref.ingredient_patches.as_deref().unwrap_or_default(),
        )?;
        let mut steps = apply_patches(
            &base.steps,
            base_ref.step_patches.as_deref().unwrap_or_default(),
        )?;

        if let Some(own) = raw.ingredients.as_deref().filter(|v| !v.is_empty()) {
            ingredients = merge_by_id(&ingredients, own);
        }
        if let Some(own) = raw.steps.as_deref().filter(|v| !v.is_empty()) {
            steps = merge_by_id(&steps, own);
        }

        let mut extra = base.extra;
        extra.extend(raw.extra);

        Ok(ResolvedRecipe {
            id: raw.id.or(base.id),
            lineage_id: raw.lineage_id.or(base.lineage_id),
            name: raw.name.or(base.name),
            iteration: raw.iteration.or(base.iteration),
            version: raw.version.or(base.version),
            authors: raw.authors.or(base.authors),
            tags: raw.tags.or(base.tags),
            yields: raw.yields.or(base.yields),
            ingredients,
            steps,
            extra,
        })
    }

    /// Append one `uses` dependency's steps and ingredients under its alias.
    fn compose(
        &self,
        slug: &str,
        doc: &mut ResolvedRecipe,
        dep: &CompositionRef,
        active: &mut IndexSet<String>,
    ) -> GalleyResult<()> {
        let resolved = self.resolve_in(&dep.recipe, active)?;
        check_constraint(slug, &dep.recipe, &resolved, dep.constraint.as_deref())?;

        let alias = dep.id.as_str();
        let steps = match dep.include_steps.as_deref().filter(|keep| !keep.is_empty()) {
            Some(keep) => resolved
                .steps
                .iter()
                .filter(|s| keep.contains(&s.id))
                .cloned()
                .collect(),
            None => resolved.steps.clone(),
        };
        doc.steps.extend(prefix_steps(&steps, alias));

        if dep.exposes_ingredients() {
            doc.ingredients.extend(
                resolved
                    .ingredients
                    .iter()
                    .map(|ing| namespace_ingredient(ing, alias)),
            );
        }
        Ok(())
    }
}

fn check_constraint(
    dependent: &str,
    dependency: &str,
    resolved: &ResolvedRecipe,
    constraint: Option<&str>,
) -> GalleyResult<()> {
    let constraint = constraint.unwrap_or_default();
    let actual = resolved.version_or_zero();
    if version::satisfies(actual, constraint) {
        return Ok(());
    }
    Err(GalleyError::VersionConstraint {
        dependent: dependent.to_string(),
        dependency: dependency.to_string(),
        required: constraint.to_string(),
        actual: actual.to_string(),
    })
}

/// Resolve `slug` from `store`.
pub fn resolve<S: RecipeStore + ?Sized>(store: &S, slug: &str) -> GalleyResult<ResolvedRecipe> {
    Resolver::new(store).resolve(slug)
}
