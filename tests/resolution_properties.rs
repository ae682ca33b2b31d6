//! Property-based tests for resolution, patching, validation and versions.

use proptest::prelude::*;
use serde_json::json;

use galley::core::patch::{apply_patches, prefix_steps};
use galley::core::scale::scale;
use galley::core::types::{DateKey, Definition, Ingredient, Patch, Step};
use galley::core::validate::{validate, validate_steps_dag};
use galley::core::version::satisfies;
use galley::store::memory::MemoryStore;
use galley::ResolvedRecipe;

/// Steps `s0..sN` where each step depends only on earlier ones.
fn acyclic_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), 1..24).prop_map(
        |picks| {
            picks
                .iter()
                .enumerate()
                .map(|(i, deps)| {
                    let depends_on: Vec<String> = if i == 0 {
                        Vec::new()
                    } else {
                        deps.iter().map(|d| format!("s{}", d.index(i))).collect()
                    };
                    Step {
                        id: format!("s{i}"),
                        depends_on: Some(depends_on),
                        ..Step::default()
                    }
                })
                .collect()
        },
    )
}

fn ingredient_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..16).prop_map(|s| s.into_iter().collect())
}

fn ingredients_from(ids: &[String]) -> Vec<Ingredient> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| Ingredient {
            id: id.clone(),
            quantity: Some(json!(i + 1)),
            ..Ingredient::default()
        })
        .collect()
}

fn ids<T: galley::core::patch::Keyed>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.key().to_string()).collect()
}

proptest! {
    #[test]
    fn acyclic_step_graphs_validate_clean(steps in acyclic_steps()) {
        prop_assert!(validate_steps_dag(&steps).is_empty());
        let doc = ResolvedRecipe { steps, ..ResolvedRecipe::default() };
        prop_assert!(validate(&doc).valid);
    }

    #[test]
    fn back_edge_reports_exactly_one_cycle(mut steps in acyclic_steps()) {
        let last = steps.len() - 1;
        steps[0].depends_on = Some(vec![format!("s{last}")]);
        steps[last].depends_on = Some(vec!["s0".to_string()]);
        let errors = validate_steps_dag(&steps);
        prop_assert_eq!(errors.len(), 1);
        prop_assert!(errors[0].starts_with("Cycle detected in steps at "));
    }

    #[test]
    fn caret_accepts_same_major_at_or_above(
        major in 0u64..20,
        (min_minor, min_patch) in (0u64..20, 0u64..20),
        (minor, patch) in (0u64..20, 0u64..20),
    ) {
        let ok = satisfies(
            &format!("{major}.{minor}.{patch}"),
            &format!("^{major}.{min_minor}.{min_patch}"),
        );
        prop_assert_eq!(ok, (minor, patch) >= (min_minor, min_patch));
    }

    #[test]
    fn caret_rejects_other_major(a in 0u64..50, b in 0u64..50, rest in (0u64..9, 0u64..9)) {
        prop_assume!(a != b);
        let version = format!("{a}.{}.{}", rest.0, rest.1);
        let constraint = format!("^{b}.0.0");
        prop_assert!(!satisfies(&version, &constraint));
    }

    #[test]
    fn non_caret_constraints_always_pass(version in "[0-9a-z.]{0,10}", constraint in "[~>=<0-9. ]{0,10}") {
        prop_assert!(satisfies(&version, &constraint));
    }

    #[test]
    fn removal_drops_only_the_target(ids_in in ingredient_ids(), pick in any::<prop::sample::Index>()) {
        let base = ingredients_from(&ids_in);
        let victim = ids_in[pick.index(ids_in.len())].clone();
        let patch: Patch = serde_json::from_value(json!({"op": "remove", "id": victim})).unwrap();
        let out = apply_patches(&base, &[patch]).unwrap();

        let expected: Vec<String> = ids_in.iter().filter(|id| **id != victim).cloned().collect();
        prop_assert_eq!(ids(&out), expected);
    }

    #[test]
    fn replace_keeps_position_and_unpatched_fields(ids_in in ingredient_ids(), pick in any::<prop::sample::Index>()) {
        let mut base = ingredients_from(&ids_in);
        let at = pick.index(ids_in.len());
        base[at].unit = Some("g".into());
        let patch: Patch =
            serde_json::from_value(json!({"id": ids_in[at], "quantity": 999})).unwrap();
        let out = apply_patches(&base, &[patch]).unwrap();

        prop_assert_eq!(ids(&out), ids_in.clone());
        prop_assert_eq!(out[at].quantity.clone(), Some(json!(999)));
        prop_assert_eq!(out[at].unit.as_deref(), Some("g"));
    }

    #[test]
    fn add_appends_new_ids(ids_in in ingredient_ids(), new_id in "[A-Z]{1,4}") {
        let base = ingredients_from(&ids_in);
        let patch: Patch = serde_json::from_value(json!({"op": "add", "id": new_id})).unwrap();
        let out = apply_patches(&base, &[patch]).unwrap();
        prop_assert_eq!(out.len(), base.len() + 1);
        prop_assert_eq!(out.last().map(|i| i.id.clone()), Some(new_id));
    }

    #[test]
    fn prefixed_steps_stay_acyclic(steps in acyclic_steps(), alias in "[a-z]{1,6}") {
        let prefixed = prefix_steps(&steps, &alias);
        let prefix = format!("{alias}.");
        prop_assert!(prefixed.iter().all(|s| s.id.starts_with(&prefix)));
        prop_assert!(validate_steps_dag(&prefixed).is_empty());
    }

    #[test]
    fn derivation_without_patches_is_identity(ids_in in ingredient_ids(), steps in acyclic_steps()) {
        let base = Definition {
            version: Some("1.0.0".into()),
            ingredients: Some(ingredients_from(&ids_in)),
            steps: Some(steps.clone()),
            ..Definition::default()
        };
        let child: Definition =
            serde_json::from_value(json!({"derives_from": {"id": "base", "constraint": "^1.0.0"}}))
                .unwrap();
        let store = MemoryStore::new().with("base", base).with("child", child);
        let doc = galley::resolve(&store, "child").unwrap();
        prop_assert_eq!(ids(&doc.ingredients), ids_in);
        prop_assert_eq!(doc.steps, steps);
    }

    #[test]
    fn composition_namespaces_everything(ids_in in ingredient_ids(), steps in acyclic_steps(), alias in "[a-z]{1,6}") {
        let sub = Definition {
            ingredients: Some(ingredients_from(&ids_in)),
            steps: Some(steps.clone()),
            ..Definition::default()
        };
        let top: Definition =
            serde_json::from_value(json!({"uses": [{"id": alias, "recipe": "sub"}]})).unwrap();
        let store = MemoryStore::new().with("sub", sub).with("top", top);
        let doc = galley::resolve(&store, "top").unwrap();

        let prefix = format!("{alias}.");
        prop_assert_eq!(doc.ingredients.len(), ids_in.len());
        prop_assert!(doc.ingredients.iter().all(|i| i.id.starts_with(&prefix) && i.from.as_deref() == Some(alias.as_str())));
        prop_assert_eq!(doc.steps.len(), steps.len());
        prop_assert!(validate(&doc).valid);
    }

    #[test]
    fn scaling_to_same_yield_is_identity(ids_in in ingredient_ids(), base in 1.0f64..5000.0) {
        let ings = ingredients_from(&ids_in);
        prop_assert_eq!(scale(&ings, Some(base), Some(base)), ings);
    }

    #[test]
    fn valid_dates_parse_back(y in 1900i32..2100, m in 1u32..=12, d in 1u32..=28) {
        let s = format!("{y:04}-{m:02}-{d:02}");
        let key = DateKey::parse(&s).unwrap();
        prop_assert_eq!(key.as_str(), s.as_str());
    }
}
