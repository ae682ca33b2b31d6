//! Proportional quantity scaling.

use super::types::{Amount, Ingredient, ResolvedRecipe};

/// Round to two decimal places, halves to even.
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Scale numeric quantities by `target / base`.
///
/// Returns the input unchanged when either amount is missing or zero, or
/// when the two are equal. Non-numeric quantities pass through.
pub fn scale(ingredients: &[Ingredient], base: Option<f64>, target: Option<f64>) -> Vec<Ingredient> {
    let (Some(base), Some(target)) = (base, target) else {
        return ingredients.to_vec();
    };
    if base == 0.0 || target == 0.0 || base == target {
        return ingredients.to_vec();
    }

    let factor = target / base;
    ingredients
        .iter()
        .map(|ing| {
            let mut out = ing.clone();
            let scaled = ing
                .quantity
                .as_ref()
                .and_then(serde_json::Value::as_f64)
                .and_then(|q| serde_json::Number::from_f64(round2(q * factor)));
            if let Some(n) = scaled {
                out.quantity = Some(serde_json::Value::Number(n));
            }
            out
        })
        .collect()
}

/// Scale a resolved document to a target yield; the yield unit is unchanged.
pub fn scale_to_yield(doc: &mut ResolvedRecipe, target: f64) {
    let base = doc.yields.as_ref().and_then(Amount::as_f64);
    doc.ingredients = scale(&doc.ingredients, base, Some(target));
    if let Some(y) = doc.yields.as_mut() {
        y.amount = serde_json::Number::from_f64(target).map(serde_json::Value::Number);
    }
}
