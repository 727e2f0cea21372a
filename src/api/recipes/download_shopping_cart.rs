use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart_items};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

/// One consolidated line of the exported shopping list
#[derive(Debug, PartialEq)]
struct AggregatedIngredient {
    name: String,
    measurement_unit: String,
    amount: f64,
}

/// Sum ingredient amounts across the cart's recipes, deduplicating by
/// (name, measurement_unit). The same name under two units stays two lines.
/// First-seen order is preserved.
fn aggregate_ingredients(rows: Vec<(String, String, f64)>) -> Vec<AggregatedIngredient> {
    let mut result: Vec<AggregatedIngredient> = Vec::new();

    for (name, measurement_unit, amount) in rows {
        match result
            .iter_mut()
            .find(|i| i.name == name && i.measurement_unit == measurement_unit)
        {
            Some(existing) => {
                existing.amount = round3(existing.amount + amount);
            }
            None => result.push(AggregatedIngredient {
                name,
                measurement_unit,
                amount,
            }),
        }
    }

    result
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn render_shopping_list(ingredients: &[AggregatedIngredient]) -> String {
    let mut out = String::new();
    for ingredient in ingredients {
        out.push_str(&format!(
            "{} — {} {}\n",
            ingredient.name, ingredient.amount, ingredient.measurement_unit
        ));
    }
    out
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Consolidated shopping list as a text attachment"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let cart_recipes = shopping_cart_items::table
        .filter(shopping_cart_items::user_id.eq(user.id))
        .select(shopping_cart_items::recipe_id);

    let rows: Vec<(String, String, f64)> = match recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(cart_recipes))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch shopping cart ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let body = render_shopping_list(&aggregate_ingredients(rows));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: f64) -> (String, String, f64) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_aggregate_empty_cart() {
        assert!(aggregate_ingredients(vec![]).is_empty());
    }

    #[test]
    fn test_aggregate_sums_matching_name_and_unit() {
        let result = aggregate_ingredients(vec![
            row("flour", "g", 200.0),
            row("flour", "g", 300.0),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].amount, 500.0);
    }

    #[test]
    fn test_aggregate_keeps_units_separate() {
        let result = aggregate_ingredients(vec![
            row("milk", "ml", 200.0),
            row("milk", "l", 1.0),
        ]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_aggregate_preserves_first_seen_order() {
        let result = aggregate_ingredients(vec![
            row("salt", "g", 5.0),
            row("flour", "g", 100.0),
            row("salt", "g", 2.0),
        ]);
        assert_eq!(result[0].name, "salt");
        assert_eq!(result[0].amount, 7.0);
        assert_eq!(result[1].name, "flour");
    }

    #[test]
    fn test_aggregate_rounds_to_three_decimals() {
        let result = aggregate_ingredients(vec![
            row("oil", "ml", 0.1),
            row("oil", "ml", 0.2),
        ]);
        assert_eq!(result[0].amount, 0.3);
    }

    #[test]
    fn test_render_format() {
        let list = vec![
            AggregatedIngredient {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
                amount: 500.0,
            },
            AggregatedIngredient {
                name: "milk".to_string(),
                measurement_unit: "ml".to_string(),
                amount: 250.5,
            },
        ];
        assert_eq!(
            render_shopping_list(&list),
            "flour — 500 g\nmilk — 250.5 ml\n"
        );
    }
}
