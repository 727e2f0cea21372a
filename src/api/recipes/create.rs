use crate::api::recipes::response::{recipe_response, RecipeResponse, RecipeSummaryRow};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::data_url::parse_image_data_url;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag};
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// One ingredient line in a create/update request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
    /// Image as a data URL: "data:image/png;base64,..."
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn validate_recipe_fields(
    name: &str,
    text: &str,
    cooking_time: i32,
) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    if text.trim().is_empty() {
        return Err("Text cannot be empty");
    }
    if cooking_time < 1 {
        return Err("Cooking time must be at least one minute");
    }
    Ok(())
}

pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), &'static str> {
    if ingredients.is_empty() {
        return Err("At least one ingredient is required");
    }
    if ingredients.iter().any(|i| i.amount <= 0.0) {
        return Err("Ingredient amounts must be positive");
    }
    let distinct: HashSet<Uuid> = ingredients.iter().map(|i| i.id).collect();
    if distinct.len() != ingredients.len() {
        return Err("Duplicate ingredients in request");
    }
    Ok(())
}

pub fn validate_tags(tags: &[Uuid]) -> Result<(), &'static str> {
    let distinct: HashSet<Uuid> = tags.iter().copied().collect();
    if distinct.len() != tags.len() {
        return Err("Duplicate tags in request");
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let validation = validate_recipe_fields(&request.name, &request.text, request.cooking_time)
        .and_then(|()| validate_ingredients(&request.ingredients))
        .and_then(|()| validate_tags(&request.tags));
    if let Err(message) = validation {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response();
    }

    let (image_content_type, image_bytes) = match parse_image_data_url(&request.image) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message.to_string(),
                }),
            )
                .into_response()
        }
    };

    let mut conn = get_conn!(pool);

    // Recipe plus its join rows are written atomically
    let result: Result<Uuid, diesel::result::Error> = conn.transaction(|conn| {
        let new_recipe = NewRecipe {
            author_id: user.id,
            name: &request.name,
            text: &request.text,
            cooking_time: request.cooking_time,
            image: &image_bytes,
            image_content_type: &image_content_type,
        };

        let recipe_id: Uuid = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(recipes::id)
            .get_result(conn)?;

        let tag_rows: Vec<NewRecipeTag> = request
            .tags
            .iter()
            .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
            .collect();
        diesel::insert_into(recipe_tags::table)
            .values(&tag_rows)
            .execute(conn)?;

        let ingredient_rows: Vec<NewRecipeIngredient> = request
            .ingredients
            .iter()
            .map(|line| NewRecipeIngredient {
                recipe_id,
                ingredient_id: line.id,
                amount: line.amount,
            })
            .collect();
        diesel::insert_into(recipe_ingredients::table)
            .values(&ingredient_rows)
            .execute(conn)?;

        Ok(recipe_id)
    });

    let recipe_id = match result {
        Ok(id) => id,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            _,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Unknown tag or ingredient".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    let row: RecipeSummaryRow = match recipes::table
        .find(recipe_id)
        .select(RecipeSummaryRow::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch created recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch created recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match recipe_response(&mut conn, Some(user.id), &row) {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(e) => {
            tracing::error!("Failed to build recipe response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build recipe response".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_validation() {
        assert!(validate_recipe_fields("Borscht", "Boil it", 30).is_ok());
        assert!(validate_recipe_fields("  ", "Boil it", 30).is_err());
        assert!(validate_recipe_fields("Borscht", "", 30).is_err());
        assert!(validate_recipe_fields("Borscht", "Boil it", 0).is_err());
        assert!(validate_recipe_fields("Borscht", "Boil it", -5).is_err());
    }

    #[test]
    fn test_ingredients_must_be_present_and_positive() {
        assert!(validate_ingredients(&[]).is_err());

        let line = IngredientAmount {
            id: Uuid::new_v4(),
            amount: 0.0,
        };
        assert!(validate_ingredients(&[line]).is_err());
    }

    #[test]
    fn test_duplicate_ingredients_rejected() {
        let id = Uuid::new_v4();
        let lines = vec![
            IngredientAmount { id, amount: 1.0 },
            IngredientAmount { id, amount: 2.0 },
        ];
        assert!(validate_ingredients(&lines).is_err());
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let id = Uuid::new_v4();
        assert!(validate_tags(&[id, id]).is_err());
        assert!(validate_tags(&[id, Uuid::new_v4()]).is_ok());
        assert!(validate_tags(&[]).is_ok());
    }
}
