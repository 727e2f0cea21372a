use crate::api::recipes::create::{
    validate_ingredients, validate_recipe_fields, validate_tags, IngredientAmount,
};
use crate::api::recipes::response::{recipe_response, RecipeResponse, RecipeSummaryRow};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::data_url::parse_image_data_url;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Uuid>>,
    /// Image as a data URL: "data:image/png;base64,..."
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChangeset<'a> {
    name: Option<&'a str>,
    text: Option<&'a str>,
    cooking_time: Option<i32>,
    image: Option<&'a [u8]>,
    image_content_type: Option<&'a str>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let row: RecipeSummaryRow = match recipes::table
        .find(id)
        .select(RecipeSummaryRow::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if row.author_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the author can edit a recipe".to_string(),
            }),
        )
            .into_response();
    }

    // Validate the updated values against the same rules as create
    let name = request.name.as_deref().unwrap_or(&row.name);
    let text = request.text.as_deref().unwrap_or(&row.text);
    let cooking_time = request.cooking_time.unwrap_or(row.cooking_time);
    let mut validation = validate_recipe_fields(name, text, cooking_time);
    if let Some(ref ingredients) = request.ingredients {
        validation = validation.and_then(|()| validate_ingredients(ingredients));
    }
    if let Some(ref tags) = request.tags {
        validation = validation.and_then(|()| validate_tags(tags));
    }
    if let Err(message) = validation {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response();
    }

    let image = match request.image.as_deref().map(parse_image_data_url) {
        Some(Ok(parsed)) => Some(parsed),
        Some(Err(message)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message.to_string(),
                }),
            )
                .into_response()
        }
        None => None,
    };

    let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
        let changes = RecipeChangeset {
            name: request.name.as_deref(),
            text: request.text.as_deref(),
            cooking_time: request.cooking_time,
            image: image.as_ref().map(|(_, bytes)| bytes.as_slice()),
            image_content_type: image.as_ref().map(|(content_type, _)| content_type.as_str()),
        };

        let has_scalar_changes = changes.name.is_some()
            || changes.text.is_some()
            || changes.cooking_time.is_some()
            || changes.image.is_some();
        if has_scalar_changes {
            diesel::update(recipes::table.find(id))
                .set(&changes)
                .execute(conn)?;
        }

        // Replacing ingredients or tags swaps the join rows wholesale
        if let Some(ref lines) = request.ingredients {
            diesel::delete(
                recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)),
            )
            .execute(conn)?;
            let rows: Vec<NewRecipeIngredient> = lines
                .iter()
                .map(|line| NewRecipeIngredient {
                    recipe_id: id,
                    ingredient_id: line.id,
                    amount: line.amount,
                })
                .collect();
            diesel::insert_into(recipe_ingredients::table)
                .values(&rows)
                .execute(conn)?;
        }

        if let Some(ref tag_ids) = request.tags {
            diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id)))
                .execute(conn)?;
            let rows: Vec<NewRecipeTag> = tag_ids
                .iter()
                .map(|&tag_id| NewRecipeTag {
                    recipe_id: id,
                    tag_id,
                })
                .collect();
            diesel::insert_into(recipe_tags::table)
                .values(&rows)
                .execute(conn)?;
        }

        Ok(())
    });

    match result {
        Ok(()) => {}
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
            tracing::error!("Failed to update recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    let row: RecipeSummaryRow = match recipes::table
        .find(id)
        .select(RecipeSummaryRow::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch updated recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch updated recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match recipe_response(&mut conn, Some(user.id), &row) {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
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
