use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::NewRecipeShortLink;
use crate::schema::{recipe_short_links, recipes};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use rand::distr::{Alphanumeric, SampleString};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const CODE_LEN: usize = 3;
const MAX_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

fn generate_code() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CODE_LEN)
}

fn short_link_base_url() -> String {
    std::env::var("SHORT_LINK_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Return the recipe's existing short code, or mint a new one. Retries on
/// code collisions; a concurrent insert for the same recipe resolves to the
/// winner's code via the recipe_id uniqueness.
fn get_or_create_code(
    conn: &mut PgConnection,
    recipe_id: Uuid,
) -> Result<String, diesel::result::Error> {
    if let Some(code) = recipe_short_links::table
        .filter(recipe_short_links::recipe_id.eq(recipe_id))
        .select(recipe_short_links::code)
        .first::<String>(conn)
        .optional()?
    {
        return Ok(code);
    }

    for _ in 0..MAX_ATTEMPTS {
        let code = generate_code();
        let new_link = NewRecipeShortLink {
            recipe_id,
            code: &code,
        };

        match diesel::insert_into(recipe_short_links::table)
            .values(&new_link)
            .execute(conn)
        {
            Ok(_) => return Ok(code),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                // Either the code is taken or another request linked this
                // recipe first; in the latter case return the winner's code.
                if let Some(existing) = recipe_short_links::table
                    .filter(recipe_short_links::recipe_id.eq(recipe_id))
                    .select(recipe_short_links::code)
                    .first::<String>(conn)
                    .optional()?
                {
                    return Ok(existing);
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(diesel::result::Error::RollbackTransaction)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Shareable short link", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_short_link(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let recipe_exists: bool = match diesel::select(diesel::dsl::exists(
        recipes::table.filter(recipes::id.eq(id)),
    ))
    .get_result(&mut conn)
    {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create short link".to_string(),
                }),
            )
                .into_response();
        }
    };

    if !recipe_exists {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response();
    }

    match get_or_create_code(&mut conn, id) {
        Ok(code) => (
            StatusCode::OK,
            Json(ShortLinkResponse {
                short_link: format!("{}/s/{}", short_link_base_url(), code),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create short link: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create short link".to_string(),
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
    fn test_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_codes_vary() {
        // 62^3 codes; a hundred draws repeating every time would mean a
        // broken generator, not bad luck
        let first = generate_code();
        assert!((0..100).any(|_| generate_code() != first));
    }
}
