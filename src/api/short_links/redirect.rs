use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::recipe_short_links;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/s/{code}",
    tag = "short_links",
    params(("code" = String, Path, description = "Short link code")),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown short link", body = ErrorResponse)
    )
)]
pub async fn resolve_short_link(
    State(pool): State<Arc<DbPool>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let recipe_id: Uuid = match recipe_short_links::table
        .filter(recipe_short_links::code.eq(&code))
        .select(recipe_short_links::recipe_id)
        .first(&mut conn)
    {
        Ok(id) => id,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Unknown short link".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to resolve short link: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to resolve short link".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/recipes/{}", recipe_id))],
    )
        .into_response()
}
