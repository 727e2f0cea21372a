use crate::api::recipes::response::{recipe_response, RecipeResponse, RecipeSummaryRow};
use crate::api::{clamp_page, ErrorResponse, PaginationMetadata};
use crate::auth::MaybeAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart_items, tags};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Number of items to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Only recipes by this author
    pub author: Option<Uuid>,
    /// Comma-separated tag slugs; a recipe matches if it carries any of them
    pub tags: Option<String>,
    /// "1"/"true": only recipes the caller favorited (ignored for anonymous)
    pub is_favorited: Option<String>,
    /// "1"/"true": only recipes in the caller's cart (ignored for anonymous)
    pub is_in_shopping_cart: Option<String>,
}

/// Split a comma-separated tag slug list into its non-empty entries.
fn parse_tag_slugs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Query-param booleans arrive as "1" or "true"
fn flag_is_set(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("1") | Some("true"))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Recipes, newest first", body = ListRecipesResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let (limit, offset) = clamp_page(params.limit, params.offset);
    let viewer_id = viewer.map(|u| u.id);

    let mut conn = get_conn!(pool);

    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if let Some(ref raw) = params.tags {
        let slugs = parse_tag_slugs(raw);
        if !slugs.is_empty() {
            let tagged = recipe_tags::table
                .inner_join(tags::table)
                .filter(tags::slug.eq_any(slugs))
                .select(recipe_tags::recipe_id);
            query = query.filter(recipes::id.eq_any(tagged));
        }
    }

    // Viewer-scoped filters only make sense for authenticated callers
    if let Some(viewer_id) = viewer_id {
        if flag_is_set(&params.is_favorited) {
            let favorited = favorites::table
                .filter(favorites::user_id.eq(viewer_id))
                .select(favorites::recipe_id);
            query = query.filter(recipes::id.eq_any(favorited));
        }
        if flag_is_set(&params.is_in_shopping_cart) {
            let in_cart = shopping_cart_items::table
                .filter(shopping_cart_items::user_id.eq(viewer_id))
                .select(shopping_cart_items::recipe_id);
            query = query.filter(recipes::id.eq_any(in_cart));
        }
    }

    // COUNT(*) OVER() yields the total row count before LIMIT/OFFSET
    let rows: Vec<(RecipeSummaryRow, i64)> = match query
        .order(recipes::created_at.desc())
        .select((RecipeSummaryRow::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, count)| *count).unwrap_or(0);

    let mut results = Vec::with_capacity(rows.len());
    for (row, _) in &rows {
        match recipe_response(&mut conn, viewer_id, row) {
            Ok(resp) => results.push(resp),
            Err(e) => {
                tracing::error!("Failed to build recipe response: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch recipes".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            recipes: results,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_slugs() {
        assert_eq!(parse_tag_slugs("breakfast"), vec!["breakfast"]);
        assert_eq!(
            parse_tag_slugs("breakfast,dinner"),
            vec!["breakfast", "dinner"]
        );
        assert_eq!(parse_tag_slugs(" breakfast , dinner "), vec!["breakfast", "dinner"]);
    }

    #[test]
    fn test_parse_tag_slugs_drops_empty_entries() {
        assert_eq!(parse_tag_slugs(",,"), Vec::<String>::new());
        assert_eq!(parse_tag_slugs("a,,b,"), vec!["a", "b"]);
    }

    #[test]
    fn test_flag_is_set() {
        assert!(flag_is_set(&Some("1".to_string())));
        assert!(flag_is_set(&Some("true".to_string())));
        assert!(!flag_is_set(&Some("0".to_string())));
        assert!(!flag_is_set(&Some("yes".to_string())));
        assert!(!flag_is_set(&None));
    }
}
