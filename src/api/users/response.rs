use crate::api::recipes::response::{RecipeShortResponse, RecipeSummaryRow};
use crate::models::User;
use crate::schema::{recipes, subscriptions};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Public profile representation, embedded in recipe bodies as well.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requesting user follows this profile (false for anonymous)
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

/// Profile plus the author's recipes, returned by the subscription endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithRecipesResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
    pub avatar: Option<String>,
}

pub fn avatar_url(user: &User) -> Option<String> {
    user.avatar
        .as_ref()
        .map(|_| format!("/api/users/{}/avatar", user.id))
}

fn is_subscribed_to(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    author_id: Uuid,
) -> QueryResult<bool> {
    match viewer {
        // A user never counts as subscribed to themselves
        Some(viewer_id) if viewer_id != author_id => diesel::select(diesel::dsl::exists(
            subscriptions::table
                .filter(subscriptions::user_id.eq(viewer_id))
                .filter(subscriptions::author_id.eq(author_id)),
        ))
        .get_result(conn),
        _ => Ok(false),
    }
}

pub fn user_response(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    user: &User,
) -> QueryResult<UserResponse> {
    let is_subscribed = is_subscribed_to(conn, viewer, user.id)?;

    Ok(UserResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
        avatar: avatar_url(user),
    })
}

/// Build the author-with-recipes body. `recipes_limit` caps the embedded
/// recipe list; `recipes_count` always reflects the full total.
pub fn user_with_recipes_response(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    user: &User,
    recipes_limit: Option<i64>,
) -> QueryResult<UserWithRecipesResponse> {
    let base = user_response(conn, viewer, user)?;

    let mut query = recipes::table
        .filter(recipes::author_id.eq(user.id))
        .order(recipes::created_at.desc())
        .select(RecipeSummaryRow::as_select())
        .into_boxed();

    if let Some(limit) = recipes_limit {
        query = query.limit(limit.max(0));
    }

    let rows: Vec<RecipeSummaryRow> = query.load(conn)?;

    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(user.id))
        .count()
        .get_result(conn)?;

    Ok(UserWithRecipesResponse {
        id: base.id,
        email: base.email,
        username: base.username,
        first_name: base.first_name,
        last_name: base.last_name,
        is_subscribed: base.is_subscribed,
        recipes: rows.iter().map(RecipeShortResponse::from_row).collect(),
        recipes_count,
        avatar: base.avatar,
    })
}
