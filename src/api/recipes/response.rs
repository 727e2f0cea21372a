use crate::api::users::response::{user_response, UserResponse};
use crate::models::{Ingredient, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart_items, tags,
    users,
};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Recipe columns needed to build response bodies. Leaves the image bytes
/// in the database; clients fetch them through the image endpoint.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = recipes)]
pub struct RecipeSummaryRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// An ingredient line within a recipe body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

/// Full recipe representation with embedded author, tags and ingredients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe representation used by favorites, carts and subscriptions
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

pub fn image_url(recipe_id: Uuid) -> String {
    format!("/api/recipes/{}/image", recipe_id)
}

impl RecipeShortResponse {
    pub fn from_row(row: &RecipeSummaryRow) -> Self {
        RecipeShortResponse {
            id: row.id,
            name: row.name.clone(),
            image: image_url(row.id),
            cooking_time: row.cooking_time,
        }
    }
}

/// Assemble the full recipe body: author profile, tags, ingredient lines and
/// the viewer-dependent flags.
pub fn recipe_response(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    row: &RecipeSummaryRow,
) -> QueryResult<RecipeResponse> {
    let author: User = users::table
        .find(row.author_id)
        .select(User::as_select())
        .first(conn)?;
    let author = user_response(conn, viewer, &author)?;

    let tag_rows: Vec<Tag> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(row.id))
        .select(Tag::as_select())
        .order(tags::name.asc())
        .load(conn)?;

    let ingredient_rows: Vec<(Ingredient, f64)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(row.id))
        .select((Ingredient::as_select(), recipe_ingredients::amount))
        .order(ingredients::name.asc())
        .load(conn)?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => {
            let favorited: bool = diesel::select(diesel::dsl::exists(
                favorites::table
                    .filter(favorites::user_id.eq(viewer_id))
                    .filter(favorites::recipe_id.eq(row.id)),
            ))
            .get_result(conn)?;
            let in_cart: bool = diesel::select(diesel::dsl::exists(
                shopping_cart_items::table
                    .filter(shopping_cart_items::user_id.eq(viewer_id))
                    .filter(shopping_cart_items::recipe_id.eq(row.id)),
            ))
            .get_result(conn)?;
            (favorited, in_cart)
        }
        None => (false, false),
    };

    Ok(RecipeResponse {
        id: row.id,
        tags: tag_rows,
        author,
        ingredients: ingredient_rows
            .into_iter()
            .map(|(ingredient, amount)| RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            })
            .collect(),
        is_favorited,
        is_in_shopping_cart,
        name: row.name.clone(),
        image: image_url(row.id),
        text: row.text.clone(),
        cooking_time: row.cooking_time,
    })
}
