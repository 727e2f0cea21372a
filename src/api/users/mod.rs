pub mod avatar;
pub mod create;
pub mod get;
pub mod list;
pub mod me;
pub mod response;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints.
///
/// Static segments (me, subscriptions, set_password) take priority over the
/// dynamic {id} routes in axum's matcher.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(create::signup))
        .route("/me", get(me::me))
        .route(
            "/me/avatar",
            put(avatar::set_avatar).delete(avatar::delete_avatar),
        )
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/{id}", get(get::get_user))
        .route("/{id}/avatar", get(avatar::get_avatar))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::signup,
        list::list_users,
        get::get_user,
        me::me,
        set_password::set_password,
        avatar::set_avatar,
        avatar::delete_avatar,
        avatar::get_avatar,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::list_subscriptions,
    ),
    components(schemas(
        create::SignupRequest,
        create::SignupResponse,
        list::ListUsersResponse,
        set_password::SetPasswordRequest,
        avatar::SetAvatarRequest,
        avatar::SetAvatarResponse,
        subscriptions::SubscriptionsResponse,
        response::UserResponse,
        response::UserWithRecipesResponse,
    ))
)]
pub struct ApiDoc;
