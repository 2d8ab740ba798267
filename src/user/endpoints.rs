//! Route handlers for registering users and managing the logged in user's profile.

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    user::{
        core::UserID,
        repository::SQLiteUserRepository,
        service::{UserResponse, UserService},
        validation::{NewUser, UserUpdate},
    },
    validation::ValidJson,
};

/// The user service backed by SQLite that the route handlers use.
pub type SQLiteUserService = UserService<SQLiteUserRepository>;

impl FromRef<AppState> for SQLiteUserService {
    fn from_ref(state: &AppState) -> Self {
        UserService::new(
            SQLiteUserRepository::new(state.db_connection.clone()),
            state.auth_config.password_cost,
        )
    }
}

/// A route handler for registering a new user, responds with the new user's profile.
pub async fn register_user_endpoint(
    State(service): State<SQLiteUserService>,
    ValidJson(new_user): ValidJson<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    let user = service.register_user(new_user)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// A route handler for getting the logged in user's profile.
pub async fn get_profile_endpoint(
    State(service): State<SQLiteUserService>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserResponse>, Error> {
    service.get_user_by_id(user_id).map(Json)
}

/// A route handler for changing the logged in user's name, email or password.
pub async fn update_profile_endpoint(
    State(service): State<SQLiteUserService>,
    Extension(user_id): Extension<UserID>,
    ValidJson(update): ValidJson<UserUpdate>,
) -> Result<Json<UserResponse>, Error> {
    service.update_profile(user_id, update).map(Json)
}

/// A route handler for deleting the logged in user and all of their transactions.
pub async fn delete_profile_endpoint(
    State(service): State<SQLiteUserService>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserResponse>, Error> {
    service.delete_user(user_id).map(Json)
}
