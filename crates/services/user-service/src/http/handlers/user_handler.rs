//! User handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use common::AppResult;
use domain::{
    birth_date_format, Cpf, DomainError, PatchOperation, User, UserFilter, UserResponse,
};

use crate::http::extractors::ValidatedJson;
use crate::http::state::AppState;

/// User registration request with validation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// Check digits are verified by the registration pipeline
    #[validate(length(min = 1, message = "CPF cannot be empty"))]
    pub cpf: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// `dd/mm/yyyy`
    #[serde(with = "birth_date_format")]
    pub birth_date: NaiveDate,
}

impl RegisterUserRequest {
    pub fn into_user(self) -> User {
        User::new(self.name, Cpf::new(self.cpf), self.email, self.birth_date)
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search_users).post(register_user))
        .route("/:id", get(get_user).patch(patch_user))
}

/// Register a new user, answering with its location
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> AppResult<impl IntoResponse> {
    let id = state.user_service.create_user(payload.into_user()).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/users/{}", id))],
    ))
}

/// Get user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(&id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Search users by query string, e.g. `?cpf=130.877.567-92&email=a@b.com&operator=OR`.
/// No criteria lists everyone.
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let filter = UserFilter::from_params(params)?;
    let users = state.user_service.search_users(filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Apply replace operations to a user. A body that is not a list of
/// operations is an invalid patch.
pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Vec<PatchOperation>>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(operations) = payload.map_err(|e| DomainError::invalid_patch(e.body_text()))?;

    state.user_service.patch_user(&id, operations).await?;

    Ok(StatusCode::NO_CONTENT)
}
