use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, LoginResponse, ProfileResponse, RegisterResponse},
        extractors::AuthUser,
        services::{load_profile, login_user, register_user, validate_credentials},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

fn credentials_body(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<CredentialsRequest, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection, "unreadable credentials body");
        AppError::Validation(rejection.body_text())
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let body = credentials_body(payload)?;
    let creds = validate_credentials(body.email.as_deref(), body.password.as_deref())?;
    let user = register_user(state.store.as_ref(), creds).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let body = credentials_body(payload)?;
    let creds = validate_credentials(body.email.as_deref(), body.password.as_deref())?;
    let token = login_user(state.store.as_ref(), &state.keys, creds).await?;

    Ok(Json(LoginResponse {
        message: "Logged in successfully".into(),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = load_profile(state.store.as_ref(), user_id).await?;
    Ok(Json(ProfileResponse {
        message: "Profile retrieved successfully".into(),
        user,
    }))
}
