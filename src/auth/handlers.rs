use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest,
            ResetConfirmRequest, ResetRequest, ResetRequestedResponse,
        },
        extractors::AuthUser,
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/reset/request", post(request_reset))
        .route("/auth/reset/confirm", post(confirm_reset))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = state
        .auth
        .register(
            &payload.name,
            &payload.email,
            &payload.password,
            OffsetDateTime::now_utc(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let (token, user) = state
        .auth
        .login(&payload.email, &payload.password, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ResetRequestedResponse>, AuthError> {
    let reset_token = state
        .auth
        .request_reset(&payload.email, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(ResetRequestedResponse { reset_token }))
}

#[instrument(skip(state, payload))]
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    state
        .auth
        .confirm_reset(
            &payload.email,
            &payload.token,
            &payload.new_password,
            OffsetDateTime::now_utc(),
        )
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.auth.current_user(user_id).await?;
    Ok(Json(user.into()))
}
