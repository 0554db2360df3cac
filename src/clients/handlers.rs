use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{auth::extractors::AuthUser, state::AppState};

use super::dto::{CreateClientRequest, UpdateClientRequest};
use super::repo::Client;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "clients store error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".into(),
    )
}

#[instrument(skip(state))]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<Client>>, (StatusCode, String)> {
    let clients = Client::list(&state.db).await.map_err(internal)?;
    Ok(Json(clients))
}

#[instrument(skip(state, payload))]
pub async fn create_client(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), (StatusCode, String)> {
    if payload.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }
    let client = Client::create(
        &state.db,
        payload.name.trim(),
        payload.email.as_deref(),
        payload.google_ads_id.as_deref(),
        payload.meta_ads_id.as_deref(),
    )
    .await
    .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(client)))
}

#[instrument(skip(state))]
pub async fn get_client(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Client>, (StatusCode, String)> {
    let client = Client::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Client not found".to_string()))?;
    Ok(Json(client))
}

#[instrument(skip(state, payload))]
pub async fn update_client(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<Client>, (StatusCode, String)> {
    let client = Client::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.google_ads_id.as_deref(),
        payload.meta_ads_id.as_deref(),
    )
    .await
    .map_err(internal)?
    .ok_or((StatusCode::NOT_FOUND, "Client not found".to_string()))?;
    Ok(Json(client))
}

#[instrument(skip(state))]
pub async fn delete_client(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = Client::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Client not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
