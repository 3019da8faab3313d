use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use midnight_domain::{CredentialVault, TravelCredential};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/credentials",
        get(check_credentials)
            .post(save_credentials)
            .delete(delete_credentials),
    )
}

#[derive(Debug, Deserialize)]
struct SaveCredentials {
    username: String,
    password: String,
}

/// Plaintext never reaches storage: both fields are sealed by the vault
/// before the upsert.
async fn save_credentials(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(input): Json<SaveCredentials>,
) -> Result<Json<serde_json::Value>, AppError> {
    if input.username.is_empty() || input.password.is_empty() {
        return Err(AppError::ValidationError(
            "Username and password required".to_string(),
        ));
    }

    let username = state
        .vault
        .encrypt(input.username.as_bytes())
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let password = state
        .vault
        .encrypt(input.password.as_bytes())
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let credential = TravelCredential::new(user_id, username, password);
    state
        .credentials
        .upsert(&credential)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "message": "Credentials saved successfully" })))
}

async fn check_credentials(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let credential = state
        .credentials
        .find_for_user(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "has_credentials": credential.is_some() })))
}

async fn delete_credentials(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state
        .credentials
        .delete_for_user(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !deleted {
        return Err(AppError::NotFoundError(
            "No credentials found".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Credentials deleted successfully" })))
}
