use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use midnight_domain::{BookingError, BookingRequest, NewBooking};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route(
            "/v1/bookings/{id}",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = state
        .bookings
        .list_for_user(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "bookings": bookings })))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state
        .bookings
        .get_for_user(id, user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    Ok(Json(json!({ "booking": booking })))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(input): Json<NewBooking>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let subscribed = state
        .users
        .has_active_subscription(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !subscribed {
        return Err(AppError::AuthorizationError(
            "Active subscription required".to_string(),
        ));
    }

    let user = state
        .users
        .find(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    let booking = BookingRequest::new(user_id, input, &user.timezone)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    state
        .bookings
        .create(&booking)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!(booking_id = %booking.id, scheduled_time = %booking.scheduled_time, "booking request created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking request created successfully",
            "booking": booking,
        })),
    ))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewBooking>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut booking = state
        .bookings
        .get_for_user(id, user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    let user = state
        .users
        .find(user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    booking
        .apply_edit(input, &user.timezone)
        .map_err(|e: BookingError| AppError::ValidationError(e.to_string()))?;

    state
        .bookings
        .update_details(&booking)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({
        "message": "Booking updated successfully",
        "booking": booking,
    })))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .bookings
        .get_for_user(id, user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    let canceled = state
        .bookings
        .cancel(id, user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !canceled {
        return Err(AppError::ValidationError(
            "Cannot cancel completed or processing bookings".to_string(),
        ));
    }

    info!(booking_id = %id, "booking request canceled");

    Ok(Json(json!({ "message": "Booking canceled successfully" })))
}
