use axum::{
    extract::{Json as ExtractJson, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Actor;
use crate::error::AppError;
use crate::handlers::api::{clean_text, AppState};
use crate::models::appointment::ActorRole;
use crate::models::requests::{CreateReviewRequest, ProviderReviewsResponse, ReviewReplyRequest};
use crate::models::review::{Review, ReviewResponse};
use crate::services::database::new_record_id;
use crate::services::reviews::{summarize_ratings, validate_review, MAX_COMMENT_LENGTH};

pub const MAX_RESPONSE_LENGTH: usize = 500;

// Review a completed appointment
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ExtractJson(request): ExtractJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    actor.require_role(ActorRole::Customer)?;
    info!(
        "Customer {} reviewing appointment {}",
        actor.id, request.appointment_id
    );

    let appointment = state
        .database
        .find_appointment(&request.appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("Appointment {}", request.appointment_id)))?;

    validate_review(
        &appointment,
        &actor.id,
        request.rating,
        request.comment.as_deref(),
    )?;

    let review = Review {
        id: new_record_id(),
        appointment_id: appointment.id,
        customer_id: actor.id,
        provider_id: appointment.provider_id,
        service_id: appointment.service_id,
        rating: request.rating,
        comment: clean_text("Comment", request.comment, MAX_COMMENT_LENGTH)?,
        response: None,
        created_at: Utc::now(),
    };

    let stored = state.database.insert_review(review)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// Reviews of one barber with their rating summary
pub async fn list_barber_reviews(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
) -> Result<Json<ProviderReviewsResponse>, AppError> {
    if state.database.find_provider(&barber_id)?.is_none() {
        return Err(AppError::NotFound(format!("Barber {}", barber_id)));
    }

    let reviews = state.database.list_reviews_for_provider(&barber_id)?;
    let rating = summarize_ratings(&reviews);

    Ok(Json(ProviderReviewsResponse { reviews, rating }))
}

// The reviewed barber (or an admin) answers a review once
pub async fn respond_to_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(review_id): Path<String>,
    ExtractJson(request): ExtractJson<ReviewReplyRequest>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .database
        .find_review(&review_id)?
        .ok_or_else(|| AppError::NotFound(format!("Review {}", review_id)))?;

    let allowed = match actor.role {
        ActorRole::Admin => true,
        ActorRole::Provider => state
            .database
            .find_provider_by_user(&actor.id)?
            .is_some_and(|provider| provider.id == review.provider_id),
        ActorRole::Customer => false,
    };
    if !allowed {
        warn!(
            "{} {} attempted to respond to review {}",
            actor.role, actor.id, review_id
        );
        return Err(AppError::Authorization(
            "Not authorized to respond to this review".to_string(),
        ));
    }

    let text = clean_text("Response", Some(request.text), MAX_RESPONSE_LENGTH)?
        .ok_or_else(|| AppError::Validation("Response is required".to_string()))?;

    info!("{} {} responding to review {}", actor.role, actor.id, review_id);

    let updated = state
        .database
        .update_review(&review_id, |review| -> Result<(), AppError> {
            if review.response.is_some() {
                return Err(AppError::Conflict(
                    "Response already exists for this review".to_string(),
                ));
            }
            review.response = Some(ReviewResponse {
                text,
                responded_by: actor.id.clone(),
                responded_at: Utc::now(),
            });
            Ok(())
        })?;

    Ok(Json(updated))
}
