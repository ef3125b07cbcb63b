use crate::error::AppError;
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::review::{RatingSummary, Review, MAX_RATING, MIN_RATING};

pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Checks that `customer_id` may leave this review on `appointment`.
pub fn validate_review(
    appointment: &Appointment,
    customer_id: &str,
    rating: u8,
    comment: Option<&str>,
) -> Result<(), AppError> {
    if appointment.customer_id != customer_id {
        return Err(AppError::Authorization(
            "Not authorized to review this appointment".to_string(),
        ));
    }

    if appointment.status != AppointmentStatus::Completed {
        return Err(AppError::Validation(
            "Can only review completed appointments".to_string(),
        ));
    }

    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    if comment.is_some_and(|c| c.chars().count() > MAX_COMMENT_LENGTH) {
        return Err(AppError::Validation(format!(
            "Comment cannot exceed {} characters",
            MAX_COMMENT_LENGTH
        )));
    }

    Ok(())
}

pub fn summarize_ratings(reviews: &[Review]) -> RatingSummary {
    let mut distribution = [0usize; 5];
    let mut sum = 0u64;

    for review in reviews {
        if (MIN_RATING..=MAX_RATING).contains(&review.rating) {
            distribution[usize::from(review.rating - MIN_RATING)] += 1;
            sum += u64::from(review.rating);
        }
    }

    let total: usize = distribution.iter().sum();
    let average = if total == 0 {
        0.0
    } else {
        sum as f64 / total as f64
    };

    RatingSummary {
        average,
        total,
        distribution,
    }
}
