use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub appointment_id: String,
    pub customer_id: String,
    pub provider_id: String,
    pub service_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub response: Option<ReviewResponse>,
    pub created_at: DateTime<Utc>,
}

/// The barber's public reply to a review. A review carries at most one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewResponse {
    pub text: String,
    pub responded_by: String,
    pub responded_at: DateTime<Utc>,
}

// Aggregate of a provider's ratings, computed on read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub total: usize,
    /// Counts for ratings 1 through 5.
    pub distribution: [usize; 5],
}
