use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::catalog::{Currency, Provider, Service};
use crate::models::common::Pagination;
use crate::models::review::{RatingSummary, Review};
use crate::models::schedule::{DayAvailability, TimeOfDay};

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub barber_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_date: NaiveDate,
    pub new_start_time: TimeOfDay,
}

#[derive(Debug, Serialize)]
pub struct RescheduleResponse {
    pub previous: Appointment,
    pub appointment: Appointment,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentFilterParams {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub slot_minutes: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProviderRequest {
    pub display_name: String,
    pub bio: Option<String>,
}

/// Profile fields a barber may edit; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProviderRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

/// Per-weekday replacement windows; weekdays left out are unchanged.
pub type AvailabilityUpdate = BTreeMap<String, DayAvailability>;

#[derive(Debug, Deserialize)]
pub struct VerifyProviderRequest {
    pub is_verified: bool,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    #[serde(flatten)]
    pub provider: Provider,
    pub rating: RatingSummary,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: String,
    pub duration_minutes: u16,
    pub price_cents: u64,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u16>,
    pub price_cents: Option<u64>,
    pub currency: Option<Currency>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub appointment_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewReplyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderReviewsResponse {
    pub reviews: Vec<Review>,
    pub rating: RatingSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}
