use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::appointment::AppointmentStatus;
use crate::models::requests::{ErrorBody, ErrorResponse};

/// Reasons the scheduling engine refuses a booking or a status change.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Barber not available")]
    ProviderUnavailable,

    #[error("Service not available")]
    ServiceUnavailable,

    #[error("Barber does not offer this service")]
    ServiceNotOffered,

    #[error("Barber is not available at this time")]
    OutsideWorkingHours,

    #[error("Cannot book appointment in the past")]
    PastDateRejected,

    #[error("Time slot is already booked")]
    SlotConflict,

    #[error("{0}")]
    InvalidStateTransition(String),

    #[error("Appointment is already {0} and cannot be changed")]
    TerminalStateViolation(AppointmentStatus),
}

impl SchedulingError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "ProviderUnavailable",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::ServiceNotOffered => "ServiceNotOffered",
            Self::OutsideWorkingHours => "OutsideWorkingHours",
            Self::PastDateRejected => "PastDateRejected",
            Self::SlotConflict => "SlotConflict",
            Self::InvalidStateTransition(_) => "InvalidStateTransition",
            Self::TerminalStateViolation(_) => "TerminalStateViolation",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SlotConflict | Self::TerminalStateViolation(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to acquire mutex: {0}")]
    Lock(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Time slot is already booked")]
    SlotConflict,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SlotConflict => AppError::Scheduling(SchedulingError::SlotConflict),
            DatabaseError::NotFound(what) => AppError::NotFound(what),
            DatabaseError::Duplicate(what) => AppError::Conflict(what),
            other => AppError::Database(other),
        }
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Scheduling(err) => err.kind(),
            AppError::Database(_) => "Internal",
            AppError::Authentication(_) => "Unauthenticated",
            AppError::Authorization(_) => "Forbidden",
            AppError::Validation(_) => "Validation",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Scheduling(err) => err.status_code(),
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        // Persistence details stay in the logs
        let message = match &self {
            AppError::Database(err) => {
                error!("Request failed with database error: {}", err);
                "An internal server error occurred".to_string()
            }
            AppError::Scheduling(err) => err.to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
