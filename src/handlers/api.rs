use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::auth::{Actor, NonceCache};
use crate::client::Notifier;
use crate::error::{AppError, SchedulingError};
use crate::models::appointment::{
    ActorRole, Appointment, AppointmentEvent, AppointmentEventKind, AppointmentStatus,
    BookingQuote,
};
use crate::models::common::PaginationParams;
use crate::models::requests::{
    AppointmentFilterParams, AppointmentListResponse, CancelAppointmentRequest,
    CreateAppointmentRequest, RescheduleRequest, RescheduleResponse, UpdateStatusRequest,
};
use crate::services::booking::validate_booking_request;
use crate::services::database::{new_record_id, AppointmentFilter, DatabaseService};
use crate::services::lifecycle::{can_transition, SchedulingPolicy, Transition};

pub const MAX_NOTES_LENGTH: usize = 500;
pub const MAX_CANCELLATION_REASON_LENGTH: usize = 200;
const RESCHEDULE_REASON: &str = "Rescheduled";

// AppState struct containing shared resources
pub struct AppState {
    pub database: Arc<DatabaseService>,
    pub notifier: Arc<dyn Notifier>,
    pub policy: SchedulingPolicy,
    pub gateway_secret: Option<String>,
    pub signature_max_skew_secs: i64,
    pub utc_offset: Duration,
    pub nonces: Mutex<NonceCache>,
}

impl AppState {
    /// Current wall-clock time in the shop's time zone.
    pub fn local_now(&self) -> NaiveDateTime {
        (Utc::now() + self.utc_offset).naive_utc()
    }

    fn emit(&self, kind: AppointmentEventKind, appointment: &Appointment) {
        self.notifier.notify(AppointmentEvent {
            kind,
            appointment: appointment.clone(),
        });
    }

    /// Whether `actor` is the customer, the barber or an admin for `appointment`.
    pub(crate) fn is_participant(
        &self,
        actor: &Actor,
        appointment: &Appointment,
    ) -> Result<bool, AppError> {
        Ok(match actor.role {
            ActorRole::Admin => true,
            ActorRole::Customer => appointment.customer_id == actor.id,
            ActorRole::Provider => self
                .database
                .find_provider_by_user(&actor.id)?
                .is_some_and(|provider| provider.id == appointment.provider_id),
        })
    }

    fn load_for_participant(&self, actor: &Actor, appointment_id: &str) -> Result<Appointment, AppError> {
        let appointment = self
            .database
            .find_appointment(appointment_id)?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {}", appointment_id)))?;

        if !self.is_participant(actor, &appointment)? {
            warn!(
                "{} {} attempted to access appointment {}",
                actor.role, actor.id, appointment_id
            );
            return Err(AppError::Authorization(
                "Not authorized to access this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }
}

/// Trims free text, treating blank input as absent.
pub(crate) fn clean_text(
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} cannot exceed {} characters",
            field, max_len
        )));
    }
    Ok(Some(trimmed.to_string()))
}

// Book an appointment endpoint
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ExtractJson(request): ExtractJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    actor.require_role(ActorRole::Customer)?;
    info!(
        "Customer {} requested barber {} for service {} on {} at {}",
        actor.id, request.barber_id, request.service_id, request.date, request.start_time
    );

    let customer_notes = clean_text("Customer notes", request.customer_notes, MAX_NOTES_LENGTH)?;

    let provider = state
        .database
        .find_provider(&request.barber_id)?
        .ok_or(SchedulingError::ProviderUnavailable)?;
    let service = state
        .database
        .find_service(&request.service_id)?
        .ok_or(SchedulingError::ServiceUnavailable)?;

    let booked = state
        .database
        .booked_intervals(&provider.id, request.date, None)?;

    let quote = validate_booking_request(
        &provider,
        &service,
        request.date,
        request.start_time,
        &booked,
        state.local_now(),
    )?;

    let appointment = Appointment::pending(
        new_record_id(),
        &actor.id,
        &provider.id,
        &service.id,
        request.date,
        quote,
        customer_notes,
        Utc::now(),
    );

    // The store re-checks the interval under its writer lock
    let stored = state.database.insert_appointment_if_free(appointment)?;
    state.emit(AppointmentEventKind::Booked, &stored);

    info!("Booked appointment {} for customer {}", stored.id, actor.id);
    Ok((StatusCode::CREATED, Json(stored)))
}

// List appointments visible to the caller
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(params): Query<AppointmentFilterParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<AppointmentListResponse>, AppError> {
    info!(
        "{} {} listing appointments with page={}, page_size={}",
        actor.role, actor.id, pagination.page, pagination.page_size
    );

    let mut filter = AppointmentFilter {
        status: params.status,
        date_from: params.date.or(params.date_from),
        date_to: params.date.or(params.date_to),
        ..AppointmentFilter::default()
    };

    match actor.role {
        ActorRole::Customer => filter.customer_id = Some(actor.id.clone()),
        ActorRole::Provider => match state.database.find_provider_by_user(&actor.id)? {
            Some(provider) => filter.provider_id = Some(provider.id),
            None => {
                let (appointments, pagination) = pagination.paginate(Vec::new());
                return Ok(Json(AppointmentListResponse {
                    appointments,
                    pagination,
                }));
            }
        },
        ActorRole::Admin => {}
    }

    let matching = state.database.list_appointments(&filter)?;
    let (appointments, pagination) = pagination.paginate(matching);

    Ok(Json(AppointmentListResponse {
        appointments,
        pagination,
    }))
}

// Appointment details endpoint
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.load_for_participant(&actor, &appointment_id)?;
    Ok(Json(appointment))
}

fn change_status(
    state: &AppState,
    actor: &Actor,
    appointment_id: &str,
    status: AppointmentStatus,
    notes: Option<String>,
    reason: Option<String>,
) -> Result<Appointment, AppError> {
    state.load_for_participant(actor, appointment_id)?;

    let now = state.local_now();
    let updated = state
        .database
        .update_appointment(appointment_id, |appointment| -> Result<(), AppError> {
            can_transition(appointment, Transition::To(status), actor.role, now, &state.policy)?;
            appointment.apply_status(status, actor.role, reason, Utc::now());
            if notes.is_some() {
                appointment.notes = notes;
            }
            Ok(())
        })?;

    let kind = if status == AppointmentStatus::Cancelled {
        AppointmentEventKind::Cancelled
    } else {
        AppointmentEventKind::StatusChanged
    };
    state.emit(kind, &updated);

    info!(
        "Appointment {} moved to {} by {} {}",
        appointment_id, status, actor.role, actor.id
    );
    Ok(updated)
}

// Update appointment status endpoint
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(appointment_id): Path<String>,
    ExtractJson(request): ExtractJson<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    info!(
        "{} {} requested status {} for appointment {}",
        actor.role, actor.id, request.status, appointment_id
    );

    let notes = clean_text("Notes", request.notes, MAX_NOTES_LENGTH)?;
    let reason = clean_text(
        "Cancellation reason",
        request.cancellation_reason,
        MAX_CANCELLATION_REASON_LENGTH,
    )?;

    change_status(&state, &actor, &appointment_id, request.status, notes, reason).map(Json)
}

// Cancel appointment endpoint
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(appointment_id): Path<String>,
    ExtractJson(request): ExtractJson<CancelAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    info!(
        "{} {} requested cancellation of appointment {}",
        actor.role, actor.id, appointment_id
    );

    let reason = clean_text(
        "Cancellation reason",
        request.reason,
        MAX_CANCELLATION_REASON_LENGTH,
    )?;
    change_status(
        &state,
        &actor,
        &appointment_id,
        AppointmentStatus::Cancelled,
        None,
        reason,
    )
    .map(Json)
}

// Move an appointment to a new date or time
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(appointment_id): Path<String>,
    ExtractJson(request): ExtractJson<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>, AppError> {
    info!(
        "{} {} requested reschedule of appointment {} to {} at {}",
        actor.role, actor.id, appointment_id, request.new_date, request.new_start_time
    );

    let original = state.load_for_participant(&actor, &appointment_id)?;
    if actor.role != ActorRole::Customer || original.customer_id != actor.id {
        return Err(AppError::Authorization(
            "Only the booking customer may reschedule".to_string(),
        ));
    }

    let now = state.local_now();
    can_transition(&original, Transition::Reschedule, actor.role, now, &state.policy)?;

    let provider = state
        .database
        .find_provider(&original.provider_id)?
        .ok_or(SchedulingError::ProviderUnavailable)?;
    let service = state
        .database
        .find_service(&original.service_id)?
        .ok_or(SchedulingError::ServiceUnavailable)?;

    let booked =
        state
            .database
            .booked_intervals(&provider.id, request.new_date, Some(&appointment_id))?;

    let quote = validate_booking_request(
        &provider,
        &service,
        request.new_date,
        request.new_start_time,
        &booked,
        now,
    )?;

    // The original price is honoured
    let replacement = Appointment::pending(
        new_record_id(),
        &original.customer_id,
        &original.provider_id,
        &original.service_id,
        request.new_date,
        BookingQuote {
            interval: quote.interval,
            price_cents: original.price_cents,
            currency: original.currency,
        },
        original.customer_notes.clone(),
        Utc::now(),
    );

    let (previous, appointment) = state.database.reschedule_appointment(
        &appointment_id,
        replacement,
        |stored| -> Result<(), AppError> {
            can_transition(stored, Transition::Reschedule, actor.role, now, &state.policy)?;
            stored.apply_status(
                AppointmentStatus::Cancelled,
                actor.role,
                Some(RESCHEDULE_REASON.to_string()),
                Utc::now(),
            );
            Ok(())
        },
    )?;

    state.emit(AppointmentEventKind::Rescheduled, &appointment);

    Ok(Json(RescheduleResponse {
        previous,
        appointment,
    }))
}
