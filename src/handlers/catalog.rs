use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::num::NonZeroU16;
use std::sync::Arc;
use tracing::info;

use crate::auth::Actor;
use crate::error::AppError;
use crate::handlers::api::{clean_text, AppState};
use crate::models::appointment::ActorRole;
use crate::models::catalog::{Provider, Service, MAX_SERVICE_DURATION, MIN_SERVICE_DURATION};
use crate::models::requests::{
    AvailabilityQuery, AvailabilityUpdate, CreateProviderRequest, CreateServiceRequest,
    ProviderResponse, ServiceListResponse, UpdateProviderRequest, UpdateServiceRequest,
    VerifyProviderRequest,
};
use crate::models::schedule::{parse_weekday, WeeklyAvailability};
use crate::services::database::new_record_id;
use crate::services::reviews::summarize_ratings;
use crate::services::time_slots::{build_slot_grid, compute_available_slots, AvailableSlots, SlotGrid};

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;

fn required_text(field: &str, value: String, max_len: usize) -> Result<String, AppError> {
    clean_text(field, Some(value), max_len)?
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn check_duration(duration_minutes: u16) -> Result<(), AppError> {
    if !(MIN_SERVICE_DURATION..=MAX_SERVICE_DURATION).contains(&duration_minutes) {
        return Err(AppError::Validation(format!(
            "Duration must be between {} and {} minutes",
            MIN_SERVICE_DURATION, MAX_SERVICE_DURATION
        )));
    }
    Ok(())
}

fn find_provider(state: &AppState, provider_id: &str) -> Result<Provider, AppError> {
    state
        .database
        .find_provider(provider_id)?
        .ok_or_else(|| AppError::NotFound(format!("Barber {}", provider_id)))
}

fn slot_duration(state: &AppState, requested: Option<u16>) -> Result<NonZeroU16, AppError> {
    match requested {
        None => Ok(state.policy.slot_duration),
        Some(minutes) => NonZeroU16::new(minutes)
            .filter(|m| m.get() <= MAX_SERVICE_DURATION)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "slot_minutes must be between 1 and {}",
                    MAX_SERVICE_DURATION
                ))
            }),
    }
}

// List active services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ServiceListResponse>, AppError> {
    let services = state
        .database
        .list_services()?
        .into_iter()
        .filter(|service| service.is_active)
        .collect();

    Ok(Json(ServiceListResponse { services }))
}

// Add a service to the catalog
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ExtractJson(request): ExtractJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!("Admin {} creating service {:?}", actor.id, request.name);

    check_duration(request.duration_minutes)?;

    let service = Service {
        id: new_record_id(),
        name: required_text("Name", request.name, MAX_NAME_LENGTH)?,
        description: clean_text("Description", Some(request.description), MAX_DESCRIPTION_LENGTH)?
            .unwrap_or_default(),
        duration_minutes: request.duration_minutes,
        price_cents: request.price_cents,
        currency: request.currency,
        is_active: true,
        provider_ids: Vec::new(),
    };

    let stored = state.database.insert_service(service)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// Service details endpoint
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> Result<Json<Service>, AppError> {
    state
        .database
        .find_service(&service_id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Service {}", service_id)))
}

// Edit a catalog entry
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(service_id): Path<String>,
    ExtractJson(request): ExtractJson<UpdateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!("Admin {} updating service {}", actor.id, service_id);

    if let Some(duration_minutes) = request.duration_minutes {
        check_duration(duration_minutes)?;
    }
    let name = request
        .name
        .map(|name| required_text("Name", name, MAX_NAME_LENGTH))
        .transpose()?;
    let description = request
        .description
        .map(|text| clean_text("Description", Some(text), MAX_DESCRIPTION_LENGTH))
        .transpose()?;

    let updated = state
        .database
        .update_service(&service_id, |service| -> Result<(), AppError> {
            if let Some(name) = name {
                service.name = name;
            }
            if let Some(description) = description {
                service.description = description.unwrap_or_default();
            }
            if let Some(duration_minutes) = request.duration_minutes {
                service.duration_minutes = duration_minutes;
            }
            if let Some(price_cents) = request.price_cents {
                service.price_cents = price_cents;
            }
            if let Some(currency) = request.currency {
                service.currency = currency;
            }
            if let Some(is_active) = request.is_active {
                service.is_active = is_active;
            }
            Ok(())
        })?;

    Ok(Json(updated))
}

// Withdraw a service from booking; existing appointments keep referring to it
pub async fn deactivate_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(service_id): Path<String>,
) -> Result<Json<Service>, AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!("Admin {} deactivating service {}", actor.id, service_id);

    let updated = state
        .database
        .update_service(&service_id, |service| -> Result<(), AppError> {
            service.is_active = false;
            Ok(())
        })?;

    Ok(Json(updated))
}

// Authorize a barber to perform a service
pub async fn assign_barber_to_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((service_id, barber_id)): Path<(String, String)>,
) -> Result<Json<Service>, AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!(
        "Admin {} assigning barber {} to service {}",
        actor.id, barber_id, service_id
    );

    let (service, _) = state
        .database
        .assign_provider_to_service(&service_id, &barber_id)?;
    Ok(Json(service))
}

// Stop a barber from performing a service
pub async fn remove_barber_from_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((service_id, barber_id)): Path<(String, String)>,
) -> Result<Json<Service>, AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!(
        "Admin {} removing barber {} from service {}",
        actor.id, barber_id, service_id
    );

    let service = state
        .database
        .remove_provider_from_service(&service_id, &barber_id)?;
    Ok(Json(service))
}

// List bookable barbers
pub async fn list_barbers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Provider>>, AppError> {
    let providers = state
        .database
        .list_providers()?
        .into_iter()
        .filter(Provider::is_bookable)
        .collect();

    Ok(Json(providers))
}

// Create the caller's barber profile
pub async fn create_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ExtractJson(request): ExtractJson<CreateProviderRequest>,
) -> Result<(StatusCode, Json<Provider>), AppError> {
    actor.require_role(ActorRole::Provider)?;
    info!("User {} creating barber profile", actor.id);

    // New profiles wait for verification before they can be booked
    let provider = Provider {
        id: new_record_id(),
        user_id: actor.id.clone(),
        display_name: required_text("Display name", request.display_name, MAX_NAME_LENGTH)?,
        bio: clean_text("Bio", request.bio, MAX_DESCRIPTION_LENGTH)?,
        is_active: true,
        is_verified: false,
        availability: WeeklyAvailability::default(),
        service_ids: Vec::new(),
    };

    let stored = state.database.insert_provider(provider)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// Barber details with rating summary
pub async fn get_barber(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
) -> Result<Json<ProviderResponse>, AppError> {
    let provider = find_provider(&state, &barber_id)?;
    let reviews = state.database.list_reviews_for_provider(&provider.id)?;

    Ok(Json(ProviderResponse {
        rating: summarize_ratings(&reviews),
        provider,
    }))
}

// Edit the display name or bio of a barber profile
pub async fn update_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(barber_id): Path<String>,
    ExtractJson(request): ExtractJson<UpdateProviderRequest>,
) -> Result<Json<Provider>, AppError> {
    let provider = find_provider(&state, &barber_id)?;
    let is_owner = actor.role == ActorRole::Provider && provider.user_id == actor.id;
    if !is_owner && actor.role != ActorRole::Admin {
        return Err(AppError::Authorization(
            "Not authorized to update this barber profile".to_string(),
        ));
    }

    let display_name = request
        .display_name
        .map(|name| required_text("Display name", name, MAX_NAME_LENGTH))
        .transpose()?;
    // A blank bio clears it
    let bio = request
        .bio
        .map(|bio| clean_text("Bio", Some(bio), MAX_DESCRIPTION_LENGTH))
        .transpose()?;

    info!("{} {} updating barber profile {}", actor.role, actor.id, barber_id);

    let updated = state
        .database
        .update_provider(&barber_id, |provider| -> Result<(), AppError> {
            if let Some(display_name) = display_name {
                provider.display_name = display_name;
            }
            if let Some(bio) = bio {
                provider.bio = bio;
            }
            Ok(())
        })?;

    Ok(Json(updated))
}

// Replace the working window of selected weekdays
pub async fn update_barber_availability(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(barber_id): Path<String>,
    ExtractJson(update): ExtractJson<AvailabilityUpdate>,
) -> Result<Json<Provider>, AppError> {
    let provider = find_provider(&state, &barber_id)?;
    let is_owner = actor.role == ActorRole::Provider && provider.user_id == actor.id;
    if !is_owner && actor.role != ActorRole::Admin {
        return Err(AppError::Authorization(
            "Not authorized to update this availability".to_string(),
        ));
    }

    let days = update
        .into_iter()
        .map(|(name, day)| {
            parse_weekday(&name)
                .map(|weekday| (weekday, day))
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "{} {} updating {} weekdays for barber {}",
        actor.role,
        actor.id,
        days.len(),
        barber_id
    );

    let updated = state
        .database
        .update_provider(&barber_id, |provider| -> Result<(), AppError> {
            for (weekday, day) in days {
                provider.availability.set(weekday, day);
            }
            Ok(())
        })?;

    Ok(Json(updated))
}

// Set the verification and activity flags of a barber
pub async fn verify_barber(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(barber_id): Path<String>,
    ExtractJson(request): ExtractJson<VerifyProviderRequest>,
) -> Result<Json<Provider>, AppError> {
    actor.require_role(ActorRole::Admin)?;
    info!(
        "Admin {} setting verified={} for barber {}",
        actor.id, request.is_verified, barber_id
    );

    let updated = state
        .database
        .update_provider(&barber_id, |provider| -> Result<(), AppError> {
            provider.is_verified = request.is_verified;
            if let Some(is_active) = request.is_active {
                provider.is_active = is_active;
            }
            Ok(())
        })?;

    Ok(Json(updated))
}

// Free slots of a barber on a date
pub async fn get_barber_availability(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailableSlots>, AppError> {
    let provider = find_provider(&state, &barber_id)?;
    let duration = slot_duration(&state, query.slot_minutes)?;
    let booked = state
        .database
        .booked_intervals(&provider.id, query.date, None)?;

    Ok(Json(compute_available_slots(
        &provider.availability,
        &booked,
        query.date,
        duration,
    )))
}

// Every slot of a barber's day, free or taken
pub async fn get_barber_slots(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<SlotGrid>, AppError> {
    let provider = find_provider(&state, &barber_id)?;
    let duration = slot_duration(&state, query.slot_minutes)?;
    let booked = state
        .database
        .booked_intervals(&provider.id, query.date, None)?;

    Ok(Json(build_slot_grid(
        &provider.availability,
        &booked,
        query.date,
        duration,
    )))
}
