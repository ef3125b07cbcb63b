use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::SchedulingError;
use crate::models::appointment::BookingQuote;
use crate::models::catalog::{Provider, Service};
use crate::models::schedule::{Interval, TimeOfDay};
use crate::services::time_slots::find_conflict;

/// Checks whether `service` can be booked with `provider` at `proposed_start`.
///
/// Checks run in a fixed order and stop at the first failure: provider
/// state, service state, service authorization, working hours, past dates,
/// and finally conflicts against `booked` (a snapshot of the intervals that
/// still occupy the provider on `date`). `now` is the current shop-local
/// time. Nothing is persisted here; the caller stores the returned quote.
pub fn validate_booking_request(
    provider: &Provider,
    service: &Service,
    date: NaiveDate,
    proposed_start: TimeOfDay,
    booked: &[Interval],
    now: NaiveDateTime,
) -> Result<BookingQuote, SchedulingError> {
    if !provider.is_bookable() {
        debug!(
            "Provider {} rejected: active={}, verified={}",
            provider.id, provider.is_active, provider.is_verified
        );
        return Err(SchedulingError::ProviderUnavailable);
    }

    if !service.is_active {
        return Err(SchedulingError::ServiceUnavailable);
    }

    if !provider.offers(&service.id) {
        return Err(SchedulingError::ServiceNotOffered);
    }

    let interval = proposed_start
        .checked_add_minutes(service.duration_minutes)
        .and_then(|end| Interval::new(proposed_start, end).ok())
        .ok_or(SchedulingError::OutsideWorkingHours)?;

    let window = provider
        .availability
        .day(date.weekday())
        .working_window()
        .ok_or(SchedulingError::OutsideWorkingHours)?;

    if !window.contains(&interval) {
        debug!(
            "Requested {} on {} falls outside working hours {}",
            interval, date, window
        );
        return Err(SchedulingError::OutsideWorkingHours);
    }

    if date.and_time(proposed_start.to_naive_time()) < now {
        return Err(SchedulingError::PastDateRejected);
    }

    if let Some(existing) = find_conflict(booked, &interval) {
        info!(
            "Requested {} on {} for provider {} conflicts with {}",
            interval, date, provider.id, existing
        );
        return Err(SchedulingError::SlotConflict);
    }

    Ok(BookingQuote {
        interval,
        price_cents: service.price_cents,
        currency: service.currency,
    })
}
