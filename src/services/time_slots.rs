use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::num::NonZeroU16;
use tracing::debug;

use crate::models::schedule::{Interval, TimeOfDay, WeeklyAvailability};

pub const UNAVAILABLE_DAY_MESSAGE: &str = "Barber is not available on this day";

// One candidate slot of a provider's working day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    #[serde(flatten)]
    pub interval: Interval,
    pub is_free: bool,
}

/// Every candidate slot for a date, free and occupied alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotGrid {
    pub date: NaiveDate,
    #[serde(skip)]
    pub weekday: Weekday,
    pub working_hours: Option<Interval>,
    pub slots: Vec<Slot>,
}

// Response structure for the availability endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSlots {
    pub date: NaiveDate,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub available_slots: Vec<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<Interval>,
}

/// First booked interval that overlaps the candidate, if any.
pub fn find_conflict<'a>(booked: &'a [Interval], candidate: &Interval) -> Option<&'a Interval> {
    booked.iter().find(|interval| interval.overlaps(candidate))
}

fn interval_between(start: u32, end: u32) -> Option<Interval> {
    let start = TimeOfDay::from_minutes(u16::try_from(start).ok()?)?;
    let end = TimeOfDay::from_minutes(u16::try_from(end).ok()?)?;
    Interval::new(start, end).ok()
}

/// Tiles the provider's working window for `date` into fixed-size slots.
///
/// Tiling starts at the window start; a trailing slot that would end after
/// the window end is dropped rather than shortened.
pub fn build_slot_grid(
    availability: &WeeklyAvailability,
    booked: &[Interval],
    date: NaiveDate,
    slot_duration: NonZeroU16,
) -> SlotGrid {
    let weekday = date.weekday();

    let Some(window) = availability.day(weekday).working_window() else {
        debug!("No working window on {} ({})", date, weekday);
        return SlotGrid {
            date,
            weekday,
            working_hours: None,
            slots: Vec::new(),
        };
    };

    let step = u32::from(slot_duration.get());
    let window_end = u32::from(window.end().minutes());
    let mut slots = Vec::new();
    let mut start = u32::from(window.start().minutes());

    while start + step <= window_end {
        let Some(interval) = interval_between(start, start + step) else {
            break;
        };

        slots.push(Slot {
            interval,
            is_free: find_conflict(booked, &interval).is_none(),
        });
        start += step;
    }

    debug!(
        "Built {} slots of {} minutes for {} within {}",
        slots.len(),
        step,
        date,
        window
    );

    SlotGrid {
        date,
        weekday,
        working_hours: Some(window),
        slots,
    }
}

/// Free candidate slots for a provider on `date`.
///
/// `booked` must hold only intervals that still occupy the provider's time
/// (cancelled and no-show appointments excluded).
pub fn compute_available_slots(
    availability: &WeeklyAvailability,
    booked: &[Interval],
    date: NaiveDate,
    slot_duration: NonZeroU16,
) -> AvailableSlots {
    let grid = build_slot_grid(availability, booked, date, slot_duration);

    match grid.working_hours {
        None => AvailableSlots {
            date,
            is_available: false,
            message: Some(UNAVAILABLE_DAY_MESSAGE.to_string()),
            available_slots: Vec::new(),
            working_hours: None,
        },
        Some(window) => AvailableSlots {
            date,
            is_available: true,
            message: None,
            available_slots: grid
                .slots
                .iter()
                .filter(|slot| slot.is_free)
                .map(|slot| slot.interval)
                .collect(),
            working_hours: Some(window),
        },
    }
}
