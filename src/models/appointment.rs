use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::catalog::Currency;
use crate::models::schedule::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Completed and cancelled appointments accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether an appointment in this status still blocks its interval.
    pub fn occupies_slot(self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    #[serde(rename = "barber", alias = "provider")]
    Provider,
    Admin,
}

impl ActorRole {
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Provider | Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Provider => "barber",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "barber" | "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown actor role: {}", other)),
        }
    }
}

/// Price and interval fixed at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingQuote {
    pub interval: Interval,
    pub price_cents: u64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub provider_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub interval: Interval,
    pub status: AppointmentStatus,
    pub price_cents: u64,
    pub currency: Currency,
    pub customer_notes: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<ActorRole>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rescheduled_from: Option<String>,
    pub rescheduled_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A freshly booked appointment awaiting confirmation.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        id: String,
        customer_id: &str,
        provider_id: &str,
        service_id: &str,
        date: NaiveDate,
        quote: BookingQuote,
        customer_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id: customer_id.to_string(),
            provider_id: provider_id.to_string(),
            service_id: service_id.to_string(),
            date,
            interval: quote.interval,
            status: AppointmentStatus::Pending,
            price_cents: quote.price_cents,
            currency: quote.currency,
            customer_notes,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            rescheduled_from: None,
            rescheduled_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.interval.start().to_naive_time())
    }

    /// Records a status change that has already passed transition checks.
    pub fn apply_status(
        &mut self,
        status: AppointmentStatus,
        actor: ActorRole,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.updated_at = now;

        if status == AppointmentStatus::Cancelled {
            self.cancelled_by = Some(actor);
            self.cancelled_at = Some(now);
            self.cancellation_reason = reason;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventKind {
    Booked,
    StatusChanged,
    Cancelled,
    Rescheduled,
}

// Payload handed to the notifier once a scheduling decision is final
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentEvent {
    pub kind: AppointmentEventKind,
    pub appointment: Appointment,
}
