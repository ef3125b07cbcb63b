use chrono::{Duration, NaiveDateTime};
use std::num::NonZeroU16;
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::appointment::{ActorRole, Appointment, AppointmentStatus};

/// Business rules that govern booking changes.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    /// Customers may cancel only while more than this remains before the start.
    pub cancellation_cutoff: Duration,
    /// Customers may reschedule only while more than this remains before the start.
    pub reschedule_cutoff: Duration,
    pub slot_duration: NonZeroU16,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            cancellation_cutoff: Duration::hours(2),
            reschedule_cutoff: Duration::hours(4),
            slot_duration: NonZeroU16::new(30).unwrap_or(NonZeroU16::MIN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(AppointmentStatus),
    /// Cancels the appointment and books a new pending one elsewhere.
    Reschedule,
}

// A cutoff reaching past the representable range leaves no time to act
fn before_cutoff(now: NaiveDateTime, starts_at: NaiveDateTime, cutoff: Duration) -> bool {
    starts_at
        .checked_sub_signed(cutoff)
        .is_some_and(|deadline| now < deadline)
}

/// Decides whether `actor` may apply `requested` to `appointment` at `now`.
pub fn can_transition(
    appointment: &Appointment,
    requested: Transition,
    actor: ActorRole,
    now: NaiveDateTime,
    policy: &SchedulingPolicy,
) -> Result<(), SchedulingError> {
    use AppointmentStatus::*;

    let current = appointment.status;
    if current.is_terminal() {
        warn!(
            "Rejected {:?} on appointment {} in terminal state {}",
            requested, appointment.id, current
        );
        return Err(SchedulingError::TerminalStateViolation(current));
    }

    let open = matches!(current, Pending | Confirmed | InProgress);
    let staff = actor.is_staff();
    let starts_at = appointment.starts_at();

    let allowed = match requested {
        Transition::To(Confirmed) => staff && current == Pending,
        Transition::To(InProgress) => staff && matches!(current, Pending | Confirmed),
        Transition::To(Completed) => staff && current == InProgress,
        Transition::To(NoShow) => staff && open,
        Transition::To(Cancelled) if open && actor == ActorRole::Customer => {
            if before_cutoff(now, starts_at, policy.cancellation_cutoff) {
                true
            } else {
                return Err(SchedulingError::InvalidStateTransition(
                    "Appointment cannot be cancelled at this time".to_string(),
                ));
            }
        }
        Transition::To(Cancelled) => staff && open,
        Transition::Reschedule if open && actor == ActorRole::Customer => {
            if before_cutoff(now, starts_at, policy.reschedule_cutoff) {
                true
            } else {
                return Err(SchedulingError::InvalidStateTransition(
                    "Appointment cannot be rescheduled at this time".to_string(),
                ));
            }
        }
        Transition::Reschedule | Transition::To(Pending) => false,
    };

    if !allowed {
        let target = match requested {
            Transition::To(status) => status.as_str(),
            Transition::Reschedule => "rescheduled",
        };
        return Err(SchedulingError::InvalidStateTransition(format!(
            "A {} cannot move an appointment from {} to {}",
            actor, current, target
        )));
    }

    debug!(
        "Allowed {:?} on appointment {} by {}",
        requested, appointment.id, actor
    );
    Ok(())
}
