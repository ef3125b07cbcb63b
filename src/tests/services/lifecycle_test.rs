use chrono::{Duration, Utc};

use crate::error::SchedulingError;
use crate::models::appointment::{ActorRole, AppointmentStatus};
use crate::services::lifecycle::{can_transition, SchedulingPolicy, Transition};
use crate::tests::common::fixtures::{at, interval, monday, sample_appointment, test_policy};

use AppointmentStatus::*;

fn appointment_at_ten(status: AppointmentStatus) -> crate::models::appointment::Appointment {
    sample_appointment("appt-1", "barber-1", monday(), interval((10, 0), (10, 45)), status)
}

#[test]
fn test_customer_cancels_well_ahead() {
    let appointment = appointment_at_ten(Confirmed);

    let result = can_transition(
        &appointment,
        Transition::To(Cancelled),
        ActorRole::Customer,
        at(monday(), 7, 59),
        &test_policy(),
    );

    assert!(result.is_ok());
}

#[test]
fn test_customer_cancellation_inside_cutoff_is_rejected() {
    let appointment = appointment_at_ten(Confirmed);

    let result = can_transition(
        &appointment,
        Transition::To(Cancelled),
        ActorRole::Customer,
        at(monday(), 9, 0),
        &test_policy(),
    );

    assert_eq!(
        result,
        Err(SchedulingError::InvalidStateTransition(
            "Appointment cannot be cancelled at this time".to_string()
        ))
    );
}

#[test]
fn test_cancellation_exactly_at_cutoff_is_rejected() {
    let appointment = appointment_at_ten(Pending);

    let result = can_transition(
        &appointment,
        Transition::To(Cancelled),
        ActorRole::Customer,
        at(monday(), 8, 0),
        &test_policy(),
    );

    assert!(matches!(
        result,
        Err(SchedulingError::InvalidStateTransition(_))
    ));
}

#[test]
fn test_staff_cancel_inside_cutoff() {
    let appointment = appointment_at_ten(Confirmed);

    for actor in [ActorRole::Provider, ActorRole::Admin] {
        let result = can_transition(
            &appointment,
            Transition::To(Cancelled),
            actor,
            at(monday(), 9, 0),
            &test_policy(),
        );
        assert!(result.is_ok(), "{} should cancel", actor);
    }
}

#[test]
fn test_terminal_states_reject_everything() {
    let requests = [
        Transition::To(Pending),
        Transition::To(Confirmed),
        Transition::To(InProgress),
        Transition::To(Completed),
        Transition::To(Cancelled),
        Transition::To(NoShow),
        Transition::Reschedule,
    ];

    for status in [Completed, Cancelled] {
        let appointment = appointment_at_ten(status);
        for request in requests {
            for actor in [ActorRole::Customer, ActorRole::Provider, ActorRole::Admin] {
                let result = can_transition(
                    &appointment,
                    request,
                    actor,
                    at(monday(), 6, 0),
                    &test_policy(),
                );
                assert_eq!(result, Err(SchedulingError::TerminalStateViolation(status)));
            }
        }
    }
}

#[test]
fn test_provider_walks_happy_path() {
    let policy = test_policy();
    let now = at(monday(), 10, 0);
    let mut appointment = appointment_at_ten(Pending);

    for next in [Confirmed, InProgress, Completed] {
        can_transition(&appointment, Transition::To(next), ActorRole::Provider, now, &policy)
            .unwrap();
        appointment.apply_status(next, ActorRole::Provider, None, Utc::now());
    }

    assert_eq!(appointment.status, Completed);
}

#[test]
fn test_pending_can_start_without_confirmation() {
    let appointment = appointment_at_ten(Pending);

    let result = can_transition(
        &appointment,
        Transition::To(InProgress),
        ActorRole::Admin,
        at(monday(), 10, 0),
        &test_policy(),
    );

    assert!(result.is_ok());
}

#[test]
fn test_customer_cannot_drive_service_states() {
    let appointment = appointment_at_ten(Pending);

    for target in [Confirmed, InProgress, Completed, NoShow] {
        let result = can_transition(
            &appointment,
            Transition::To(target),
            ActorRole::Customer,
            at(monday(), 6, 0),
            &test_policy(),
        );
        assert!(
            matches!(result, Err(SchedulingError::InvalidStateTransition(_))),
            "customer reached {}",
            target
        );
    }
}

#[test]
fn test_completion_requires_in_progress() {
    let appointment = appointment_at_ten(Confirmed);

    let result = can_transition(
        &appointment,
        Transition::To(Completed),
        ActorRole::Provider,
        at(monday(), 10, 0),
        &test_policy(),
    );

    assert!(matches!(
        result,
        Err(SchedulingError::InvalidStateTransition(_))
    ));
}

#[test]
fn test_no_show_accepts_nothing_further() {
    let appointment = appointment_at_ten(NoShow);

    for target in [Pending, Confirmed, InProgress, Completed, Cancelled] {
        let result = can_transition(
            &appointment,
            Transition::To(target),
            ActorRole::Admin,
            at(monday(), 11, 0),
            &test_policy(),
        );
        assert!(matches!(
            result,
            Err(SchedulingError::InvalidStateTransition(_))
        ));
    }
}

#[test]
fn test_reschedule_respects_longer_cutoff() {
    let appointment = appointment_at_ten(Confirmed);
    let policy = test_policy();

    assert!(can_transition(
        &appointment,
        Transition::Reschedule,
        ActorRole::Customer,
        at(monday(), 5, 59),
        &policy,
    )
    .is_ok());

    assert_eq!(
        can_transition(
            &appointment,
            Transition::Reschedule,
            ActorRole::Customer,
            at(monday(), 7, 0),
            &policy,
        ),
        Err(SchedulingError::InvalidStateTransition(
            "Appointment cannot be rescheduled at this time".to_string()
        ))
    );
}

#[test]
fn test_staff_cannot_reschedule() {
    let appointment = appointment_at_ten(Confirmed);

    let result = can_transition(
        &appointment,
        Transition::Reschedule,
        ActorRole::Provider,
        at(monday(), 5, 0),
        &test_policy(),
    );

    assert!(matches!(
        result,
        Err(SchedulingError::InvalidStateTransition(_))
    ));
}

#[test]
fn test_customer_cannot_cancel_once_started() {
    let appointment = appointment_at_ten(InProgress);

    let result = can_transition(
        &appointment,
        Transition::To(Cancelled),
        ActorRole::Customer,
        at(monday(), 10, 5),
        &test_policy(),
    );

    assert!(result.is_err());
}

#[test]
fn test_cutoff_beyond_calendar_range_rejects_without_panicking() {
    let appointment = appointment_at_ten(Confirmed);
    let policy = SchedulingPolicy {
        cancellation_cutoff: Duration::days(365 * 1_000_000),
        reschedule_cutoff: Duration::days(365 * 1_000_000),
        ..test_policy()
    };

    for requested in [Transition::To(Cancelled), Transition::Reschedule] {
        let result = can_transition(
            &appointment,
            requested,
            ActorRole::Customer,
            at(monday(), 7, 0),
            &policy,
        );
        assert!(
            matches!(result, Err(SchedulingError::InvalidStateTransition(_))),
            "{:?}",
            requested
        );
    }
}
