// libs/appointment-cell/tests/lifecycle_test.rs
use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentFee, AppointmentLocation, AppointmentStatus,
    AppointmentType, Priority,
};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;

fn fixture(status: AppointmentStatus, start: NaiveDateTime) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        farmer_id: Uuid::new_v4(),
        vet_id: Uuid::new_v4(),
        animal_id: Uuid::new_v4(),
        appointment_type: AppointmentType::Consultation,
        priority: Priority::Normal,
        scheduled_date: start.date(),
        scheduled_time: start.time(),
        duration_minutes: 30,
        symptoms: "Loss of appetite".to_string(),
        description: None,
        location: AppointmentLocation::default(),
        images: vec![],
        diagnosis: None,
        treatment: None,
        prescription: None,
        vet_notes: None,
        follow_up_required: false,
        follow_up_date: None,
        status,
        cancelled_by: None,
        cancellation_reason: None,
        cancelled_at: None,
        fee: AppointmentFee::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 6, 3)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
}

// ==============================================================================
// TRANSITION TABLE
// ==============================================================================

#[test]
fn happy_path_transitions_are_allowed() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Accepted)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(AppointmentStatus::Accepted, AppointmentStatus::InProgress)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(AppointmentStatus::InProgress, AppointmentStatus::Completed)
        .is_ok());
}

#[test]
fn cancellation_is_reachable_from_every_active_state() {
    let lifecycle = AppointmentLifecycleService::new();

    for from in [
        AppointmentStatus::Pending,
        AppointmentStatus::Accepted,
        AppointmentStatus::InProgress,
    ] {
        assert!(lifecycle
            .validate_status_transition(from, AppointmentStatus::Cancelled)
            .is_ok());
    }
}

#[test]
fn skipping_states_is_rejected() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_matches!(
        lifecycle.validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::InProgress),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Completed),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(AppointmentStatus::Accepted, AppointmentStatus::Completed),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[test]
fn moving_backwards_is_rejected() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_matches!(
        lifecycle.validate_status_transition(AppointmentStatus::Accepted, AppointmentStatus::Pending),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(AppointmentStatus::InProgress, AppointmentStatus::Accepted),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[test]
fn terminal_states_reject_every_transition() {
    let lifecycle = AppointmentLifecycleService::new();
    let all = [
        AppointmentStatus::Pending,
        AppointmentStatus::Accepted,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
        assert!(lifecycle.valid_transitions(terminal).is_empty());
        for to in all {
            assert_matches!(
                lifecycle.validate_status_transition(terminal, to),
                Err(AppointmentError::InvalidStatusTransition { .. })
            );
        }
    }
}

// ==============================================================================
// CANCELLATION ELIGIBILITY
// ==============================================================================

#[test]
fn cancellation_allowed_outside_lead_time() {
    let lifecycle = AppointmentLifecycleService::new();
    let appointment = fixture(AppointmentStatus::Pending, at(14));
    let now = at(9);

    assert!(lifecycle
        .can_be_cancelled(&appointment, now, Duration::hours(2))
        .is_ok());
}

#[test]
fn cancellation_rejected_inside_lead_time() {
    let lifecycle = AppointmentLifecycleService::new();
    let appointment = fixture(AppointmentStatus::Accepted, at(10));
    let now = at(9);

    assert_matches!(
        lifecycle.can_be_cancelled(&appointment, now, Duration::hours(2)),
        Err(AppointmentError::CancellationNotAllowed)
    );
}

#[test]
fn cancellation_rejected_exactly_at_lead_boundary() {
    let lifecycle = AppointmentLifecycleService::new();
    let appointment = fixture(AppointmentStatus::Pending, at(11));
    let now = at(9);

    assert_matches!(
        lifecycle.can_be_cancelled(&appointment, now, Duration::hours(2)),
        Err(AppointmentError::CancellationNotAllowed)
    );
}

#[test]
fn cancellation_rejected_for_terminal_states() {
    let lifecycle = AppointmentLifecycleService::new();
    let now = at(9);

    for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
        // Far in the future; the status alone disqualifies it
        let appointment = fixture(status, at(18));
        assert_matches!(
            lifecycle.can_be_cancelled(&appointment, now, Duration::hours(2)),
            Err(AppointmentError::CancellationNotAllowed)
        );
    }
}

#[test]
fn zero_lead_time_only_requires_future_start() {
    let lifecycle = AppointmentLifecycleService::new();
    let appointment = fixture(AppointmentStatus::Pending, at(10));

    assert!(lifecycle
        .can_be_cancelled(&appointment, at(9), Duration::zero())
        .is_ok());
    assert_matches!(
        lifecycle.can_be_cancelled(&appointment, at(10), Duration::zero()),
        Err(AppointmentError::CancellationNotAllowed)
    );
}
