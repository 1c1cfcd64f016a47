// libs/vet-cell/tests/availability_test.rs
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use vet_cell::models::{DayHours, VetError, WeeklyHours};
use vet_cell::services::availability::{enumerate_slots, AvailabilityService};

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn test_config(store_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: store_url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        cancellation_lead_hours: 2,
    }
}

fn weekday_vet_json(vet_id: &Uuid, is_verified: bool, is_active: bool) -> serde_json::Value {
    json!({
        "id": vet_id,
        "name": "Dr. Test Vet",
        "specialty": "Large Animal Medicine",
        "phone_no": null,
        "consultation_fee": 1500.0,
        "travel_fee": 500.0,
        "is_verified": is_verified,
        "is_active": is_active,
        "available_hours": {
            "monday": { "available": true, "start": "09:00", "end": "17:00" },
            "tuesday": { "available": true, "start": "09:00", "end": "17:00" },
            "wednesday": { "available": true, "start": "09:00", "end": "17:00" },
            "thursday": { "available": true, "start": "09:00", "end": "17:00" },
            "friday": { "available": true, "start": "09:00", "end": "17:00" },
            "saturday": { "available": false }
        }
    })
}

// A guaranteed Monday / Saturday without hardcoding weekday math
fn a_monday() -> NaiveDate {
    NaiveDate::from_isoywd_opt(2030, 10, Weekday::Mon).unwrap()
}

fn a_saturday() -> NaiveDate {
    NaiveDate::from_isoywd_opt(2030, 10, Weekday::Sat).unwrap()
}

// ==============================================================================
// SLOT ENUMERATION
// ==============================================================================

#[test]
fn full_day_window_yields_sixteen_slots() {
    let slots = enumerate_slots(hm(9, 0), hm(17, 0));

    assert_eq!(slots.len(), 16);
    assert_eq!(slots[0], hm(9, 0));
    assert_eq!(slots[15], hm(16, 30));
}

#[test]
fn end_boundary_is_exclusive() {
    let slots = enumerate_slots(hm(9, 0), hm(10, 0));

    assert_eq!(slots, vec![hm(9, 0), hm(9, 30)]);
}

#[test]
fn empty_window_yields_no_slots() {
    assert!(enumerate_slots(hm(9, 0), hm(9, 0)).is_empty());
}

#[test]
fn late_window_does_not_wrap_past_midnight() {
    let slots = enumerate_slots(hm(23, 0), hm(23, 59));

    assert_eq!(slots, vec![hm(23, 0), hm(23, 30)]);
}

// ==============================================================================
// WINDOW PARSING
// ==============================================================================

#[test]
fn window_parses_hm_times() {
    let day = DayHours {
        available: true,
        start: Some("10:00".to_string()),
        end: Some("14:30".to_string()),
    };

    assert_eq!(day.window(), (hm(10, 0), hm(14, 30)));
}

#[test]
fn malformed_start_falls_back_to_default() {
    let day = DayHours {
        available: true,
        start: Some("9am".to_string()),
        end: Some("17:00".to_string()),
    };

    assert_eq!(day.window(), (hm(9, 0), hm(17, 0)));
}

#[test]
fn missing_times_fall_back_to_default_window() {
    let day = DayHours {
        available: true,
        start: None,
        end: None,
    };

    assert_eq!(day.window(), (hm(9, 0), hm(17, 0)));
}

#[test]
fn inverted_window_falls_back_to_default() {
    let day = DayHours {
        available: true,
        start: Some("18:00".to_string()),
        end: Some("09:00".to_string()),
    };

    assert_eq!(day.window(), (hm(9, 0), hm(17, 0)));
}

#[test]
fn weekly_hours_maps_weekday_names() {
    let hours: WeeklyHours = serde_json::from_value(json!({
        "monday": { "available": true, "start": "08:00", "end": "12:00" }
    }))
    .unwrap();

    let monday = hours.for_weekday(Weekday::Mon).unwrap();
    assert!(monday.available);
    assert_eq!(monday.window(), (hm(8, 0), hm(12, 0)));
    assert!(hours.for_weekday(Weekday::Tue).is_none());
}

// ==============================================================================
// AVAILABILITY SERVICE
// ==============================================================================

#[tokio::test]
async fn open_day_returns_all_slots() {
    let mock_server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([weekday_vet_json(&vet_id, true, true)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(&mock_server.uri()));
    let slots = service
        .available_slots(vet_id, a_monday(), "test_token")
        .await
        .unwrap();

    assert_eq!(slots.len(), 16);
    assert_eq!(slots.first().map(String::as_str), Some("09:00"));
    assert_eq!(slots.last().map(String::as_str), Some("16:30"));
}

#[tokio::test]
async fn active_booking_blocks_its_slot() {
    let mock_server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([weekday_vet_json(&vet_id, true, true)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "scheduled_time": "09:30:00", "status": "pending" }
        ])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(&mock_server.uri()));
    let slots = service
        .available_slots(vet_id, a_monday(), "test_token")
        .await
        .unwrap();

    assert_eq!(slots.len(), 15);
    assert!(!slots.contains(&"09:30".to_string()));
}

#[tokio::test]
async fn cancelled_booking_frees_its_slot() {
    let mock_server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([weekday_vet_json(&vet_id, true, true)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "scheduled_time": "09:30:00", "status": "cancelled" }
        ])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(&mock_server.uri()));
    let slots = service
        .available_slots(vet_id, a_monday(), "test_token")
        .await
        .unwrap();

    assert_eq!(slots.len(), 16);
    assert!(slots.contains(&"09:30".to_string()));
}

#[tokio::test]
async fn closed_day_returns_no_slots() {
    let mock_server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([weekday_vet_json(&vet_id, true, true)])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(&mock_server.uri()));
    let slots = service
        .available_slots(vet_id, a_saturday(), "test_token")
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn inactive_vet_is_not_found() {
    let mock_server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([weekday_vet_json(&vet_id, true, false)])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(&mock_server.uri()));
    let result = service.available_slots(vet_id, a_monday(), "test_token").await;

    assert!(matches!(result, Err(VetError::NotFound)));
}
