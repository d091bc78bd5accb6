//! Integration tests for the system-of-record ingress endpoint.

mod helpers;

use http::StatusCode;
use serde_json::json;

use sosrelay_realtime::message::types::OutboundMessage;

use helpers::TestApp;

#[tokio::test]
async fn test_ingress_reports_rooms_and_deliveries() {
    let app = TestApp::new();
    let engine = app.state.realtime.clone();
    let (handle, mut rx) = engine.connections.register();
    engine
        .handle_inbound(&handle.id, r#"{"type":"join_sos_channel"}"#)
        .await;
    while rx.try_recv().is_ok() {}

    let response = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({
                "kind": "sos_created",
                "payload": {"sos_id": "12", "name": "Meera", "latitude": 12.97, "longitude": 77.59}
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["kind"], "incident_created");
    assert_eq!(response.body["data"]["rooms"], json!(["sos_channel"]));
    assert_eq!(response.body["data"]["deliveries"], 1);

    let envelope = rx.try_recv().expect("broadcast");
    assert!(matches!(envelope.data, OutboundMessage::NewSos { .. }));
}

#[tokio::test]
async fn test_invalid_event_is_rejected_without_broadcast() {
    let app = TestApp::new();
    let engine = app.state.realtime.clone();
    let (handle, mut rx) = engine.connections.register();
    engine
        .handle_inbound(&handle.id, r#"{"type":"join_sos_room","room_id":3}"#)
        .await;
    while rx.try_recv().is_ok() {}

    let response = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({
                "kind": "location_updated",
                "payload": {"sos_id": 3, "longitude": 77.1}
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(rx.try_recv().is_err());
    assert!(engine.history.replay("3").await.is_empty());
}

#[tokio::test]
async fn test_out_of_range_coordinates_are_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({
                "kind": "location_updated",
                "payload": {"sos_id": 3, "latitude": 123.0, "longitude": 77.1}
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body_is_structured_400() {
    let app = TestApp::new();

    let response = app
        .request_raw("POST", "/api/ingress/events", "{\"kind\": ".to_string())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert!(
        response.body["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Invalid JSON body"))
    );
}

#[tokio::test]
async fn test_unknown_kind_is_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({"kind": "incident_exploded", "payload": {}})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_metrics_count_ingress_outcomes() {
    let app = TestApp::new();

    app.request(
        "POST",
        "/api/ingress/events",
        Some(json!({
            "kind": "incident_resolved",
            "payload": {"sos_id": 4}
        })),
    )
    .await;
    app.request(
        "POST",
        "/api/ingress/events",
        Some(json!({"kind": "incident_resolved", "payload": {}})),
    )
    .await;

    let response = app.request("GET", "/api/metrics", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["metrics"]["ingress_accepted"], 1);
    assert_eq!(response.body["data"]["metrics"]["ingress_rejected"], 1);
}
