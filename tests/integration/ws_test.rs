//! Integration tests for WebSocket room joins, replay and live fan-out.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{TestApp, WsClient, eventually};

#[tokio::test]
async fn test_new_incident_then_replay_then_live() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut dispatcher = WsClient::connect(addr).await;
    dispatcher.send(json!({"type": "join_sos_channel"})).await;
    let joined = dispatcher.expect("room_joined").await;
    assert_eq!(joined["room"], "sos_channel");

    let created = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({
                "kind": "incident_created",
                "payload": {"sos_id": 1, "name": "Asha", "latitude": 28.7, "longitude": 77.1}
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);

    let new_sos = dispatcher.expect("new_sos").await;
    assert_eq!(new_sos["sos_id"], 1);
    assert_eq!(new_sos["room_id"], "1");

    let mut responder = WsClient::connect(addr).await;
    responder.send(json!({"type": "join_sos_room", "room_id": 1})).await;
    let joined = responder.expect("room_joined").await;
    assert_eq!(joined["room"], "sos_1");
    let replay = responder.expect("location_history").await;
    assert_eq!(replay["replay"], true);
    assert_eq!(replay["updates"].as_array().map(Vec::len), Some(0));

    app.request(
        "POST",
        "/api/ingress/events",
        Some(json!({
            "kind": "location_updated",
            "payload": {"sos_id": 1, "latitude": 28.71, "longitude": 77.11}
        })),
    )
    .await;

    let live = responder.expect("location_history").await;
    assert_eq!(live["replay"], false);
    assert_eq!(live["updates"][0]["latitude"], 28.71);

    let mut late = WsClient::connect(addr).await;
    late.send(json!({"type": "join_sos_room", "room_id": "1"})).await;
    late.expect("room_joined").await;
    let replay = late.expect("location_history").await;
    assert_eq!(replay["replay"], true);
    assert_eq!(replay["updates"].as_array().map(Vec::len), Some(1));
    assert_eq!(replay["updates"][0]["longitude"], 77.11);

    dispatcher.expect_silence().await;
}

#[tokio::test]
async fn test_malformed_join_reports_error_and_keeps_socket() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut client = WsClient::connect(addr).await;
    client.send(json!({"type": "join_sos_room"})).await;
    let error = client.expect("error").await;
    assert_eq!(error["code"], "VALIDATION");
    assert_eq!(error["message"], "Room ID is required");

    client.send_text("{not json").await;
    client.expect("error").await;

    client.send(json!({"type": "join_sos_room", "room_id": "7"})).await;
    client.expect("room_joined").await;
    client.expect("location_history").await;
}

#[tokio::test]
async fn test_officer_receives_unit_and_tracking_updates() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut officer = WsClient::connect(addr).await;
    officer
        .send(json!({"type": "join_officer_room", "unit_number": "PCR-12"}))
        .await;
    let joined = officer.expect("room_joined").await;
    assert_eq!(joined["room"], "unit_PCR-12");

    let mut tracker = WsClient::connect(addr).await;
    tracker
        .send(json!({"type": "join_location_tracking_channel"}))
        .await;
    tracker.expect("room_joined").await;

    let assigned = app
        .request(
            "POST",
            "/api/ingress/events",
            Some(json!({
                "kind": "officer_assigned",
                "payload": {"sos_id": 5, "unit_number": "PCR-12", "officer_name": "Ravi"}
            })),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK);
    let notice = officer.expect("officer_assigned").await;
    assert_eq!(notice["officer_name"], "Ravi");

    app.request(
        "POST",
        "/api/ingress/events",
        Some(json!({
            "kind": "location_updated",
            "payload": {"sos_id": 5, "latitude": 19.07, "longitude": 72.87}
        })),
    )
    .await;

    let unit_update = officer.expect("unit_location_update").await;
    assert_eq!(unit_update["sos_id"], 5);
    let tracking = tracker.expect("location_tracking_update").await;
    assert_eq!(tracking["unit_number"], "PCR-12");
}

#[tokio::test]
async fn test_disconnect_removes_memberships() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut client = WsClient::connect(addr).await;
    client.send(json!({"type": "join_sos_room", "room_id": "9"})).await;
    client.expect("room_joined").await;
    client.expect("location_history").await;
    assert_eq!(app.state.realtime.rooms.room_count(), 1);

    client.close().await;

    let engine = app.state.realtime.clone();
    eventually(|| engine.connections.connection_count() == 0).await;
    assert_eq!(engine.rooms.room_count(), 0);
}

#[tokio::test]
async fn test_sessions_endpoint_lists_roles_and_rooms() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut officer = WsClient::connect(addr).await;
    officer
        .send(json!({"type": "join_officer_room", "unit_number": 12}))
        .await;
    officer.expect("room_joined").await;

    let listed = app.request("GET", "/api/sessions", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let sessions = listed.body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["role"], "officer");
    assert_eq!(sessions[0]["unit_number"], "12");
    assert_eq!(sessions[0]["rooms"], json!(["unit_12"]));

    let id = sessions[0]["id"].as_str().unwrap_or_default().to_string();
    let one = app.request("GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["data"]["alive"], true);

    let unknown = app
        .request("GET", "/api/sessions/00000000-0000-4000-8000-000000000000", None)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["success"], false);

    let invalid = app.request("GET", "/api/sessions/not-a-uuid", None).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health/detailed", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["ws_connections"], 0);
    assert_eq!(response.body["data"]["relay_configured"], false);
}
