//! Record relay: forwards client-originated actions to the
//! system-of-record over HTTP and reports the outcome to the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use validator::Validate;

use sosrelay_core::AppResult;
use sosrelay_core::config::RelayConfig;
use sosrelay_core::error::{AppError, ErrorKind};
use sosrelay_core::types::IncidentId;

use crate::metrics::{EngineMetrics, ingress};

use super::de;

const CREATE_SOS_PATH: &str = "/api/create-sos/";
const UPDATE_LOCATION_PATH: &str = "/api/update-location/";

/// Answer sent back as `create_sos_response` / `update_location_response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Whether the system-of-record accepted the request.
    pub success: bool,
    /// Response body on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Upstream HTTP status on failure, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl RelayResponse {
    /// A successful response carrying the upstream body.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status_code: None,
        }
    }

    /// A failed response.
    pub fn failure(error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            status_code,
        }
    }
}

/// Validated `create_sos` request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSosRequest {
    /// Reporter name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Incident category code.
    #[serde(default)]
    pub sos_type: i32,
    /// Latitude at creation.
    #[validate(range(min = -90.0, max = 90.0))]
    pub initial_latitude: f64,
    /// Longitude at creation.
    #[validate(range(min = -180.0, max = 180.0))]
    pub initial_longitude: f64,
}

/// Validated `update_location` request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    /// Incident the location belongs to.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_request: IncidentId,
    /// Latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

fn parse_request<T>(fields: Map<String, Value>, required: &[&str]) -> AppResult<T>
where
    T: serde::de::DeserializeOwned + Validate,
{
    if let Some(missing) = required.iter().find(|f| !fields.contains_key(**f)) {
        return Err(AppError::validation(format!(
            "Missing required field: {missing}"
        )));
    }

    let request: T = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        AppError::with_source(ErrorKind::Validation, format!("Invalid request: {e}"), e)
    })?;
    request.validate()?;
    Ok(request)
}

impl CreateSosRequest {
    /// Builds a request from raw frame fields.
    pub fn from_fields(fields: Map<String, Value>) -> AppResult<Self> {
        parse_request(fields, &["name", "initial_latitude", "initial_longitude"])
    }
}

impl UpdateLocationRequest {
    /// Builds a request from raw frame fields.
    pub fn from_fields(fields: Map<String, Value>) -> AppResult<Self> {
        parse_request(fields, &["sos_request", "latitude", "longitude"])
    }
}

/// Raw upstream answer.
#[derive(Debug, Clone)]
pub struct RelayReply {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body, or the raw text as a string.
    pub body: Value,
}

/// Client for the system-of-record's write API.
#[async_trait]
pub trait RecordClient: Send + Sync + fmt::Debug {
    /// Creates an incident.
    async fn create_sos(&self, request: &CreateSosRequest) -> AppResult<RelayReply>;

    /// Records an incident location.
    async fn update_location(&self, request: &UpdateLocationRequest) -> AppResult<RelayReply>;
}

/// Record client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordClient {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> AppResult<RelayReply> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_error)?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text));

        Ok(RelayReply { status, body })
    }
}

fn network_error(e: reqwest::Error) -> AppError {
    AppError::with_source(
        ErrorKind::ExternalService,
        format!("Network error: {e}"),
        e,
    )
}

#[async_trait]
impl RecordClient for HttpRecordClient {
    async fn create_sos(&self, request: &CreateSosRequest) -> AppResult<RelayReply> {
        self.post(CREATE_SOS_PATH, request).await
    }

    async fn update_location(&self, request: &UpdateLocationRequest) -> AppResult<RelayReply> {
        self.post(UPDATE_LOCATION_PATH, request).await
    }
}

/// Used when no system-of-record URL is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledRecordClient;

#[async_trait]
impl RecordClient for DisabledRecordClient {
    async fn create_sos(&self, _request: &CreateSosRequest) -> AppResult<RelayReply> {
        Err(AppError::service_unavailable("Record relay is not configured"))
    }

    async fn update_location(&self, _request: &UpdateLocationRequest) -> AppResult<RelayReply> {
        Err(AppError::service_unavailable("Record relay is not configured"))
    }
}

/// Builds the record client described by `config`.
pub fn record_client(config: &RelayConfig) -> AppResult<Arc<dyn RecordClient>> {
    match config.record_api_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Arc::new(HttpRecordClient::new(
            url,
            Duration::from_secs(config.timeout_seconds),
        )?)),
        _ => Ok(Arc::new(DisabledRecordClient)),
    }
}

/// Validates client requests, forwards them, and shapes the answer.
#[derive(Debug, Clone)]
pub struct RecordRelay {
    client: Arc<dyn RecordClient>,
    metrics: Arc<EngineMetrics>,
}

impl RecordRelay {
    /// Creates a relay over `client`.
    pub fn new(client: Arc<dyn RecordClient>, metrics: Arc<EngineMetrics>) -> Self {
        Self { client, metrics }
    }

    /// Relays a `create_sos` frame.
    pub async fn create_sos(&self, fields: Map<String, Value>) -> RelayResponse {
        let outcome = match CreateSosRequest::from_fields(fields) {
            Ok(request) => self.client.create_sos(&request).await,
            Err(e) => Err(e),
        };
        self.respond("create_sos", outcome)
    }

    /// Relays an `update_location` frame.
    pub async fn update_location(&self, fields: Map<String, Value>) -> RelayResponse {
        let outcome = match UpdateLocationRequest::from_fields(fields) {
            Ok(request) => self.client.update_location(&request).await,
            Err(e) => Err(e),
        };
        self.respond("update_location", outcome)
    }

    fn respond(&self, action: &str, outcome: AppResult<RelayReply>) -> RelayResponse {
        let response = match outcome {
            Ok(reply) if (200..300).contains(&reply.status) => RelayResponse::success(reply.body),
            Ok(reply) => {
                let error = reply
                    .body
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!("API request failed with status {}", reply.status)
                    });
                RelayResponse::failure(error, Some(reply.status))
            }
            Err(e) => RelayResponse::failure(e.message, None),
        };

        ingress::record_relay(&self.metrics, response.success);
        if response.success {
            info!(action, "Relayed request accepted");
        } else {
            warn!(
                action,
                error = response.error.as_deref().unwrap_or_default(),
                status_code = response.status_code,
                "Relayed request failed"
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Debug)]
    struct StubClient {
        status: u16,
        body: Value,
        calls: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RecordClient for StubClient {
        async fn create_sos(&self, request: &CreateSosRequest) -> AppResult<RelayReply> {
            self.calls.lock().expect("lock").push(request.name.clone());
            Ok(RelayReply {
                status: self.status,
                body: self.body.clone(),
            })
        }

        async fn update_location(&self, request: &UpdateLocationRequest) -> AppResult<RelayReply> {
            self.calls
                .lock()
                .expect("lock")
                .push(request.sos_request.to_string());
            Ok(RelayReply {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn relay(client: Arc<dyn RecordClient>) -> RecordRelay {
        RecordRelay::new(client, Arc::new(EngineMetrics::new()))
    }

    #[tokio::test]
    async fn test_success_passes_body_through() {
        let stub = StubClient::new(201, json!({"id": 10, "room_id": "r-1"}));
        let response = relay(stub.clone())
            .create_sos(fields(json!({
                "name": "Asha",
                "initial_latitude": 28.6,
                "initial_longitude": 77.2
            })))
            .await;
        assert!(response.success);
        assert_eq!(response.data, Some(json!({"id": 10, "room_id": "r-1"})));
        assert_eq!(*stub.calls.lock().expect("lock"), vec!["Asha".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_field_never_calls_upstream() {
        let stub = StubClient::new(200, json!({}));
        let response = relay(stub.clone())
            .create_sos(fields(json!({"name": "Asha", "initial_latitude": 28.6})))
            .await;
        assert_eq!(
            response,
            RelayResponse::failure("Missing required field: initial_longitude", None)
        );
        assert!(stub.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_upstream_error_field_is_surfaced() {
        let stub = StubClient::new(400, json!({"error": "SOS request not found"}));
        let response = relay(stub)
            .update_location(fields(json!({
                "sos_request": "12",
                "latitude": 1.0,
                "longitude": 2.0
            })))
            .await;
        assert_eq!(
            response,
            RelayResponse::failure("SOS request not found", Some(400))
        );
    }

    #[tokio::test]
    async fn test_upstream_status_without_error_field() {
        let stub = StubClient::new(502, Value::String("Bad Gateway".to_string()));
        let response = relay(stub)
            .update_location(fields(json!({
                "sos_request": 12,
                "latitude": 1.0,
                "longitude": 2.0
            })))
            .await;
        assert_eq!(
            response.error.as_deref(),
            Some("API request failed with status 502")
        );
        assert_eq!(response.status_code, Some(502));
    }

    #[tokio::test]
    async fn test_unconfigured_relay() {
        let client = record_client(&RelayConfig::default()).expect("client");
        let response = relay(client)
            .create_sos(fields(json!({
                "name": "Asha",
                "initial_latitude": 28.6,
                "initial_longitude": 77.2
            })))
            .await;
        assert_eq!(
            response,
            RelayResponse::failure("Record relay is not configured", None)
        );
    }

    #[tokio::test]
    async fn test_network_error_message() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = HttpRecordClient::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client");
        let response = relay(Arc::new(client))
            .create_sos(fields(json!({
                "name": "Asha",
                "initial_latitude": 28.6,
                "initial_longitude": 77.2
            })))
            .await;
        assert!(!response.success);
        assert!(
            response
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Network error:"))
        );
    }
}
