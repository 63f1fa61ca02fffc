use crate::config::FcmConfig;
use crate::domain::push::{FailureCode, PushMessage};
use crate::services::notification::provider::{PushError, PushProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Firebase Cloud Messaging client for the HTTP v1 API.
#[derive(Clone)]
pub struct FcmPushProvider {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl std::fmt::Debug for FcmPushProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmPushProvider").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

impl FcmPushProvider {
    /// Builds a client for `project_id` authenticated with a bearer `access_token`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &FcmConfig, project_id: &str, access_token: String) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs)).build()?;
        let endpoint = format!("{}/v1/projects/{project_id}/messages:send", config.base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint, access_token })
    }
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&SendRequest { message })
            .send()
            .await
            .map_err(|e| PushError::new(FailureCode::Unavailable, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PushError::new(FailureCode::Unavailable, e.to_string()))?;

        if status.is_success() {
            return Ok(accepted_message_id(&body));
        }

        Err(parse_error(status, &body))
    }
}

/// Message id of a send FCM accepted. A 2xx means the message is out, so an unreadable
/// body still counts as delivered.
fn accepted_message_id(body: &str) -> String {
    match serde_json::from_str::<SendResponse>(body) {
        Ok(sent) => sent.name,
        Err(e) => {
            tracing::warn!(error = %e, "FCM accepted the message but returned an unreadable body");
            format!("unknown/{}", uuid::Uuid::new_v4())
        }
    }
}

/// Extracts the FCM error code from an error response.
///
/// The `FcmError` detail wins. Without one, only transient HTTP statuses map to known codes;
/// everything else keeps the RPC status or `HTTP_<n>` so it never invalidates a token.
fn parse_error(status: StatusCode, body: &str) -> PushError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let detail_code = envelope
        .as_ref()
        .and_then(|e| e.error.details.iter().find_map(|d| d.error_code.clone()));
    let detail = envelope.as_ref().map_or_else(|| body.to_string(), |e| e.error.message.clone());

    let code = match detail_code {
        Some(code) => FailureCode::from(code),
        None => match status {
            StatusCode::TOO_MANY_REQUESTS => FailureCode::QuotaExceeded,
            StatusCode::INTERNAL_SERVER_ERROR => FailureCode::Internal,
            StatusCode::SERVICE_UNAVAILABLE => FailureCode::Unavailable,
            _ => envelope
                .and_then(|e| e.error.status)
                .map_or_else(|| FailureCode::Other(format!("HTTP_{}", status.as_u16())), rpc_status_code),
        },
    };

    PushError::new(code, detail)
}

/// Token-level codes are only trusted from an `FcmError` detail, never from the RPC status.
fn rpc_status_code(rpc_status: String) -> FailureCode {
    match FailureCode::from(rpc_status) {
        code @ (FailureCode::Unregistered | FailureCode::InvalidArgument) => FailureCode::Other(code.to_string()),
        code => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::{Decision, classify};

    #[test]
    fn test_detail_error_code_wins() {
        let body = r#"{
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [
                    {"@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError", "errorCode": "UNREGISTERED"}
                ]
            }
        }"#;

        let err = parse_error(StatusCode::NOT_FOUND, body);
        assert_eq!(err.code, FailureCode::Unregistered);
        assert_eq!(err.detail, "Requested entity was not found.");
    }

    #[test]
    fn test_sender_mismatch_detail() {
        let body = r#"{"error":{"code":403,"message":"SenderId mismatch","status":"PERMISSION_DENIED",
            "details":[{"@type":"type.googleapis.com/google.firebase.fcm.v1.FcmError","errorCode":"SENDER_ID_MISMATCH"}]}}"#;

        assert_eq!(parse_error(StatusCode::FORBIDDEN, body).code, FailureCode::SenderIdMismatch);
    }

    #[test]
    fn test_falls_back_to_http_status() {
        assert_eq!(parse_error(StatusCode::SERVICE_UNAVAILABLE, "").code, FailureCode::Unavailable);
        assert_eq!(parse_error(StatusCode::TOO_MANY_REQUESTS, "{}").code, FailureCode::QuotaExceeded);
    }

    #[test]
    fn test_unmapped_status_keeps_provider_status() {
        let body = r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#;
        assert_eq!(parse_error(StatusCode::UNAUTHORIZED, body).code, FailureCode::Other("UNAUTHENTICATED".to_string()));
        assert_eq!(parse_error(StatusCode::IM_A_TEAPOT, "nope").code, FailureCode::Other("HTTP_418".to_string()));
    }

    #[test]
    fn test_bare_client_errors_do_not_invalidate() {
        let not_found = parse_error(StatusCode::NOT_FOUND, "<html>Not Found</html>");
        assert_eq!(not_found.code, FailureCode::Other("HTTP_404".to_string()));
        assert_eq!(classify(&not_found.code), Decision::StopOnly);

        let bad_request = parse_error(StatusCode::BAD_REQUEST, "");
        assert_eq!(bad_request.code, FailureCode::Other("HTTP_400".to_string()));
        assert_eq!(classify(&bad_request.code), Decision::StopOnly);

        let body = r#"{"error":{"code":404,"message":"Not found","status":"NOT_FOUND"}}"#;
        assert_eq!(parse_error(StatusCode::NOT_FOUND, body).code, FailureCode::Other("NOT_FOUND".to_string()));

        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload received.","status":"INVALID_ARGUMENT"}}"#;
        let err = parse_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, FailureCode::Other("INVALID_ARGUMENT".to_string()));
        assert_eq!(classify(&err.code), Decision::StopOnly);
    }

    #[test]
    fn test_accepted_send_with_unreadable_body() {
        assert_eq!(accepted_message_id(r#"{"name":"projects/demo/messages/1"}"#), "projects/demo/messages/1");
        assert!(accepted_message_id("ok").starts_with("unknown/"));
    }

    #[test]
    fn test_request_body_wraps_message() {
        let message = PushMessage::new("tok", "t", "b");
        let json = serde_json::to_value(SendRequest { message: &message }).unwrap();
        assert_eq!(json["message"]["token"], "tok");
    }

    #[test]
    fn test_endpoint_includes_project() {
        let config = FcmConfig {
            project_id: None,
            access_token: None,
            base_url: "https://fcm.example.com/".to_string(),
            request_timeout_secs: 1,
        };
        let provider = FcmPushProvider::new(&config, "demo", "secret".to_string()).unwrap();
        assert_eq!(provider.endpoint, "https://fcm.example.com/v1/projects/demo/messages:send");
    }
}
