//! Structured tool error helpers.
//!
//! Platform and credential failures become MCP protocol errors whose `data`
//! carries a machine-readable payload. Pre-flight validation failures are not
//! errors at this level: they are returned as ordinary results with an
//! `error` field (see [`error_result`]) so the caller can fix its arguments.

use std::fmt::Display;

use chrono::Utc;
use dssmcp_api::{ApiError, CredentialError};
use rmcp::model::ErrorData;
use serde_json::{Value, json};

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("dssmcp-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_request_error(error_code: &str, category: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_request(
        message.clone(),
        Some(build_error_data(error_code, category, &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn upstream_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "upstream", &message, context, retryable, suggested_action)),
    )
}

pub fn internal_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "internal", &message, context, false, suggested_action)),
    )
}

/// Translate a client failure raised while running `operation`.
pub fn api_error(operation: &str, error: &ApiError) -> ErrorData {
    let message = error.to_string();
    match error {
        ApiError::MissingCredential(credential) => invalid_request_error(
            "DSS_MISSING_CREDENTIAL",
            "authentication",
            message,
            json!({"operation": operation}),
            match credential {
                CredentialError::NotConfigured => "Configure an API key for the stdio transport (DSS_API_KEY).",
                _ => "Send the platform API key as 'Authorization: Bearer <api key>' with each MCP request.",
            },
        ),
        ApiError::AuthenticationRejected { .. } => invalid_request_error(
            "DSS_AUTHENTICATION_REJECTED",
            "authentication",
            message,
            json!({"operation": operation, "status": 401}),
            "Check that the API key is valid and has not been revoked.",
        ),
        ApiError::PermissionDenied { .. } => invalid_request_error(
            "DSS_PERMISSION_DENIED",
            "permission",
            message,
            json!({"operation": operation, "status": 403}),
            "The calling user lacks the rights for this operation; use get_auth_info to check admin status and groups.",
        ),
        ApiError::NotFound { .. } => not_found_error(
            "DSS_NOT_FOUND",
            message,
            json!({"operation": operation, "status": 404}),
            "Check the project key and object names, for example with list_projects or list_project_datasets.",
        ),
        ApiError::Remote { status, error_type, .. } => upstream_error(
            "DSS_REMOTE_ERROR",
            message,
            json!({"operation": operation, "status": status, "error_type": error_type}),
            error.is_retryable(),
            "Read the platform message, correct the arguments and retry.",
        ),
        ApiError::BackendUnreachable { url, .. } => upstream_error(
            "DSS_UNREACHABLE",
            message,
            json!({"operation": operation, "url": url}),
            true,
            "Check that the platform is running and reachable from the server.",
        ),
        ApiError::BackgroundTaskFailed { job_id, .. } => upstream_error(
            "DSS_BACKGROUND_TASK_FAILED",
            message,
            json!({"operation": operation, "job_id": job_id}),
            false,
            "Inspect the task with list_futures or the platform logs.",
        ),
        ApiError::Decode { endpoint, .. } => upstream_error(
            "DSS_UNEXPECTED_RESPONSE",
            message,
            json!({"operation": operation, "endpoint": endpoint}),
            false,
            "The platform answered with an unexpected shape; check the platform version.",
        ),
        ApiError::InvalidConfiguration(_) => internal_error(
            "DSSMCP_CONFIGURATION",
            message,
            json!({"operation": operation}),
            "Fix the server configuration and restart it.",
        ),
    }
}

/// `map_err` adapter for client calls made by `operation`.
pub fn remote(operation: &'static str) -> impl Fn(ApiError) -> ErrorData {
    move |error| api_error(operation, &error)
}

/// `map_err` adapter for platform payloads that do not match their projection.
pub fn decode(operation: &'static str) -> impl Fn(serde_json::Error) -> ErrorData {
    move |error| {
        upstream_error(
            "DSS_UNEXPECTED_RESPONSE",
            format!("unexpected response shape: {error}"),
            json!({"operation": operation}),
            false,
            "The platform answered with an unexpected shape; check the platform version.",
        )
    }
}

/// Ordinary tool result reporting a validation failure.
pub fn error_result(message: impl Display) -> Value {
    json!({"error": message.to_string()})
}
