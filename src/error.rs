//! Application error taxonomy and HTTP mapping.
//!
//! Every domain failure is raised as an [`AppError`] and converted into a stable
//! status code plus a machine-readable error code at the HTTP boundary:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Click not found", "details": { ... } } }
//! ```
//!
//! Store outages ([`AppError::TransientStore`]) and unexpected failures
//! ([`AppError::Internal`]) are logged with their full context and returned with a
//! generic message only.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing input. Recoverable by correcting the request.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Unknown partner, product or tracking id.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The entity exists but has been disabled.
    #[error("{message}")]
    InactiveEntity { message: String, details: Value },

    /// The click already owns a conversion.
    #[error("{message}")]
    AlreadyConverted { message: String, details: Value },

    /// The click is older than the attribution window.
    #[error("{message}")]
    AttributionWindowExpired { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// Store unreachable or timed out. Safe for the caller to retry.
    #[error("{message}")]
    TransientStore { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn inactive(message: impl Into<String>, details: Value) -> Self {
        Self::InactiveEntity {
            message: message.into(),
            details,
        }
    }

    pub fn already_converted(message: impl Into<String>, details: Value) -> Self {
        Self::AlreadyConverted {
            message: message.into(),
            details,
        }
    }

    pub fn window_expired(message: impl Into<String>, details: Value) -> Self {
        Self::AttributionWindowExpired {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn transient(message: impl Into<String>, details: Value) -> Self {
        Self::TransientStore {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Builds a validation error listing every offending field.
    ///
    /// `fields` maps the public (camelCase) field name to its problems.
    pub fn invalid_fields(fields: Map<String, Value>) -> Self {
        Self::bad_request("Invalid request parameters", json!({ "fields": fields }))
    }

    /// Stable HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InactiveEntity { .. } => StatusCode::GONE,
            AppError::AlreadyConverted { .. } => StatusCode::NOT_FOUND,
            AppError::AttributionWindowExpired { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::TransientStore { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::InactiveEntity { .. } => "inactive_entity",
            AppError::AlreadyConverted { .. } => "already_converted",
            AppError::AttributionWindowExpired { .. } => "attribution_window_expired",
            AppError::Conflict { .. } => "conflict",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::TransientStore { .. } => "service_unavailable",
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// Converts the error into its public payload, hiding internals.
    pub fn to_error_info(&self) -> ErrorInfo {
        let code = self.code();
        match self {
            AppError::TransientStore { .. } => ErrorInfo {
                code,
                message: "Service temporarily unavailable, please retry".to_string(),
                details: json!({}),
            },
            AppError::Internal { .. } => ErrorInfo {
                code,
                message: "Internal server error".to_string(),
                details: json!({}),
            },
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::InactiveEntity { message, details }
            | AppError::AlreadyConverted { message, details }
            | AppError::AttributionWindowExpired { message, details }
            | AppError::Conflict { message, details }
            | AppError::Unauthorized { message, details } => ErrorInfo {
                code,
                message: message.clone(),
                details: details.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::TransientStore { message, details } => {
                tracing::error!(%message, %details, "store unavailable");
            }
            AppError::Internal { message, details } => {
                tracing::error!(%message, %details, "internal error");
            }
            _ => {}
        }

        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}

/// Collects per-field validation problems so one response can list them all.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: Map<String, Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem for the public (camelCase) field name.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_fields(self.fields))
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                return AppError::transient("Database unavailable", json!({ "reason": e.to_string() }));
            }
            sqlx::Error::Tls(_) => {
                return AppError::transient("Database unavailable", json!({ "reason": e.to_string() }));
            }
            _ => {}
        }

        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        AppError::internal("Database error", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Map::new();

        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|m| Value::String(m.to_string()))
                        .unwrap_or_else(|| Value::String(err.code.to_string()))
                })
                .collect();
            fields.insert(camel_case(&field), Value::Array(messages));
        }

        AppError::invalid_fields(fields)
    }
}

/// `partner_id` → `partnerId`, matching the JSON field names clients send.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(
            "Invalid JSON body",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(
            "Invalid query parameters",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x", json!({})).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::already_converted("x", json!({})).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::window_expired("x", json!({})).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::inactive("x", json!({})).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            AppError::transient("x", json!({})).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::internal("Database error", json!({ "reason": "relation missing" }));
        let info = err.to_error_info();

        assert_eq!(info.code, "internal_error");
        assert_eq!(info.message, "Internal server error");
        assert_eq!(info.details, json!({}));
    }

    #[test]
    fn test_transient_details_are_hidden() {
        let info = AppError::transient("Database unavailable", json!({ "reason": "timeout" }))
            .to_error_info();

        assert_eq!(info.code, "service_unavailable");
        assert_eq!(info.details, json!({}));
    }

    #[test]
    fn test_domain_details_are_kept() {
        let info = AppError::not_found("Click not found", json!({ "trackingId": "abc" }))
            .to_error_info();

        assert_eq!(info.message, "Click not found");
        assert_eq!(info.details["trackingId"], "abc");
    }

    #[test]
    fn test_field_errors_collects_every_field() {
        let mut errors = FieldErrors::new();
        errors.add("partnerId", "is required");
        errors.add("productId", "is required");
        errors.add("partnerId", "must be a well-formed identifier");

        let err = errors.into_result().unwrap_err();
        let info = err.to_error_info();

        assert_eq!(info.code, "validation_error");
        assert_eq!(info.details["fields"]["partnerId"].as_array().unwrap().len(), 2);
        assert!(info.details["fields"]["productId"].is_array());
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validator_fields_are_camel_case() {
        assert_eq!(camel_case("partner_id"), "partnerId");
        assert_eq!(camel_case("utm_source"), "utmSource");
        assert_eq!(camel_case("limit"), "limit");
    }

    #[test]
    fn test_validation_errors_keep_every_field() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "partner_id",
            validator::ValidationError::new("regex").with_message("is malformed".into()),
        );
        errors.add("base_url", validator::ValidationError::new("url"));

        let err: AppError = errors.into();
        let fields = &err.to_error_info().details["fields"];

        assert_eq!(fields["partnerId"][0], "is malformed");
        assert_eq!(fields["baseUrl"][0], "url");
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::TransientStore { .. }));
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
