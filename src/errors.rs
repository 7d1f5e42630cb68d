// gemstore/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// Validation failures collected per field, reported together.
  #[error("Validation failed.")]
  FieldValidation(Vec<String>),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Insufficient stock for \"{0}\".")]
  InsufficientStock(String),

  #[error("Order is already cancelled.")]
  AlreadyCancelled,

  #[error("{0}")]
  InvalidTransition(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in code that uses `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      if let Ok(sqlx_err) = err.downcast::<sqlx::Error>() {
        return AppError::Sqlx(sqlx_err);
      }
      return AppError::Internal("Database operation failed.".to_string());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response. For storage and
    // internal failures this log line is the only place the detail appears;
    // the client sees a generic message.
    tracing::error!(application_error = %self, "Responding with error");

    let fail = |message: String| json!({ "success": false, "message": message });

    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(fail(m.clone())),
      AppError::FieldValidation(errors) => HttpResponse::BadRequest().json(json!({
        "success": false,
        "message": "Validation failed.",
        "errors": errors,
      })),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(fail(m.clone())),
      AppError::NotFound(m) => HttpResponse::NotFound().json(fail(m.clone())),
      AppError::InsufficientStock(_) | AppError::AlreadyCancelled | AppError::InvalidTransition(_) => {
        HttpResponse::BadRequest().json(fail(self.to_string()))
      }
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => {
        HttpResponse::InternalServerError().json(fail("An internal error occurred.".to_string()))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;

  #[test]
  fn error_status_codes_follow_the_taxonomy() {
    let cases = [
      (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
      (AppError::FieldValidation(vec!["email is required".into()]), StatusCode::BAD_REQUEST),
      (AppError::Auth("no token".into()), StatusCode::UNAUTHORIZED),
      (AppError::NotFound("order".into()), StatusCode::NOT_FOUND),
      (AppError::InsufficientStock("Ruby".into()), StatusCode::BAD_REQUEST),
      (AppError::AlreadyCancelled, StatusCode::BAD_REQUEST),
      (AppError::InvalidTransition("nope".into()), StatusCode::BAD_REQUEST),
      (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
      assert_eq!(err.error_response().status(), expected, "for {err:?}");
    }
  }

  #[actix_web::test]
  async fn internal_errors_never_echo_detail_to_the_client() {
    let resp = AppError::Internal("connection string leaked".into()).error_response();
    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(!body.contains("connection string"));
    assert!(body.contains("An internal error occurred."));
  }

  #[test]
  fn insufficient_stock_names_the_offending_gem() {
    let err = AppError::InsufficientStock("Star Sapphire".into());
    assert_eq!(err.to_string(), "Insufficient stock for \"Star Sapphire\".");
  }
}
