// gemstore/src/web/responses.rs

//! The uniform success envelope. Error envelopes (`success: false`, plus an
//! optional `errors` list) are produced by `AppError::error_response`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = serde_json::Value> {
  pub success: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn ok(message: impl Into<String>, data: T) -> Self {
    Self { success: true, message: message.into(), data: Some(data) }
  }
}

impl ApiResponse {
  /// For operations whose confirmation needs no payload.
  pub fn message_only(message: impl Into<String>) -> Self {
    Self { success: true, message: message.into(), data: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn envelope_with_data() {
    let resp = ApiResponse::ok("Fetched.", json!({"count": 2}));
    let value = serde_json::to_value(&resp).unwrap();
    assert_eq!(value, json!({"success": true, "message": "Fetched.", "data": {"count": 2}}));
  }

  #[test]
  fn envelope_omits_absent_data() {
    let resp = ApiResponse::message_only("Done.");
    let value = serde_json::to_value(&resp).unwrap();
    assert_eq!(value, json!({"success": true, "message": "Done."}));
  }
}
