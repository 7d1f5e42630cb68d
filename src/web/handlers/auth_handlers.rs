// gemstore/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::responses::ApiResponse;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct RegisterRequestPayload {
  pub email: String,
  pub password: String,
  pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequestPayload {
  pub email: String,
  pub password: String,
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::register",
  skip(app_state, req_payload),
  fields(req_email = %req_payload.email)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Registration attempt for email: {}", req_payload.email);

  let user = auth_service::register_user(
    &app_state.db_pool,
    &req_payload.email,
    &req_payload.password,
    &req_payload.name,
  )
  .await?;

  Ok(HttpResponse::Created().json(ApiResponse::ok("User registered successfully.", user)))
}

#[instrument(
  name = "handler::login",
  skip(app_state, req_payload),
  fields(req_email = %req_payload.email)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Login attempt for email: {}", req_payload.email);

  let (user, token) =
    auth_service::login(&app_state.db_pool, &app_state.config, &req_payload.email, &req_payload.password).await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    "Login successful.",
    json!({
      "token": token,
      "user": user,
    }),
  )))
}

#[instrument(name = "handler::me", skip(auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me_handler(auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    "Profile fetched successfully.",
    json!({
      "userId": auth_user.user_id,
      "email": auth_user.email,
      "isAdmin": auth_user.is_admin,
    }),
  )))
}
