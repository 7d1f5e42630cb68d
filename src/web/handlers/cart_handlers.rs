// gemstore/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::responses::ApiResponse;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub gem_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityRequestPayload {
  pub quantity: i32,
}

// --- Handler Implementations ---

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let (items, subtotal_cents) = cart_service::get_cart(&app_state.db_pool, auth_user.user_id).await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    "Cart fetched successfully.",
    json!({
      "items": items,
      "subtotalCents": subtotal_cents,
    }),
  )))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, gem_id = %req_payload.gem_id, quantity = %req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  info!(
    "Add to cart attempt by user: {}, gem: {}, quantity: {}",
    auth_user.user_id, req_payload.gem_id, req_payload.quantity
  );

  let item =
    cart_service::add_to_cart(&app_state.db_pool, auth_user.user_id, req_payload.gem_id, req_payload.quantity).await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok("Item added to cart successfully.", item)))
}

#[instrument(
  name = "handler::update_cart_item",
  skip(app_state, auth_user, path, req_payload),
  fields(user_id = %auth_user.user_id, gem_id = %path.as_ref())
)]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let item =
    cart_service::update_quantity(&app_state.db_pool, auth_user.user_id, path.into_inner(), req_payload.quantity)
      .await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart item updated successfully.", item)))
}

#[instrument(
  name = "handler::remove_cart_item",
  skip(app_state, auth_user, path),
  fields(user_id = %auth_user.user_id, gem_id = %path.as_ref())
)]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  cart_service::remove_item(&app_state.db_pool, auth_user.user_id, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::message_only("Item removed from cart.")))
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let removed = cart_service::clear_cart(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart cleared.", json!({ "removedItems": removed }))))
}
