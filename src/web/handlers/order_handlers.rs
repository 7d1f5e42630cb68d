// gemstore/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::order::OrderStatus;
use crate::services::order_service::{self, PlaceOrderRequest};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use crate::web::responses::ApiResponse;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
  pub status: Option<OrderStatus>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequestPayload {
  pub status: OrderStatus,
  pub tracking_number: Option<String>,
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::place_order",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, line_count = req_payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  info!(
    "Order placement attempt by user: {} with {} lines.",
    auth_user.user_id,
    req_payload.items.len()
  );

  match order_service::place_order(&app_state.db_pool, auth_user.user_id, &req_payload).await {
    Ok(confirmation) => {
      info!(
        "Order {} placed successfully for user {}.",
        confirmation.order_number, auth_user.user_id
      );
      Ok(HttpResponse::Created().json(ApiResponse::ok("Order placed successfully.", confirmation)))
    }
    Err(app_err) => {
      warn!("Order placement failed for user {}: {:?}", auth_user.user_id, app_err);
      Err(app_err)
    }
  }
}

#[instrument(
  name = "handler::list_orders",
  skip(app_state, auth_user, query_params),
  fields(user_id = %auth_user.user_id)
)]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query_params: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let (orders, pagination) = order_service::list_orders(
    &app_state.db_pool,
    auth_user.user_id,
    query_params.page,
    query_params.limit,
    query_params.status,
  )
  .await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    "Orders fetched successfully.",
    json!({
      "orders": orders,
      "pagination": pagination,
    }),
  )))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, auth_user, path),
  fields(user_id = %auth_user.user_id, order_number = %path.as_ref())
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::get_order(&app_state.db_pool, auth_user.user_id, &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::ok("Order fetched successfully.", order)))
}

#[instrument(
  name = "handler::cancel_order",
  skip(app_state, auth_user, path),
  fields(user_id = %auth_user.user_id, order_number = %path.as_ref())
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_number = path.into_inner();
  let order = order_service::cancel_order(&app_state.db_pool, auth_user.user_id, &order_number).await?;

  info!("Order {} cancelled by user {}.", order_number, auth_user.user_id);
  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    format!("Order {} cancelled; stock has been restored.", order_number),
    order,
  )))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, admin, path, req_payload),
  fields(admin_id = %admin.0.user_id, order_number = %path.as_ref(), next_status = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
  req_payload: web::Json<UpdateStatusRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let order = order_service::advance_status(
    &app_state.db_pool,
    &path.into_inner(),
    payload.status,
    payload.tracking_number,
  )
  .await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok("Order status updated.", order)))
}
