// gemstore/src/web/handlers/gem_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::catalog_service::{self, GemFilter, GemUpdate, NewGem};
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::responses::ApiResponse;

#[instrument(name = "handler::list_gems", skip(app_state, query_params))]
pub async fn list_gems_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<GemFilter>,
) -> Result<HttpResponse, AppError> {
  let (gems, pagination) = catalog_service::list_gems(&app_state.db_pool, &query_params).await?;

  Ok(HttpResponse::Ok().json(ApiResponse::ok(
    "Gems fetched successfully.",
    json!({
      "gems": gems,
      "pagination": pagination,
    }),
  )))
}

#[instrument(name = "handler::get_gem", skip(app_state, path), fields(gem_id = %path.as_ref()))]
pub async fn get_gem_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let gem_id = path.into_inner();
  let gem = catalog_service::get_gem(&app_state.db_pool, gem_id).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::ok("Gem fetched successfully.", gem)))
}

#[instrument(
  name = "handler::create_gem",
  skip(app_state, admin, req_payload),
  fields(admin_id = %admin.0.user_id, name = %req_payload.name)
)]
pub async fn create_gem_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<NewGem>,
) -> Result<HttpResponse, AppError> {
  let gem = catalog_service::create_gem(&app_state.db_pool, req_payload.into_inner()).await?;
  info!("Gem {} created by admin {}.", gem.id, admin.0.user_id);
  Ok(HttpResponse::Created().json(ApiResponse::ok("Gem created successfully.", gem)))
}

#[instrument(
  name = "handler::update_gem",
  skip(app_state, admin, path, req_payload),
  fields(admin_id = %admin.0.user_id, gem_id = %path.as_ref())
)]
pub async fn update_gem_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<GemUpdate>,
) -> Result<HttpResponse, AppError> {
  let gem = catalog_service::update_gem(&app_state.db_pool, path.into_inner(), req_payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::ok("Gem updated successfully.", gem)))
}

#[instrument(
  name = "handler::delete_gem",
  skip(app_state, admin, path),
  fields(admin_id = %admin.0.user_id, gem_id = %path.as_ref())
)]
pub async fn delete_gem_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  catalog_service::delete_gem(&app_state.db_pool, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(ApiResponse::message_only("Gem deleted successfully.")))
}
