// gemstore/src/web/routes.rs

use actix_web::web;

// Simple liveness probe; deliberately does not touch the database.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  use crate::web::handlers::{auth_handlers, cart_handlers, gem_handlers, order_handlers};

  cfg.service(
    web::scope("/api/v1")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Authentication Routes
      .service(
        web::scope("/auth")
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/me", web::get().to(auth_handlers::me_handler)),
      )
      // Catalog Routes (reads public, writes admin-gated via AdminUser)
      .service(
        web::scope("/gems")
          .route("", web::get().to(gem_handlers::list_gems_handler))
          .route("", web::post().to(gem_handlers::create_gem_handler))
          .route("/{gem_id}", web::get().to(gem_handlers::get_gem_handler))
          .route("/{gem_id}", web::put().to(gem_handlers::update_gem_handler))
          .route("/{gem_id}", web::delete().to(gem_handlers::delete_gem_handler)),
      )
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/{gem_id}", web::put().to(cart_handlers::update_cart_item_handler))
          .route("/{gem_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      // Order Routes
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_number}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_number}/cancel", web::put().to(order_handlers::cancel_order_handler))
          .route("/{order_number}/status", web::put().to(order_handlers::update_order_status_handler)),
      ),
  );
}
