// gemstore/src/web/mod.rs

// Declare child modules
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routes;

// Re-export key items so main.rs and tests can reach them directly.
pub use extractors::{AdminUser, AuthenticatedUser};
pub use responses::ApiResponse;
pub use routes::configure_app_routes;
