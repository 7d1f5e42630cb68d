// gemstore/src/web/handlers/mod.rs

// Declare handler modules
pub mod auth_handlers;
pub mod cart_handlers;
pub mod gem_handlers;
pub mod order_handlers;
