// gemstore/src/models/mod.rs

//! Contains data structures representing database entities.

// Declare child modules for each model
pub mod cart_item;
pub mod gem;
pub mod order;
pub mod order_item;
pub mod user;

// Re-export the model structs for convenient access
pub use cart_item::CartItem;
pub use gem::{DiscountType, Gem};
pub use order::{Order, OrderStatus, PaymentMethod};
pub use order_item::OrderItem;
pub use user::{Session, User};
