// gemstore/src/lib.rs

//! Gemstone storefront backend: auth, catalog, cart, and the order workflow.
//!
//! Exposed as a library so integration tests can drive the service layer
//! directly; the `gemstore_server` binary wires the same modules to actix.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod web;
