//! Account registration and profile management.

pub mod errors;
pub mod models;
pub mod ports;
pub mod service;
