//! Login, token refresh and bearer token resolution.

pub mod errors;
pub mod ports;
pub mod service;
