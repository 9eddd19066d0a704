pub mod account;
pub mod authentication;
