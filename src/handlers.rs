pub mod admin;
pub mod auth;
pub mod customers;
pub mod movements;
