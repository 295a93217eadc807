pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod movement;
pub mod statement;
