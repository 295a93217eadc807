pub mod auth;
pub mod csv_export;
pub mod customer_service;
pub mod dashboard_service;
pub mod document_service;
pub mod ledger;
pub mod movement_service;
pub mod password;
pub mod user_service;
