pub mod auth;
pub mod flash;
pub mod i18n;
pub mod input;
pub mod rbac;
