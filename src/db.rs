pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
