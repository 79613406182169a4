// src/db.rs

pub mod schema;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod asset_repo;
pub use asset_repo::AssetRepository;
pub mod lifecycle_repo;
pub use lifecycle_repo::LifecycleRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;

#[cfg(test)]
pub mod test_support;
