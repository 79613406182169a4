// src/services.rs

pub mod asset_service;
pub mod auth;
pub mod client_service;
pub mod dashboard_service;
pub mod employee_service;
pub mod finance_service;
pub mod lifecycle_service;
pub mod maintenance_service;
pub mod settings_service;
