// src/handlers.rs

pub mod assets;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod employees;
pub mod finance;
pub mod lifecycle;
pub mod settings;
