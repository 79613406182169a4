// src/models.rs

pub mod asset;
pub mod auth;
pub mod client;
pub mod dashboard;
pub mod finance;
pub mod lifecycle;
pub mod settings;
