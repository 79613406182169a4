// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    common::error::AppError,
    db::{
        AssetRepository, ClientRepository, DashboardRepository, EmployeeRepository,
        FinanceRepository, LifecycleRepository, SettingsRepository, schema::AdminSeed,
    },
    services::{
        asset_service::AssetService, auth::AuthService, client_service::ClientService,
        dashboard_service::DashboardService, employee_service::EmployeeService,
        finance_service::FinanceService, lifecycle_service::LifecycleService,
        maintenance_service::MaintenanceService, settings_service::SettingsService,
    },
};

const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Hosted,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("local") | Some("development") => Ok(Environment::Local),
            Some("production") | Some("hosted") => Ok(Environment::Hosted),
            Some(other) => Err(AppError::Config(format!("Unknown ENVIRONMENT '{}'", other))),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub admin: AdminSeed,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let environment = Environment::parse(var("ENVIRONMENT").as_deref())?;

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let (user, password, name) = match environment {
                    Environment::Local => (
                        var("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                        var("DB_PASSWORD").unwrap_or_default(),
                        var("DB_NAME").unwrap_or_else(|| "assets_management".to_string()),
                    ),
                    Environment::Hosted => (
                        require(var("DB_USER"), "DB_USER")?,
                        require(var("DB_PASSWORD"), "DB_PASSWORD")?,
                        require(var("DB_NAME"), "DB_NAME")?,
                    ),
                };
                postgres_url(&host, &user, &password, &name)
            }
        };

        let jwt_secret = match (var("JWT_SECRET").or_else(|| var("SECRET_KEY")), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Local) => {
                tracing::warn!("⚠️ JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            (None, Environment::Hosted) => {
                return Err(AppError::Config("JWT_SECRET must be set".to_string()));
            }
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("Invalid PORT '{}'", raw)))?,
            None => 5000,
        };

        Ok(Self {
            environment,
            database_url,
            jwt_secret,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            admin: AdminSeed {
                password: var("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
                verification_code: var("ADMIN_CODE").unwrap_or_else(|| "000000".to_string()),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require(value: Option<String>, key: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Config(format!("{} must be set in hosted mode", key)))
}

fn postgres_url(host: &str, user: &str, password: &str, name: &str) -> String {
    if password.is_empty() {
        format!("postgres://{}@{}/{}", user, host, name)
    } else {
        format!("postgres://{}:{}@{}/{}", user, password, host, name)
    }
}

// ---
// Shared state
// ---

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub employee_service: EmployeeService,
    pub client_service: ClientService,
    pub lifecycle_service: LifecycleService,
    pub asset_service: AssetService,
    pub settings_service: SettingsService,
    pub finance_service: FinanceService,
    pub dashboard_service: DashboardService,
    pub maintenance_service: MaintenanceService,
}

impl AppState {
    /// Connects to the database and wires the services.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Database connection established");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone()))
    }

    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let asset_repo = AssetRepository::new(db_pool.clone());
        let lifecycle_repo = LifecycleRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        Self {
            auth_service: AuthService::new(employee_repo.clone(), jwt_secret, db_pool.clone()),
            employee_service: EmployeeService::new(employee_repo.clone()),
            client_service: ClientService::new(client_repo.clone()),
            lifecycle_service: LifecycleService::new(
                db_pool.clone(),
                client_repo.clone(),
                asset_repo.clone(),
                lifecycle_repo,
                employee_repo,
            ),
            asset_service: AssetService::new(asset_repo.clone()),
            settings_service: SettingsService::new(db_pool.clone(), settings_repo.clone()),
            finance_service: FinanceService::new(
                finance_repo,
                settings_repo.clone(),
                asset_repo.clone(),
            ),
            dashboard_service: DashboardService::new(
                dashboard_repo,
                client_repo.clone(),
                asset_repo,
                settings_repo,
            ),
            maintenance_service: MaintenanceService::new(db_pool.clone(), client_repo),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn local_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Local);
        assert_eq!(cfg.database_url, "postgres://postgres@localhost/assets_management");
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.bind_address(), "0.0.0.0:5000");
        assert_eq!(cfg.admin.password, "admin123");
        assert_eq!(cfg.admin.verification_code, "000000");
    }

    #[test]
    fn database_url_wins_over_parts() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://u:p@db/x"),
            ("DB_USER", "ignored"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "postgres://u:p@db/x");
    }

    #[test]
    fn hosted_requires_db_parts_and_secret() {
        let missing = config(&[("ENVIRONMENT", "production"), ("JWT_SECRET", "s")]);
        assert!(matches!(missing, Err(AppError::Config(_))));

        let no_secret = config(&[
            ("ENVIRONMENT", "hosted"),
            ("DB_USER", "isp"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "ops"),
        ]);
        assert!(matches!(no_secret, Err(AppError::Config(_))));

        let cfg = config(&[
            ("ENVIRONMENT", "hosted"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "isp"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "ops"),
            ("SECRET_KEY", "from-alias"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "postgres://isp:pw@db.internal/ops");
        assert_eq!(cfg.jwt_secret, "from-alias");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn rejects_bad_port_and_environment() {
        assert!(matches!(config(&[("PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(config(&[("ENVIRONMENT", "staging")]), Err(AppError::Config(_))));
    }
}
