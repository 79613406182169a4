// src/services/settings_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::{
        auth::Session,
        settings::{
            AssetsSettingsInput, CompanySettings, FinanceSettings, NotificationSettings,
            UpdateCompanyPayload, UpdateFinanceSettingsPayload, UpdateNotificationsPayload,
            merge_package_prices,
        },
    },
};

const MAX_DEPRECIATION_RATE: i64 = 100;

fn clamp_assets_settings(mut input: AssetsSettingsInput) -> AssetsSettingsInput {
    input.asset_depreciation_rate = input
        .asset_depreciation_rate
        .clamp(Decimal::ZERO, Decimal::from(MAX_DEPRECIATION_RATE));
    if input.default_asset_price < Decimal::ZERO {
        input.default_asset_price = Decimal::ZERO;
    }
    input
}

fn check_finance_payload(payload: &UpdateFinanceSettingsPayload) -> Result<(), AppError> {
    if payload.price_per_ticket.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::BadRequest("Price per ticket cannot be negative.".to_string()));
    }
    if let Some(pkg) = payload.packages.iter().find(|p| p.price < Decimal::ZERO) {
        return Err(AppError::BadRequest(format!(
            "Price for package '{}' cannot be negative.",
            pkg.name.trim()
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
    settings_repo: SettingsRepository,
}

impl SettingsService {
    pub fn new(pool: PgPool, settings_repo: SettingsRepository) -> Self {
        Self { pool, settings_repo }
    }

    // --- Company ---

    pub async fn company(&self) -> Result<CompanySettings, AppError> {
        self.settings_repo.company().await
    }

    pub async fn update_company(
        &self,
        session: &Session,
        payload: &UpdateCompanyPayload,
    ) -> Result<CompanySettings, AppError> {
        let settings = self.settings_repo.update_company(payload, session.employee.id).await?;
        tracing::info!("🏢 Company profile updated by {}", session.employee.username);
        Ok(settings)
    }

    // --- Notifications ---

    pub async fn notifications(&self) -> Result<NotificationSettings, AppError> {
        self.settings_repo.notifications().await
    }

    pub async fn update_notifications(
        &self,
        session: &Session,
        payload: UpdateNotificationsPayload,
    ) -> Result<NotificationSettings, AppError> {
        let payload = payload.normalized();
        self.settings_repo
            .update_notifications(&payload, session.employee.id)
            .await
    }

    // --- Finance ---

    pub async fn finance(&self) -> Result<FinanceSettings, AppError> {
        let priced = self.settings_repo.packages().await?;
        let client_packages = self.settings_repo.client_package_names().await?;

        let mut conn = self.pool.acquire().await?;
        let assets_settings = self.settings_repo.assets_settings(&mut conn).await?;
        let technical_settings = self.settings_repo.technical_settings(&mut conn).await?;

        Ok(FinanceSettings {
            packages: merge_package_prices(&client_packages, &priced),
            assets_settings,
            technical_settings,
        })
    }

    /// Writes package prices, asset settings and the ticket price atomically.
    pub async fn update_finance(
        &self,
        session: &Session,
        payload: UpdateFinanceSettingsPayload,
    ) -> Result<FinanceSettings, AppError> {
        check_finance_payload(&payload)?;
        let by = session.employee.id;

        let mut tx = self.pool.begin().await?;

        for pkg in &payload.packages {
            let name = pkg.name.trim();
            if name.is_empty() {
                continue;
            }
            self.settings_repo.upsert_package(&mut *tx, name, pkg.price).await?;
        }

        if let Some(input) = payload.assets_settings {
            let input = clamp_assets_settings(input);
            self.settings_repo
                .upsert_assets_settings(&mut *tx, &input, by)
                .await?;
        }

        if let Some(price) = payload.price_per_ticket {
            self.settings_repo.set_price_per_ticket(&mut *tx, price, by).await?;
        }

        tx.commit().await?;
        tracing::info!("💰 Finance settings updated by {}", session.employee.username);

        self.finance().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::PackagePriceInput;

    fn payload(ppt: Option<i64>, package_price: i64) -> UpdateFinanceSettingsPayload {
        UpdateFinanceSettingsPayload {
            packages: vec![PackagePriceInput {
                name: " Home ".into(),
                price: Decimal::from(package_price),
            }],
            assets_settings: None,
            price_per_ticket: ppt.map(Decimal::from),
        }
    }

    #[test]
    fn depreciation_rate_is_clamped() {
        let input = AssetsSettingsInput {
            default_asset_price: Decimal::from(-5),
            asset_depreciation_rate: Decimal::from(140),
            auto_assign_assets: false,
            require_asset_approval: true,
        };
        let clamped = clamp_assets_settings(input);
        assert_eq!(clamped.asset_depreciation_rate, Decimal::from(100));
        assert_eq!(clamped.default_asset_price, Decimal::ZERO);
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert!(check_finance_payload(&payload(Some(10_000), 85_000)).is_ok());
        assert!(check_finance_payload(&payload(None, 0)).is_ok());
        assert!(matches!(
            check_finance_payload(&payload(Some(-1), 85_000)),
            Err(AppError::BadRequest(_))
        ));
        match check_finance_payload(&payload(None, -3)) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("'Home'")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
