// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_blank;

// --- Company profile ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    #[schema(ignore)]
    pub id: i16,
    #[schema(example = "RUSHTACH")]
    pub company_name: String,
    pub company_logo: Option<String>,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_website: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "RUSHTACH")]
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_website: Option<String>,
}

// --- Notifications ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[schema(ignore)]
    pub id: i16,
    pub sound_enabled: bool,
    #[schema(example = "default")]
    pub notification_sound: String,
    #[schema(example = 50)]
    pub volume: i32,
    pub email_new_client: bool,
    pub email_payment: bool,
    pub email_status_change: bool,
    pub system_alerts: bool,
    pub browser_notifications: bool,
    #[schema(example = 30)]
    pub relocation_days: i32,
    #[schema(example = 30)]
    pub renewal_days: i32,
    #[schema(example = 30)]
    pub closing_days: i32,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationsPayload {
    #[serde(default)]
    pub sound_enabled: bool,
    pub notification_sound: Option<String>,
    pub volume: Option<i32>,
    #[serde(default)]
    pub email_new_client: bool,
    #[serde(default)]
    pub email_payment: bool,
    #[serde(default)]
    pub email_status_change: bool,
    #[serde(default)]
    pub system_alerts: bool,
    #[serde(default)]
    pub browser_notifications: bool,
    pub relocation_days: Option<i32>,
    pub renewal_days: Option<i32>,
    pub closing_days: Option<i32>,
}

impl UpdateNotificationsPayload {
    /// Fills defaults and clamps volume to 0..=100 and thresholds to 0..=365.
    pub fn normalized(mut self) -> Self {
        self.volume = Some(self.volume.unwrap_or(50).clamp(0, 100));
        self.relocation_days = Some(self.relocation_days.unwrap_or(30).clamp(0, 365));
        self.renewal_days = Some(self.renewal_days.unwrap_or(30).clamp(0, 365));
        self.closing_days = Some(self.closing_days.unwrap_or(30).clamp(0, 365));
        let sound = self
            .notification_sound
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("default")
            .to_string();
        self.notification_sound = Some(sound);
        self
    }
}

// --- Finance ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    #[schema(example = "Home 10Mbps")]
    pub package_name: String,
    #[schema(value_type = f64, example = 85000.0)]
    pub sale_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry of the pricing list: priced packages plus packages only seen on clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackagePrice {
    pub id: Option<Uuid>,
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetsSettings {
    #[schema(ignore)]
    pub id: i16,
    #[schema(value_type = f64)]
    pub default_asset_price: Decimal,
    #[schema(value_type = f64)]
    pub asset_depreciation_rate: Decimal,
    pub auto_assign_assets: bool,
    pub require_asset_approval: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSettings {
    #[schema(ignore)]
    pub id: i16,
    #[schema(value_type = f64)]
    pub price_per_ticket: Decimal,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSettings {
    pub packages: Vec<PackagePrice>,
    pub assets_settings: AssetsSettings,
    pub technical_settings: TechnicalSettings,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackagePriceInput {
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetsSettingsInput {
    #[serde(default)]
    #[schema(value_type = f64)]
    pub default_asset_price: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub asset_depreciation_rate: Decimal,
    #[serde(default)]
    pub auto_assign_assets: bool,
    #[serde(default)]
    pub require_asset_approval: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFinanceSettingsPayload {
    #[serde(default)]
    pub packages: Vec<PackagePriceInput>,
    pub assets_settings: Option<AssetsSettingsInput>,
    #[schema(value_type = Option<f64>)]
    pub price_per_ticket: Option<Decimal>,
}

/// Merges distinct client package names with the priced `packages` table.
pub fn merge_package_prices(client_packages: &[String], priced: &[Package]) -> Vec<PackagePrice> {
    let mut merged: std::collections::BTreeMap<String, PackagePrice> = client_packages
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            (
                name.to_string(),
                PackagePrice {
                    id: None,
                    name: name.to_string(),
                    price: Decimal::ZERO,
                    is_active: true,
                },
            )
        })
        .collect();

    for pkg in priced {
        merged.insert(
            pkg.package_name.clone(),
            PackagePrice {
                id: Some(pkg.id),
                name: pkg.package_name.clone(),
                price: pkg.sale_price,
                is_active: pkg.is_active,
            },
        );
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_values_are_clamped() {
        let payload = UpdateNotificationsPayload {
            sound_enabled: true,
            notification_sound: Some("  ".into()),
            volume: Some(180),
            email_new_client: false,
            email_payment: false,
            email_status_change: false,
            system_alerts: false,
            browser_notifications: false,
            relocation_days: Some(-4),
            renewal_days: None,
            closing_days: Some(900),
        }
        .normalized();
        assert_eq!(payload.volume, Some(100));
        assert_eq!(payload.relocation_days, Some(0));
        assert_eq!(payload.renewal_days, Some(30));
        assert_eq!(payload.closing_days, Some(365));
        assert_eq!(payload.notification_sound.as_deref(), Some("default"));
    }

    #[test]
    fn package_list_merges_and_sorts() {
        let now = Utc::now();
        let priced = vec![Package {
            id: Uuid::new_v4(),
            package_name: "Home".into(),
            sale_price: Decimal::new(85000, 0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }];
        let from_clients = vec!["Office".to_string(), "Home".to_string(), " ".to_string()];

        let merged = merge_package_prices(&from_clients, &priced);
        let names: Vec<_> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Office"]);
        assert_eq!(merged[0].price, Decimal::new(85000, 0));
        assert!(merged[0].id.is_some());
        assert_eq!(merged[1].price, Decimal::ZERO);
        assert!(merged[1].id.is_none());
    }
}
