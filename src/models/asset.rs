// src/models/asset.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::client::ClientCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_status")]
pub enum AssetStatus {
    Available,
    #[serde(rename = "In Use")]
    #[sqlx(rename = "In Use")]
    InUse,
    Relocated,
    Renewed,
    Reversed,
    Closed,
}

/// Router listings reachable from `/api/assets/routers/{status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouterListing {
    Relocated,
    Renewed,
    Closed,
    Reversed,
}

impl RouterListing {
    pub fn status(&self) -> AssetStatus {
        match self {
            RouterListing::Relocated => AssetStatus::Relocated,
            RouterListing::Renewed => AssetStatus::Renewed,
            RouterListing::Closed => AssetStatus::Closed,
            RouterListing::Reversed => AssetStatus::Reversed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    #[schema(example = "ONT - ACC-10023")]
    pub asset_name: String,
    #[schema(example = "ONT")]
    pub asset_type: Option<String>,
    #[schema(example = "485754437F1140B5")]
    pub serial_number: Option<String>,
    pub status: AssetStatus,
    pub assigned_to: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub location: Option<String>,
    pub power_levels: Option<String>,
    pub router_used: Option<String>,
    pub router_name: Option<String>,
    pub router_password: Option<String>,
    pub port_number: Option<String>,
    pub buyer_name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Asset joined with its assignee and client, as shown in listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub asset: Asset,
    pub assigned_employee_name: Option<String>,
    pub client_account_number: Option<String>,
    pub client_full_name: Option<String>,
    pub client_phone_number: Option<String>,
    pub client_category: Option<ClientCategory>,
}

/// Fields for a freshly installed router row.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub asset_name: String,
    pub asset_type: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub assigned_to: Uuid,
    pub client_id: Uuid,
    pub location: Option<String>,
    pub power_levels: Option<String>,
    pub router_name: String,
    pub router_password: String,
    pub port_number: Option<String>,
}

// --- Serial lookup ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SerialLookupQuery {
    pub serial: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SerialLookupRow {
    pub asset_id: Uuid,
    pub status: AssetStatus,
    pub asset_type: Option<String>,
    pub asset_name: String,
    pub location: Option<String>,
    pub client_id: Option<Uuid>,
    pub account_number: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialAssetSummary {
    pub id: Uuid,
    pub status: AssetStatus,
    pub asset_type: Option<String>,
    pub asset_name: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialClientSummary {
    pub id: Uuid,
    pub account_number: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialLookupResponse {
    pub ok: bool,
    pub serial: String,
    pub exists: bool,
    pub in_use: bool,
    pub asset: Option<SerialAssetSummary>,
    pub client: Option<SerialClientSummary>,
}

impl SerialLookupResponse {
    pub fn from_row(serial: String, row: Option<SerialLookupRow>) -> Self {
        let Some(row) = row else {
            return Self {
                ok: true,
                serial,
                exists: false,
                in_use: false,
                asset: None,
                client: None,
            };
        };

        // A router is in use once it is tied to a client and not back on the shelf.
        let in_use = row.client_id.is_some() && row.status != AssetStatus::Available;

        let client = row.client_id.map(|id| SerialClientSummary {
            id,
            account_number: row.account_number,
            full_name: row.full_name,
            phone_number: row.phone_number,
        });

        Self {
            ok: true,
            serial,
            exists: true,
            in_use,
            asset: Some(SerialAssetSummary {
                id: row.asset_id,
                status: row.status,
                asset_type: row.asset_type,
                asset_name: row.asset_name,
                location: row.location,
            }),
            client,
        }
    }
}

// --- Reports ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountBy {
    pub label: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetReport {
    pub assets_by_type: Vec<CountBy>,
    pub assets_by_status: Vec<CountBy>,
    pub total_value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: AssetStatus, client: bool) -> SerialLookupRow {
        SerialLookupRow {
            asset_id: Uuid::new_v4(),
            status,
            asset_type: Some("ONT".into()),
            asset_name: "ONT - ACC-1".into(),
            location: None,
            client_id: client.then(Uuid::new_v4),
            account_number: client.then(|| "ACC-1".to_string()),
            full_name: None,
            phone_number: None,
        }
    }

    #[test]
    fn unknown_serial_is_reported_as_free() {
        let r = SerialLookupResponse::from_row("ABC".into(), None);
        assert!(r.ok && !r.exists && !r.in_use);
        assert!(r.asset.is_none() && r.client.is_none());
    }

    #[test]
    fn linked_router_is_in_use_unless_available() {
        assert!(SerialLookupResponse::from_row("A".into(), Some(row(AssetStatus::InUse, true))).in_use);
        assert!(SerialLookupResponse::from_row("A".into(), Some(row(AssetStatus::Closed, true))).in_use);
        assert!(!SerialLookupResponse::from_row("A".into(), Some(row(AssetStatus::Available, true))).in_use);
        assert!(!SerialLookupResponse::from_row("A".into(), Some(row(AssetStatus::InUse, false))).in_use);
    }

    #[test]
    fn asset_status_wire_names() {
        assert_eq!(serde_json::to_string(&AssetStatus::InUse).unwrap(), "\"In Use\"");
        let listing: RouterListing = serde_json::from_str("\"reversed\"").unwrap();
        assert_eq!(listing.status(), AssetStatus::Reversed);
    }
}
