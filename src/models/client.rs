// src/models/client.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_phone};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "client_status")]
pub enum ClientStatus {
    Pending,
    Connected,
    Relocated,
    Renewed,
    Reversed,
    Closed,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Pending => "Pending",
            ClientStatus::Connected => "Connected",
            ClientStatus::Relocated => "Relocated",
            ClientStatus::Renewed => "Renewed",
            ClientStatus::Reversed => "Reversed",
            ClientStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "client_category")]
pub enum ClientCategory {
    Actual,
    Virtual,
}

// --- Rows ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[schema(example = "John Mukasa")]
    pub full_name: String,
    #[schema(example = "+256 700 123456")]
    pub phone_number: String,
    #[schema(example = "ACC-10023")]
    pub account_number: String,
    #[schema(example = "Home 10Mbps")]
    pub package: Option<String>,
    pub client_category: ClientCategory,
    pub virtual_location: Option<String>,
    pub ground_location: Option<String>,
    pub payment_date: NaiveDate,
    pub status: ClientStatus,
    pub relocation_count: i32,
    pub renewal_count: i32,
    pub work_order: Option<String>,
    pub current_asset_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client joined with its most recent connection record.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConnectionView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub serial_number: Option<String>,
    pub power_levels: Option<String>,
    pub router_used: Option<String>,
    pub router_name: Option<String>,
    pub router_password: Option<String>,
    pub connection_location: Option<String>,
    pub port_number: Option<String>,
    pub connection_date: Option<NaiveDate>,
    pub technician_name: Option<String>,
    /// Days since the client was registered.
    pub days_in_system: i32,
    pub days_since_connection: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayment {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub sale_price: Option<Decimal>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "John Mukasa")]
    pub full_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: String,
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "ACC-10023")]
    pub account_number: String,
    pub package: Option<String>,
    pub client_category: ClientCategory,
    pub virtual_location: Option<String>,
    pub ground_location: Option<String>,
    #[schema(value_type = String, example = "2026-01-24")]
    pub payment_date: NaiveDate,
    pub work_order: Option<String>,
}

/// Payload after trimming and category rules have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub full_name: String,
    pub phone_number: String,
    pub account_number: String,
    pub package: Option<String>,
    pub client_category: ClientCategory,
    pub virtual_location: Option<String>,
    pub ground_location: Option<String>,
    pub payment_date: NaiveDate,
    pub work_order: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ClientPayload {
    /// Actual clients are served at a ground location only; virtual clients
    /// need both a virtual and a ground location.
    pub fn into_new_client(self) -> Result<NewClient, &'static str> {
        let ground_location = non_empty(self.ground_location);
        let virtual_location = non_empty(self.virtual_location);

        let virtual_location = match self.client_category {
            ClientCategory::Actual => {
                if ground_location.is_none() {
                    return Err("Ground location is required for Actual clients");
                }
                None
            }
            ClientCategory::Virtual => {
                if virtual_location.is_none() || ground_location.is_none() {
                    return Err("Both virtual and ground locations are required for Virtual clients");
                }
                virtual_location
            }
        };

        Ok(NewClient {
            full_name: self.full_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            package: non_empty(self.package),
            client_category: self.client_category,
            virtual_location,
            ground_location,
            payment_date: self.payment_date,
            work_order: non_empty(self.work_order),
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhoneQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneUsage {
    pub count: i64,
    pub used: bool,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn client(status: ClientStatus) -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            full_name: "John Mukasa".into(),
            phone_number: "0700123456".into(),
            account_number: "ACC-1".into(),
            package: Some("Home".into()),
            client_category: ClientCategory::Actual,
            virtual_location: None,
            ground_location: Some("Kampala".into()),
            payment_date: now.date_naive(),
            status,
            relocation_count: 0,
            renewal_count: 0,
            work_order: None,
            current_asset_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(category: ClientCategory) -> ClientPayload {
        ClientPayload {
            full_name: "  John  ".into(),
            phone_number: "0700 123456".into(),
            account_number: " ACC-1 ".into(),
            package: Some("   ".into()),
            client_category: category,
            virtual_location: Some("Zone 4".into()),
            ground_location: Some("Kampala".into()),
            payment_date: NaiveDate::from_ymd_opt(2026, 1, 24).unwrap(),
            work_order: None,
        }
    }

    #[test]
    fn actual_clients_drop_virtual_location() {
        let client = payload(ClientCategory::Actual).into_new_client().unwrap();
        assert_eq!(client.virtual_location, None);
        assert_eq!(client.ground_location.as_deref(), Some("Kampala"));
        assert_eq!(client.full_name, "John");
        assert_eq!(client.account_number, "ACC-1");
        assert_eq!(client.package, None);
    }

    #[test]
    fn virtual_clients_need_both_locations() {
        let mut p = payload(ClientCategory::Virtual);
        p.ground_location = Some(" ".into());
        assert!(p.into_new_client().is_err());

        let ok = payload(ClientCategory::Virtual).into_new_client().unwrap();
        assert_eq!(ok.virtual_location.as_deref(), Some("Zone 4"));
    }

    #[test]
    fn actual_clients_need_ground_location() {
        let mut p = payload(ClientCategory::Actual);
        p.ground_location = None;
        assert!(p.into_new_client().is_err());
    }

    #[test]
    fn unknown_category_is_rejected_at_deserialization() {
        let body = r#"{"fullName":"A","phoneNumber":"1","accountNumber":"X",
            "clientCategory":"Hybrid","paymentDate":"2026-01-01"}"#;
        assert!(serde_json::from_str::<ClientPayload>(body).is_err());
    }
}
