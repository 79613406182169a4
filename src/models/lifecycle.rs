// src/models/lifecycle.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::validation::validate_not_blank;
use crate::models::asset::{Asset, AssetStatus};
use crate::models::client::{Client, ClientStatus};

// =============================================================================
//  1. STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Connect,
    Relocate,
    Renew,
    Reverse,
    Close,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Connect => "connect",
            LifecycleAction::Relocate => "relocate",
            LifecycleAction::Renew => "renew",
            LifecycleAction::Reverse => "reverse",
            LifecycleAction::Close => "close",
        }
    }

    /// Status the client's current router carries after this action.
    pub fn asset_status(&self) -> AssetStatus {
        match self {
            LifecycleAction::Connect => AssetStatus::InUse,
            LifecycleAction::Relocate => AssetStatus::Relocated,
            LifecycleAction::Renew => AssetStatus::Renewed,
            LifecycleAction::Reverse => AssetStatus::Reversed,
            LifecycleAction::Close => AssetStatus::Closed,
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClientStatus {
    fn is_in_service(&self) -> bool {
        matches!(
            self,
            ClientStatus::Connected | ClientStatus::Relocated | ClientStatus::Renewed
        )
    }

    /// Applies a lifecycle action, returning the next status or the rejected transition.
    pub fn apply(self, action: LifecycleAction) -> Result<ClientStatus, AppError> {
        let next = match action {
            LifecycleAction::Connect if self == ClientStatus::Pending => ClientStatus::Connected,
            LifecycleAction::Relocate if self.is_in_service() => ClientStatus::Relocated,
            LifecycleAction::Renew if self.is_in_service() => ClientStatus::Renewed,
            LifecycleAction::Reverse if self.is_in_service() => ClientStatus::Reversed,
            // Closing again corrects the sale price or buyer.
            LifecycleAction::Close => ClientStatus::Closed,
            _ => return Err(AppError::InvalidTransition { from: self, action }),
        };
        Ok(next)
    }

    pub fn allowed_actions(self) -> Vec<LifecycleAction> {
        [
            LifecycleAction::Connect,
            LifecycleAction::Relocate,
            LifecycleAction::Renew,
            LifecycleAction::Reverse,
            LifecycleAction::Close,
        ]
        .into_iter()
        .filter(|a| self.apply(*a).is_ok())
        .collect()
    }
}

// =============================================================================
//  2. HISTORY ROWS
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConnection {
    pub id: Uuid,
    pub client_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub serial_number: String,
    pub power_levels: Option<String>,
    pub router_used: Option<String>,
    pub router_name: Option<String>,
    pub router_password: Option<String>,
    pub ground_location: Option<String>,
    pub port_number: Option<String>,
    pub connection_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientRelocation {
    pub id: Uuid,
    pub client_id: Uuid,
    pub old_location: Option<String>,
    pub new_location: String,
    pub old_port: Option<String>,
    pub new_port: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub old_router: Option<String>,
    pub new_router: Option<String>,
    pub old_serial_number: Option<String>,
    pub new_serial_number: Option<String>,
    pub relocated_by: Option<Uuid>,
    pub relocation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientRenewal {
    pub id: Uuid,
    pub client_id: Uuid,
    pub renewal_amount: Decimal,
    pub renewed_by: Option<Uuid>,
    pub renewal_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientReversal {
    pub id: Uuid,
    pub client_id: Uuid,
    pub reversal_amount: Decimal,
    pub reversed_by: Option<Uuid>,
    pub reversal_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientHistory {
    pub client: Client,
    pub allowed_actions: Vec<LifecycleAction>,
    pub connections: Vec<ClientConnection>,
    pub relocations: Vec<ClientRelocation>,
    pub renewals: Vec<ClientRenewal>,
    pub reversals: Vec<ClientReversal>,
}

/// Result of a lifecycle action: the updated client and the router it touched.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub client: Client,
    pub asset: Option<Asset>,
}

// =============================================================================
//  3. PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPayload {
    #[schema(example = "S/N: 4857-5443-7F11-40B5")]
    pub serial_number: String,
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "ONT")]
    pub router_type: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub router_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub router_password: String,
    pub power_levels: Option<String>,
    pub port_number: Option<String>,
    pub ground_location: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelocatePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub new_location: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub new_port: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub new_router_type: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub new_router: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub new_router_password: String,
    pub new_serial_number: String,
    /// Employee doing the field work; defaults to the dispatcher.
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmountPayload {
    #[schema(value_type = f64, example = 50000.0)]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosePayload {
    #[schema(value_type = f64, example = 120000.0)]
    pub purchase_price: Decimal,
    #[validate(custom(function = "validate_not_blank"))]
    pub buyer_name: String,
}

/// Optional text field: trimmed, `None` when blank.
pub fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ClientStatus::*;
    use LifecycleAction::*;

    #[test]
    fn connect_only_from_pending() {
        assert_eq!(Pending.apply(Connect).unwrap(), Connected);
        for from in [Connected, Relocated, Renewed, Reversed, Closed] {
            assert!(from.apply(Connect).is_err(), "{from} should not connect");
        }
    }

    #[test]
    fn relocation_is_repeatable_but_not_from_terminal_states() {
        for from in [Connected, Relocated, Renewed] {
            assert_eq!(from.apply(Relocate).unwrap(), Relocated);
        }
        for from in [Pending, Reversed, Closed] {
            assert!(matches!(
                from.apply(Relocate),
                Err(AppError::InvalidTransition { action: Relocate, .. })
            ));
        }
    }

    #[test]
    fn renew_and_reverse_require_service() {
        assert_eq!(Relocated.apply(Renew).unwrap(), Renewed);
        assert_eq!(Renewed.apply(Renew).unwrap(), Renewed);
        assert_eq!(Connected.apply(Reverse).unwrap(), Reversed);
        assert!(Pending.apply(Renew).is_err());
        assert!(Reversed.apply(Reverse).is_err());
        assert!(Closed.apply(Renew).is_err());
    }

    #[test]
    fn close_from_any_status() {
        for from in [Pending, Connected, Relocated, Renewed, Reversed, Closed] {
            assert_eq!(from.apply(Close).unwrap(), Closed);
        }
    }

    #[test]
    fn allowed_actions_follow_the_table() {
        assert_eq!(Pending.allowed_actions(), vec![Connect, Close]);
        assert_eq!(Reversed.allowed_actions(), vec![Close]);
        assert_eq!(Closed.allowed_actions(), vec![Close]);
        assert_eq!(Renewed.allowed_actions(), vec![Relocate, Renew, Reverse, Close]);
    }

    #[test]
    fn every_reachable_status_comes_from_a_listed_transition() {
        // Walk every (status, action) pair; anything accepted must land on the action's target.
        let all = [Pending, Connected, Relocated, Renewed, Reversed, Closed];
        for from in all {
            for action in [Connect, Relocate, Renew, Reverse, Close] {
                if let Ok(to) = from.apply(action) {
                    let expected = match action {
                        Connect => Connected,
                        Relocate => Relocated,
                        Renew => Renewed,
                        Reverse => Reversed,
                        Close => Closed,
                    };
                    assert_eq!(to, expected);
                }
            }
        }
    }

    #[test]
    fn clean_trims_and_drops_blanks() {
        assert_eq!(clean(Some("  x ")), Some("x".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }
}
