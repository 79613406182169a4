// src/models/finance.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::dates::DateFilter;
use crate::common::validation::validate_not_blank;
use crate::models::client::{ClientCategory, ClientStatus};

// =============================================================================
//  1. CLIENT FINANCE OVERVIEW
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceClientRow {
    pub id: Uuid,
    pub full_name: String,
    pub account_number: String,
    pub phone_number: String,
    pub package: Option<String>,
    pub client_category: ClientCategory,
    pub status: ClientStatus,
    pub payment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub asset_count: i64,
    #[schema(value_type = f64)]
    pub total_renewal_amount: Decimal,
    #[schema(value_type = f64)]
    pub package_price: Decimal,
    #[sqlx(skip)]
    #[schema(value_type = f64)]
    pub technical_cost: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceOverview {
    pub filter: DateFilter,
    #[schema(value_type = f64)]
    pub price_per_ticket: Decimal,
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
    #[schema(value_type = f64)]
    pub total_technical_cost: Decimal,
    pub clients: Vec<FinanceClientRow>,
}

impl FinanceOverview {
    /// Technical cost per client is `price_per_ticket × asset_count`.
    pub fn build(filter: DateFilter, price_per_ticket: Decimal, mut clients: Vec<FinanceClientRow>) -> Self {
        let mut total_sales = Decimal::ZERO;
        let mut total_technical_cost = Decimal::ZERO;

        for row in clients.iter_mut() {
            row.technical_cost = price_per_ticket * Decimal::from(row.asset_count);
            total_sales += row.package_price;
            total_technical_cost += row.technical_cost;
        }

        Self {
            filter,
            price_per_ticket,
            total_sales,
            total_technical_cost,
            clients,
        }
    }
}

// =============================================================================
//  2. DAILY TRANSACTIONS
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct AccountsDay {
    pub transaction_date: NaiveDate,
    pub accounts_created: i64,
    pub total_amount_used: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClosedAssetsDay {
    pub transaction_date: NaiveDate,
    pub assets_closed: i64,
    pub closed_assets_purchase_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDay {
    pub transaction_date: NaiveDate,
    pub accounts_created: i64,
    #[schema(value_type = f64)]
    pub total_amount_used: Decimal,
    pub assets_closed: i64,
    #[schema(value_type = f64)]
    pub closed_assets_purchase_price: Decimal,
}

impl TransactionDay {
    fn empty(transaction_date: NaiveDate) -> Self {
        Self {
            transaction_date,
            accounts_created: 0,
            total_amount_used: Decimal::ZERO,
            assets_closed: 0,
            closed_assets_purchase_price: Decimal::ZERO,
        }
    }
}

/// Merges both per-day series, keeps the days inside `filter`, newest first.
pub fn merge_transactions(
    accounts: Vec<AccountsDay>,
    closed: Vec<ClosedAssetsDay>,
    filter: &DateFilter,
) -> Vec<TransactionDay> {
    let mut days: BTreeMap<NaiveDate, TransactionDay> = BTreeMap::new();

    for a in accounts {
        let day = days
            .entry(a.transaction_date)
            .or_insert_with(|| TransactionDay::empty(a.transaction_date));
        day.accounts_created += a.accounts_created;
        day.total_amount_used += a.total_amount_used;
    }

    for c in closed {
        let day = days
            .entry(c.transaction_date)
            .or_insert_with(|| TransactionDay::empty(c.transaction_date));
        day.assets_closed += c.assets_closed;
        day.closed_assets_purchase_price += c.closed_assets_purchase_price;
    }

    days.into_values()
        .rev()
        .filter(|d| filter.contains(d.transaction_date))
        .collect()
}

// =============================================================================
//  3. EXPENSES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "expense_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Equipments,
    Fuel,
    Salary,
    Transport,
    Other,
}

impl ExpenseCategory {
    /// Case-insensitive match against the known categories.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EQUIPMENTS" => Some(ExpenseCategory::Equipments),
            "FUEL" => Some(ExpenseCategory::Fuel),
            "SALARY" => Some(ExpenseCategory::Salary),
            "TRANSPORT" => Some(ExpenseCategory::Transport),
            "OTHER" => Some(ExpenseCategory::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub category: ExpenseCategory,
    #[schema(example = "Generator diesel")]
    pub name: String,
    #[schema(value_type = f64, example = 150000.0)]
    pub amount: Decimal,
    pub details: Option<String>,
    pub registered_by: Option<Uuid>,
    pub registered_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpensePayload {
    #[schema(example = "fuel")]
    pub category: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub details: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseList {
    pub filter: DateFilter,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub expenses: Vec<Expense>,
}

impl ExpenseList {
    pub fn new(filter: DateFilter, expenses: Vec<Expense>) -> Self {
        let total_amount = expenses.iter().map(|e| e.amount).sum();
        Self {
            filter,
            total_amount,
            expenses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    #[test]
    fn transactions_merge_by_day_newest_first() {
        let accounts = vec![
            AccountsDay { transaction_date: day(1), accounts_created: 2, total_amount_used: Decimal::new(500, 0) },
            AccountsDay { transaction_date: day(3), accounts_created: 1, total_amount_used: Decimal::ZERO },
        ];
        let closed = vec![
            ClosedAssetsDay { transaction_date: day(3), assets_closed: 1, closed_assets_purchase_price: Decimal::new(90, 0) },
            ClosedAssetsDay { transaction_date: day(2), assets_closed: 4, closed_assets_purchase_price: Decimal::new(10, 0) },
        ];

        let merged = merge_transactions(accounts, closed, &DateFilter::All);
        let dates: Vec<_> = merged.iter().map(|d| d.transaction_date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
        assert_eq!(merged[0].accounts_created, 1);
        assert_eq!(merged[0].assets_closed, 1);
        assert_eq!(merged[1].accounts_created, 0);
        assert_eq!(merged[1].closed_assets_purchase_price, Decimal::new(10, 0));
    }

    #[test]
    fn transactions_respect_the_filter() {
        let closed = vec![
            ClosedAssetsDay { transaction_date: day(2), assets_closed: 1, closed_assets_purchase_price: Decimal::ZERO },
            ClosedAssetsDay { transaction_date: day(9), assets_closed: 1, closed_assets_purchase_price: Decimal::ZERO },
        ];
        let merged = merge_transactions(vec![], closed, &DateFilter::Day { date: day(9) });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].transaction_date, day(9));
    }

    #[test]
    fn overview_computes_technical_cost() {
        let row = |assets: i64, price: i64| FinanceClientRow {
            id: Uuid::new_v4(),
            full_name: "A".into(),
            account_number: "1".into(),
            phone_number: "0".into(),
            package: None,
            client_category: ClientCategory::Actual,
            status: ClientStatus::Connected,
            payment_date: day(1),
            created_at: Utc::now(),
            asset_count: assets,
            total_renewal_amount: Decimal::ZERO,
            package_price: Decimal::new(price, 0),
            technical_cost: Decimal::ZERO,
        };
        let overview = FinanceOverview::build(
            DateFilter::All,
            Decimal::new(2500, 2),
            vec![row(2, 100), row(0, 50)],
        );
        assert_eq!(overview.clients[0].technical_cost, Decimal::new(50, 0));
        assert_eq!(overview.total_technical_cost, Decimal::new(50, 0));
        assert_eq!(overview.total_sales, Decimal::new(150, 0));
    }

    #[test]
    fn expense_categories_parse_case_insensitively() {
        assert_eq!(ExpenseCategory::parse(" fuel "), Some(ExpenseCategory::Fuel));
        assert_eq!(ExpenseCategory::parse("Equipments"), Some(ExpenseCategory::Equipments));
        assert_eq!(ExpenseCategory::parse("snacks"), None);
        assert_eq!(serde_json::to_string(&ExpenseCategory::Transport).unwrap(), "\"TRANSPORT\"");
    }
}
