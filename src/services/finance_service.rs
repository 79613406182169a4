// src/services/finance_service.rs

use rust_decimal::Decimal;

use crate::{
    common::{dates::DateFilter, error::AppError},
    db::{AssetRepository, FinanceRepository, SettingsRepository},
    models::{
        asset::{AssetStatus, AssetView},
        auth::Session,
        finance::{
            CreateExpensePayload, Expense, ExpenseCategory, ExpenseList, FinanceOverview,
            TransactionDay, merge_transactions,
        },
    },
};

fn parse_category(raw: &str) -> Result<ExpenseCategory, AppError> {
    ExpenseCategory::parse(raw).ok_or_else(|| {
        AppError::BadRequest(
            "Category must be one of EQUIPMENTS, FUEL, SALARY, TRANSPORT or OTHER.".to_string(),
        )
    })
}

#[derive(Clone)]
pub struct FinanceService {
    finance_repo: FinanceRepository,
    settings_repo: SettingsRepository,
    asset_repo: AssetRepository,
}

impl FinanceService {
    pub fn new(
        finance_repo: FinanceRepository,
        settings_repo: SettingsRepository,
        asset_repo: AssetRepository,
    ) -> Self {
        Self {
            finance_repo,
            settings_repo,
            asset_repo,
        }
    }

    // --- Reports ---

    pub async fn overview(&self, filter: DateFilter) -> Result<FinanceOverview, AppError> {
        let price_per_ticket = self.settings_repo.price_per_ticket().await?;
        let rows = self.finance_repo.client_rows(&filter).await?;
        Ok(FinanceOverview::build(filter, price_per_ticket, rows))
    }

    pub async fn transactions(&self, filter: &DateFilter) -> Result<Vec<TransactionDay>, AppError> {
        let (accounts, closed) = tokio::try_join!(
            self.finance_repo.accounts_by_day(),
            self.finance_repo.closed_assets_by_day(),
        )?;
        Ok(merge_transactions(accounts, closed, filter))
    }

    pub async fn closed_assets(&self) -> Result<Vec<AssetView>, AppError> {
        self.asset_repo.list_views_by_status(AssetStatus::Closed).await
    }

    // --- Expenses ---

    pub async fn register_expense(
        &self,
        session: &Session,
        payload: &CreateExpensePayload,
    ) -> Result<Expense, AppError> {
        let category = parse_category(&payload.category)?;
        if payload.amount < Decimal::ZERO {
            return Err(AppError::BadRequest("Amount cannot be negative.".to_string()));
        }
        let details = payload
            .details
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let expense = self
            .finance_repo
            .create_expense(
                category,
                payload.name.trim(),
                payload.amount,
                details,
                session.employee.id,
            )
            .await?;

        tracing::info!(
            "🧾 Expense {:?} '{}' ({}) registered by {}",
            expense.category,
            expense.name,
            expense.amount,
            session.employee.username
        );
        Ok(expense)
    }

    pub async fn expenses(&self, filter: DateFilter) -> Result<ExpenseList, AppError> {
        let expenses = self.finance_repo.list_expenses(&filter, None).await?;
        Ok(ExpenseList::new(filter, expenses))
    }

    pub async fn my_expenses(&self, session: &Session, filter: DateFilter) -> Result<ExpenseList, AppError> {
        let expenses = self
            .finance_repo
            .list_expenses(&filter, Some(session.employee.id))
            .await?;
        Ok(ExpenseList::new(filter, expenses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, fixtures::session};

    #[test]
    fn categories_match_case_insensitively() {
        assert_eq!(parse_category(" fuel ").unwrap(), ExpenseCategory::Fuel);
        assert_eq!(parse_category("Equipments").unwrap(), ExpenseCategory::Equipments);
        assert!(matches!(parse_category("snacks"), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn negative_expense_is_rejected_before_insert() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let svc = FinanceService::new(
            FinanceRepository::new(pool.clone()),
            SettingsRepository::new(pool.clone()),
            AssetRepository::new(pool),
        );
        let payload = CreateExpensePayload {
            category: "FUEL".into(),
            name: "Diesel".into(),
            amount: Decimal::new(-1, 0),
            details: None,
        };
        let result = svc.register_expense(&session(Role::Accounts, None), &payload).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
