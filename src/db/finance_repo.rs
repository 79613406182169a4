// src/db/finance_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{dates::DateFilter, error::AppError},
    models::finance::{AccountsDay, ClosedAssetsDay, Expense, ExpenseCategory, FinanceClientRow},
};

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Overview
    // ---

    /// One row per client; aggregates come from subqueries so the joins never fan out.
    pub async fn client_rows(&self, filter: &DateFilter) -> Result<Vec<FinanceClientRow>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT c.id, c.full_name, c.account_number, c.phone_number, c.package,
                   c.client_category, c.status, c.payment_date, c.created_at,
                   (SELECT COUNT(*) FROM assets a WHERE a.client_id = c.id) AS asset_count,
                   (SELECT COALESCE(SUM(r.renewal_amount), 0)
                      FROM client_renewals r WHERE r.client_id = c.id) AS total_renewal_amount,
                   COALESCE(p.sale_price, 0) AS package_price
            FROM clients c
            LEFT JOIN packages p ON p.package_name = c.package AND p.is_active = TRUE
            WHERE 1 = 1
            "#,
        );
        filter.push_predicate(&mut qb, "c.created_at");
        qb.push(" ORDER BY c.created_at DESC");

        let rows = qb
            .build_query_as::<FinanceClientRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // ---
    // Daily transactions
    // ---

    pub async fn accounts_by_day(&self) -> Result<Vec<AccountsDay>, AppError> {
        let rows = sqlx::query_as::<_, AccountsDay>(
            r#"
            SELECT t.day AS transaction_date,
                   COUNT(*) AS accounts_created,
                   COALESCE(SUM(t.renewed), 0) AS total_amount_used
            FROM (
                SELECT c.created_at::date AS day,
                       (SELECT COALESCE(SUM(r.renewal_amount), 0)
                          FROM client_renewals r WHERE r.client_id = c.id) AS renewed
                FROM clients c
            ) t
            GROUP BY t.day
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn closed_assets_by_day(&self) -> Result<Vec<ClosedAssetsDay>, AppError> {
        let rows = sqlx::query_as::<_, ClosedAssetsDay>(
            r#"
            SELECT updated_at::date AS transaction_date,
                   COUNT(*) AS assets_closed,
                   COALESCE(SUM(purchase_price), 0) AS closed_assets_purchase_price
            FROM assets
            WHERE status = 'Closed'
            GROUP BY updated_at::date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Expenses
    // ---

    pub async fn create_expense(
        &self,
        category: ExpenseCategory,
        name: &str,
        amount: Decimal,
        details: Option<&str>,
        registered_by: Uuid,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            WITH inserted AS (
                INSERT INTO expenses (category, name, amount, details, registered_by)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT i.id, i.category, i.name, i.amount, i.details, i.registered_by,
                   e.full_name AS registered_by_name, i.created_at
            FROM inserted i
            LEFT JOIN employees e ON e.id = i.registered_by
            "#,
        )
        .bind(category)
        .bind(name)
        .bind(amount)
        .bind(details)
        .bind(registered_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(expense)
    }

    /// Expenses inside `filter`, optionally only those registered by one employee.
    pub async fn list_expenses(
        &self,
        filter: &DateFilter,
        registered_by: Option<Uuid>,
    ) -> Result<Vec<Expense>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT x.id, x.category, x.name, x.amount, x.details, x.registered_by,
                   e.full_name AS registered_by_name, x.created_at
            FROM expenses x
            LEFT JOIN employees e ON e.id = x.registered_by
            WHERE 1 = 1
            "#,
        );
        if let Some(employee_id) = registered_by {
            qb.push(" AND x.registered_by = ").push_bind(employee_id);
        }
        filter.push_predicate(&mut qb, "x.created_at");
        qb.push(" ORDER BY x.created_at DESC");

        let rows = qb.build_query_as::<Expense>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
