// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_unique_violation},
        error::AppError,
    },
    models::auth::{Employee, EmployeeSearchHit, EmployeeStatus, EmployeeWithAssets, Role},
};

const EMPLOYEE_COLUMNS: &str = r#"
    id, username, password_hash, full_name, email, phone_number, profile_picture,
    status, role, created_at, updated_at
"#;

/// Fields of a freshly signed-up employee.
#[derive(Debug, Clone)]
pub struct NewEmployee<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
    pub verification_code: &'a str,
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(employee)
    }

    // Codes are not unique; the oldest holder wins, which keeps the seeded admin stable.
    pub async fn find_by_verification_code(&self, code: &str) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE verification_code = $1 \
             ORDER BY created_at ASC LIMIT 1"
        );
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    /// Whether `email` belongs to an employee other than `exclude`.
    pub async fn email_taken<'e, E>(
        &self,
        executor: E,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM employees
                WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    pub async fn username_exists<'e, E>(&self, executor: E, username: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE username = $1)")
                .bind(username)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    // New accounts always start Pending with the base Employee role.
    pub async fn create<'e, E>(&self, executor: E, new: NewEmployee<'_>) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO employees
                (username, password_hash, full_name, email, phone_number, verification_code, status, role)
            VALUES ($1, $2, $3, $4, $5, $6, 'Pending', 'Employee')
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(new.username)
            .bind(new.password_hash)
            .bind(new.full_name)
            .bind(new.email)
            .bind(new.phone_number)
            .bind(new.verification_code)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    /// Profile edit. A `None` password hash keeps the stored one.
    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        full_name: &str,
        email: &str,
        phone_number: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE employees
            SET full_name = $2,
                email = $3,
                phone_number = $4,
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .bind(full_name)
            .bind(email)
            .bind(phone_number)
            .bind(password_hash)
            .fetch_optional(executor)
            .await
            .map_err(map_unique_violation)?
            .ok_or_else(|| AppError::NotFound("Employee not found.".to_string()))
    }

    pub async fn update_status_and_role(
        &self,
        id: Uuid,
        status: EmployeeStatus,
        role: Role,
    ) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            r#"
            UPDATE employees SET status = $2, role = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        );
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .bind(status)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    // Newest first, with the number of assets assigned to each.
    pub async fn list_with_asset_counts(&self) -> Result<Vec<EmployeeWithAssets>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeWithAssets>(
            r#"
            SELECT e.id, e.username, e.password_hash, e.full_name, e.email, e.phone_number,
                   e.profile_picture, e.status, e.role,
                   e.created_at, e.updated_at,
                   (SELECT COUNT(*) FROM assets a WHERE a.assigned_to = e.id) AS asset_count
            FROM employees e
            ORDER BY e.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn search_active(&self, term: &str, limit: i64) -> Result<Vec<EmployeeSearchHit>, AppError> {
        let hits = sqlx::query_as::<_, EmployeeSearchHit>(
            r#"
            SELECT id, full_name, username, role
            FROM employees
            WHERE status = 'Active'
              AND (full_name ILIKE $1 OR username ILIKE $1)
            ORDER BY full_name ASC
            LIMIT $2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(hits)
    }
}
