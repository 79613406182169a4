// src/services/employee_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::auth::{Employee, EmployeeSearchHit, EmployeeWithAssets, UpdateEmployeePayload},
};

const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct EmployeeService {
    employee_repo: EmployeeRepository,
}

impl EmployeeService {
    pub fn new(employee_repo: EmployeeRepository) -> Self {
        Self { employee_repo }
    }

    pub async fn list(&self) -> Result<Vec<EmployeeWithAssets>, AppError> {
        self.employee_repo.list_with_asset_counts().await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateEmployeePayload) -> Result<Employee, AppError> {
        let employee = self
            .employee_repo
            .update_status_and_role(id, payload.status, payload.role)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found.".to_string()))?;

        tracing::info!(
            "👥 Employee {} set to {:?} / {}",
            employee.username,
            employee.status,
            employee.role
        );
        Ok(employee)
    }

    /// Short queries return nothing rather than the whole staff list.
    pub async fn search(&self, query: &str) -> Result<Vec<EmployeeSearchHit>, AppError> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        self.employee_repo.search_active(query, SEARCH_LIMIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_character_search_skips_the_database() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let svc = EmployeeService::new(EmployeeRepository::new(pool));
        assert!(svc.search(" a ").await.unwrap().is_empty());
        assert!(svc.search("").await.unwrap().is_empty());
    }
}
