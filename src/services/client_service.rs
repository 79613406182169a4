// src/services/client_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::client::{Client, ClientConnectionView, ClientPayload, ClientStatus, NewClient, PhoneUsage},
};

#[derive(Clone)]
pub struct ClientService {
    client_repo: ClientRepository,
}

fn prepare(payload: ClientPayload) -> Result<NewClient, AppError> {
    payload
        .into_new_client()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))
}

impl ClientService {
    pub fn new(client_repo: ClientRepository) -> Self {
        Self { client_repo }
    }

    pub async fn register(&self, payload: ClientPayload) -> Result<Client, AppError> {
        let new_client = prepare(payload)?;
        let pool = self.client_repo.pool();
        let client = self.client_repo.create(pool, &new_client).await?;
        tracing::info!("📇 Client {} registered ({})", client.account_number, client.id);
        Ok(client)
    }

    pub async fn edit(&self, id: Uuid, payload: ClientPayload) -> Result<Client, AppError> {
        let new_client = prepare(payload)?;
        self.client_repo
            .update(id, &new_client)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found.".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.client_repo.delete(id).await? {
            return Err(AppError::NotFound("Client not found.".to_string()));
        }
        tracing::info!("🗑️ Client {} deleted", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        self.client_repo
            .find_by_id(self.client_repo.pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found.".to_string()))
    }

    pub async fn phone_usage(&self, phone: &str) -> Result<PhoneUsage, AppError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(PhoneUsage { count: 0, used: false });
        }
        let count = self.client_repo.count_by_phone(phone).await?;
        Ok(PhoneUsage { count, used: count > 0 })
    }

    pub async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        self.client_repo.list_all().await
    }

    pub async fn list_pending(&self) -> Result<Vec<Client>, AppError> {
        self.client_repo.list_by_status(&[ClientStatus::Pending]).await
    }

    pub async fn list_failed(&self) -> Result<Vec<Client>, AppError> {
        self.client_repo
            .list_by_status(&[ClientStatus::Closed, ClientStatus::Reversed])
            .await
    }

    pub async fn list_connected(&self) -> Result<Vec<ClientConnectionView>, AppError> {
        self.client_repo.list_open_with_connection().await
    }

    pub async fn list_dispatcher_connected(&self) -> Result<Vec<ClientConnectionView>, AppError> {
        self.client_repo.list_connected_with_connection().await
    }

    pub async fn list_mine(&self, employee_id: Uuid) -> Result<Vec<ClientConnectionView>, AppError> {
        self.client_repo.list_connected_by(employee_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::ClientCategory;
    use chrono::NaiveDate;

    #[test]
    fn category_rule_violations_become_bad_requests() {
        let payload = ClientPayload {
            full_name: "A".into(),
            phone_number: "0700".into(),
            account_number: "X".into(),
            package: None,
            client_category: ClientCategory::Virtual,
            virtual_location: None,
            ground_location: Some("Kampala".into()),
            payment_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            work_order: None,
        };
        match prepare(payload) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Virtual")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
