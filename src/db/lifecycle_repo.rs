// src/db/lifecycle_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        client::{Client, ClientStatus},
        lifecycle::{ClientConnection, ClientRelocation, ClientRenewal, ClientReversal},
    },
};

/// Connection row written when a technician installs a router.
#[derive(Debug, Clone)]
pub struct NewConnection<'a> {
    pub client_id: Uuid,
    pub technician_id: Uuid,
    pub serial_number: &'a str,
    pub power_levels: Option<&'a str>,
    pub router_name: &'a str,
    pub router_password: &'a str,
    pub ground_location: Option<&'a str>,
    pub port_number: Option<&'a str>,
}

/// Old and new site details captured by a relocation.
#[derive(Debug, Clone)]
pub struct NewRelocation<'a> {
    pub client_id: Uuid,
    pub old_location: Option<&'a str>,
    pub new_location: &'a str,
    pub old_port: Option<&'a str>,
    pub new_port: &'a str,
    pub assigned_to: Uuid,
    pub old_router: Option<&'a str>,
    pub new_router: &'a str,
    pub old_serial_number: Option<&'a str>,
    pub new_serial_number: &'a str,
    pub relocated_by: Uuid,
}

#[derive(Clone)]
pub struct LifecycleRepository {
    pool: PgPool,
}

impl LifecycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // History rows
    // ---

    pub async fn insert_connection<'e, E>(
        &self,
        executor: E,
        conn: &NewConnection<'_>,
    ) -> Result<ClientConnection, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClientConnection>(
            r#"
            INSERT INTO client_connections
                (client_id, technician_id, serial_number, power_levels, router_used,
                 router_name, router_password, ground_location, port_number, connection_date)
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, CURRENT_DATE)
            RETURNING *
            "#,
        )
        .bind(conn.client_id)
        .bind(conn.technician_id)
        .bind(conn.serial_number)
        .bind(conn.power_levels)
        .bind(conn.router_name)
        .bind(conn.router_password)
        .bind(conn.ground_location)
        .bind(conn.port_number)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn latest_connection<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
    ) -> Result<Option<ClientConnection>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClientConnection>(
            r#"
            SELECT * FROM client_connections
            WHERE client_id = $1
            ORDER BY connection_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(client_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Points the latest connection at the relocated site and its new installer.
    pub async fn update_connection_site<'e, E>(
        &self,
        executor: E,
        connection_id: Uuid,
        relocation: &NewRelocation<'_>,
        router_password: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE client_connections
            SET router_used = $2, router_name = $2, router_password = $3, serial_number = $4,
                ground_location = $5, port_number = $6, technician_id = $7
            WHERE id = $1
            "#,
        )
        .bind(connection_id)
        .bind(relocation.new_router)
        .bind(router_password)
        .bind(relocation.new_serial_number)
        .bind(relocation.new_location)
        .bind(relocation.new_port)
        .bind(relocation.assigned_to)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_relocation<'e, E>(
        &self,
        executor: E,
        relocation: &NewRelocation<'_>,
    ) -> Result<ClientRelocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClientRelocation>(
            r#"
            INSERT INTO client_relocations
                (client_id, old_location, new_location, old_port, new_port, assigned_to,
                 old_router, new_router, old_serial_number, new_serial_number,
                 relocated_by, relocation_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, CURRENT_DATE)
            RETURNING *
            "#,
        )
        .bind(relocation.client_id)
        .bind(relocation.old_location)
        .bind(relocation.new_location)
        .bind(relocation.old_port)
        .bind(relocation.new_port)
        .bind(relocation.assigned_to)
        .bind(relocation.old_router)
        .bind(relocation.new_router)
        .bind(relocation.old_serial_number)
        .bind(relocation.new_serial_number)
        .bind(relocation.relocated_by)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_renewal<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        amount: Decimal,
        renewed_by: Uuid,
    ) -> Result<ClientRenewal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClientRenewal>(
            r#"
            INSERT INTO client_renewals (client_id, renewal_amount, renewed_by, renewal_date)
            VALUES ($1, $2, $3, CURRENT_DATE)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(amount)
        .bind(renewed_by)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_reversal<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        amount: Decimal,
        reversed_by: Uuid,
    ) -> Result<ClientReversal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClientReversal>(
            r#"
            INSERT INTO client_reversals (client_id, reversal_amount, reversed_by, reversal_date)
            VALUES ($1, $2, $3, CURRENT_DATE)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(amount)
        .bind(reversed_by)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    // ---
    // Client state
    // ---

    pub async fn mark_connected<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        ground_location: Option<&str>,
        asset_id: Uuid,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET status = 'Connected', ground_location = $2, current_asset_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(ground_location)
        .bind(asset_id)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    pub async fn mark_relocated<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        new_location: &str,
        asset_id: Uuid,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET status = 'Relocated', ground_location = $2, current_asset_id = $3,
                relocation_count = relocation_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(new_location)
        .bind(asset_id)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    pub async fn mark_renewed<'e, E>(&self, executor: E, client_id: Uuid) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET status = 'Renewed', renewal_count = renewal_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(client_id)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        status: ClientStatus,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            "UPDATE clients SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(client_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    // ---
    // History reads
    // ---

    pub async fn connections(&self, client_id: Uuid) -> Result<Vec<ClientConnection>, AppError> {
        let rows = sqlx::query_as::<_, ClientConnection>(
            "SELECT * FROM client_connections WHERE client_id = $1 \
             ORDER BY connection_date DESC, created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn relocations(&self, client_id: Uuid) -> Result<Vec<ClientRelocation>, AppError> {
        let rows = sqlx::query_as::<_, ClientRelocation>(
            "SELECT * FROM client_relocations WHERE client_id = $1 \
             ORDER BY relocation_date DESC, created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn renewals(&self, client_id: Uuid) -> Result<Vec<ClientRenewal>, AppError> {
        let rows = sqlx::query_as::<_, ClientRenewal>(
            "SELECT * FROM client_renewals WHERE client_id = $1 \
             ORDER BY renewal_date DESC, created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn reversals(&self, client_id: Uuid) -> Result<Vec<ClientReversal>, AppError> {
        let rows = sqlx::query_as::<_, ClientReversal>(
            "SELECT * FROM client_reversals WHERE client_id = $1 \
             ORDER BY reversal_date DESC, created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
