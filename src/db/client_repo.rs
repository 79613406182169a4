// src/db/client_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::client::{Client, ClientConnectionView, ClientStatus, NewClient},
};

// Client joined with its latest connection (by connection date, then insertion time).
const CONNECTION_VIEW_SQL: &str = r#"
    SELECT c.*,
           lc.serial_number,
           lc.power_levels,
           lc.router_used,
           lc.router_name,
           lc.router_password,
           lc.ground_location AS connection_location,
           lc.port_number,
           lc.connection_date,
           t.full_name AS technician_name,
           (CURRENT_DATE - c.created_at::date)::int4 AS days_in_system,
           (CURRENT_DATE - lc.connection_date)::int4 AS days_since_connection
    FROM clients c
    LEFT JOIN LATERAL (
        SELECT cc.*
        FROM client_connections cc
        WHERE cc.client_id = c.id
        ORDER BY cc.connection_date DESC, cc.created_at DESC
        LIMIT 1
    ) lc ON TRUE
    LEFT JOIN employees t ON t.id = lc.technician_id
"#;

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(&self, executor: E, client: &NewClient) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients
                (full_name, phone_number, account_number, package, client_category,
                 virtual_location, ground_location, payment_date, work_order, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Pending')
            RETURNING *
            "#,
        )
        .bind(&client.full_name)
        .bind(&client.phone_number)
        .bind(&client.account_number)
        .bind(&client.package)
        .bind(client.client_category)
        .bind(&client.virtual_location)
        .bind(&client.ground_location)
        .bind(client.payment_date)
        .bind(&client.work_order)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    // Status is deliberately absent: only lifecycle actions move it.
    pub async fn update(&self, id: Uuid, client: &NewClient) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET full_name = $2, phone_number = $3, account_number = $4, package = $5,
                client_category = $6, virtual_location = $7, ground_location = $8,
                payment_date = $9, work_order = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&client.full_name)
        .bind(&client.phone_number)
        .bind(&client.account_number)
        .bind(&client.package)
        .bind(client.client_category)
        .bind(&client.virtual_location)
        .bind(&client.ground_location)
        .bind(client.payment_date)
        .bind(&client.work_order)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    /// Loads the client and holds a row lock until the transaction ends.
    pub async fn lock_for_update(&self, conn: &mut PgConnection, id: Uuid) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found.".to_string()))
    }

    pub async fn count_by_phone(&self, phone: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE phone_number = $1")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    pub async fn list_by_status(&self, statuses: &[ClientStatus]) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE status = ANY($1) ORDER BY created_at DESC",
        )
        .bind(statuses.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    // Everything not yet closed, with latest connection details.
    pub async fn list_open_with_connection(&self) -> Result<Vec<ClientConnectionView>, AppError> {
        let sql = format!("{CONNECTION_VIEW_SQL} WHERE c.status <> 'Closed' ORDER BY c.created_at DESC");
        let rows = sqlx::query_as::<_, ClientConnectionView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_connected_with_connection(&self) -> Result<Vec<ClientConnectionView>, AppError> {
        let sql = format!(
            "{CONNECTION_VIEW_SQL} WHERE c.status = 'Connected' \
             ORDER BY lc.connection_date DESC NULLS LAST, c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ClientConnectionView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Connected clients whose most recent connection was done by `technician_id`.
    pub async fn list_connected_by(&self, technician_id: Uuid) -> Result<Vec<ClientConnectionView>, AppError> {
        let sql = format!(
            "{CONNECTION_VIEW_SQL} WHERE lc.technician_id = $1 AND c.status = 'Connected' \
             ORDER BY lc.connection_date DESC, c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ClientConnectionView>(&sql)
            .bind(technician_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
