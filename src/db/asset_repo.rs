// src/db/asset_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::asset::{Asset, AssetStatus, AssetView, CountBy, NewAsset, SerialLookupRow},
};

const ASSET_VIEW_SQL: &str = r#"
    SELECT a.*,
           e.full_name AS assigned_employee_name,
           c.account_number AS client_account_number,
           c.full_name AS client_full_name,
           c.phone_number AS client_phone_number,
           c.client_category
    FROM assets a
    LEFT JOIN employees e ON e.id = a.assigned_to
    LEFT JOIN clients c ON c.id = a.client_id
"#;

#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Router installed on connect or relocate. Serial collisions surface as SerialNumberInUse.
    pub async fn insert<'e, E>(&self, executor: E, asset: &NewAsset) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets
                (asset_name, asset_type, serial_number, status, assigned_to, client_id,
                 location, power_levels, router_used, router_name, router_password, port_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&asset.asset_name)
        .bind(&asset.asset_type)
        .bind(&asset.serial_number)
        .bind(asset.status)
        .bind(asset.assigned_to)
        .bind(asset.client_id)
        .bind(&asset.location)
        .bind(&asset.power_levels)
        .bind(&asset.router_name)
        .bind(&asset.router_password)
        .bind(&asset.port_number)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Rewrites an existing router row in place (relocation keeping the same serial).
    pub async fn reinstall<'e, E>(&self, executor: E, id: Uuid, asset: &NewAsset) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets
            SET asset_name = $2, asset_type = $3, status = $4, assigned_to = $5, client_id = $6,
                location = $7, router_used = $8, router_name = $8, router_password = $9,
                port_number = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&asset.asset_name)
        .bind(&asset.asset_type)
        .bind(asset.status)
        .bind(asset.assigned_to)
        .bind(asset.client_id)
        .bind(&asset.location)
        .bind(&asset.router_name)
        .bind(&asset.router_password)
        .bind(&asset.port_number)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)?
        .ok_or_else(|| AppError::NotFound("Asset not found.".to_string()))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Asset>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(asset)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: AssetStatus,
    ) -> Result<Option<Asset>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let asset = sqlx::query_as::<_, Asset>(
            "UPDATE assets SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(asset)
    }

    // Closing records the buy-back price and who bought the router.
    pub async fn close<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        purchase_price: Decimal,
        buyer_name: &str,
    ) -> Result<Option<Asset>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets
            SET status = 'Closed', purchase_price = $2, buyer_name = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(purchase_price)
        .bind(buyer_name)
        .fetch_optional(executor)
        .await?;
        Ok(asset)
    }

    pub async fn list_views(&self) -> Result<Vec<AssetView>, AppError> {
        let sql = format!("{ASSET_VIEW_SQL} ORDER BY a.created_at DESC");
        let rows = sqlx::query_as::<_, AssetView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_views_by_status(&self, status: AssetStatus) -> Result<Vec<AssetView>, AppError> {
        let sql = format!("{ASSET_VIEW_SQL} WHERE a.status = $1 ORDER BY a.updated_at DESC");
        let rows = sqlx::query_as::<_, AssetView>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Most recent asset carrying `serial`, joined with its client.
    pub async fn lookup_serial(&self, serial: &str) -> Result<Option<SerialLookupRow>, AppError> {
        let row = sqlx::query_as::<_, SerialLookupRow>(
            r#"
            SELECT a.id AS asset_id, a.status, a.asset_type, a.asset_name, a.location,
                   c.id AS client_id, c.account_number, c.full_name, c.phone_number
            FROM assets a
            LEFT JOIN clients c ON c.id = a.client_id
            WHERE a.serial_number = $1
            ORDER BY a.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(serial)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_by_type(&self) -> Result<Vec<CountBy>, AppError> {
        let rows = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT asset_type AS label, COUNT(*) AS count
            FROM assets
            WHERE asset_type IS NOT NULL
            GROUP BY asset_type
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_status(&self) -> Result<Vec<CountBy>, AppError> {
        let rows = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT status::text AS label, COUNT(*) AS count
            FROM assets
            GROUP BY status
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn total_value(&self) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(purchase_price), 0) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
