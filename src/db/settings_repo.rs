// src/db/settings_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::NotificationThresholds,
        settings::{
            AssetsSettings, AssetsSettingsInput, CompanySettings, NotificationSettings, Package,
            TechnicalSettings, UpdateCompanyPayload, UpdateNotificationsPayload,
        },
    },
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // The settings tables hold a single row (id = 1). A missing row is recreated with defaults.
    async fn singleton<T>(&self, conn: &mut PgConnection, table: &str) -> Result<T, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let select = format!("SELECT * FROM {table} WHERE id = 1");
        if let Some(row) = sqlx::query_as::<_, T>(&select)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(row);
        }

        let insert = format!(
            "INSERT INTO {table} (id) VALUES (1) ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id RETURNING *"
        );
        let row = sqlx::query_as::<_, T>(&insert).fetch_one(&mut *conn).await?;
        Ok(row)
    }

    // ---
    // Company
    // ---

    pub async fn company(&self) -> Result<CompanySettings, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.singleton(&mut conn, "company_settings").await
    }

    pub async fn update_company(
        &self,
        input: &UpdateCompanyPayload,
        updated_by: Uuid,
    ) -> Result<CompanySettings, AppError> {
        let settings = sqlx::query_as::<_, CompanySettings>(
            r#"
            INSERT INTO company_settings
                (id, company_name, company_address, company_phone, company_email, company_website,
                 updated_by, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                company_address = EXCLUDED.company_address,
                company_phone = EXCLUDED.company_phone,
                company_email = EXCLUDED.company_email,
                company_website = EXCLUDED.company_website,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(input.company_name.trim())
        .bind(&input.company_address)
        .bind(&input.company_phone)
        .bind(&input.company_email)
        .bind(&input.company_website)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    // ---
    // Notifications
    // ---

    pub async fn notifications(&self) -> Result<NotificationSettings, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.singleton(&mut conn, "notification_settings").await
    }

    /// Expects an already normalized payload.
    pub async fn update_notifications(
        &self,
        input: &UpdateNotificationsPayload,
        updated_by: Uuid,
    ) -> Result<NotificationSettings, AppError> {
        let settings = sqlx::query_as::<_, NotificationSettings>(
            r#"
            INSERT INTO notification_settings
                (id, sound_enabled, notification_sound, volume, email_new_client, email_payment,
                 email_status_change, system_alerts, browser_notifications,
                 relocation_days, renewal_days, closing_days, updated_by, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (id) DO UPDATE SET
                sound_enabled = EXCLUDED.sound_enabled,
                notification_sound = EXCLUDED.notification_sound,
                volume = EXCLUDED.volume,
                email_new_client = EXCLUDED.email_new_client,
                email_payment = EXCLUDED.email_payment,
                email_status_change = EXCLUDED.email_status_change,
                system_alerts = EXCLUDED.system_alerts,
                browser_notifications = EXCLUDED.browser_notifications,
                relocation_days = EXCLUDED.relocation_days,
                renewal_days = EXCLUDED.renewal_days,
                closing_days = EXCLUDED.closing_days,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(input.sound_enabled)
        .bind(&input.notification_sound)
        .bind(input.volume)
        .bind(input.email_new_client)
        .bind(input.email_payment)
        .bind(input.email_status_change)
        .bind(input.system_alerts)
        .bind(input.browser_notifications)
        .bind(input.relocation_days)
        .bind(input.renewal_days)
        .bind(input.closing_days)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    pub async fn thresholds(&self) -> Result<NotificationThresholds, AppError> {
        let row: Option<(i32, i32, i32)> = sqlx::query_as(
            "SELECT relocation_days, renewal_days, closing_days FROM notification_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|(relocation_days, renewal_days, closing_days)| NotificationThresholds {
                relocation_days,
                renewal_days,
                closing_days,
            })
            .unwrap_or_default())
    }

    // ---
    // Finance
    // ---

    pub async fn packages(&self) -> Result<Vec<Package>, AppError> {
        let packages = sqlx::query_as::<_, Package>("SELECT * FROM packages ORDER BY package_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(packages)
    }

    pub async fn client_package_names(&self) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT TRIM(package)
            FROM clients
            WHERE package IS NOT NULL AND TRIM(package) <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn assets_settings(&self, conn: &mut PgConnection) -> Result<AssetsSettings, AppError> {
        self.singleton(conn, "assets_settings").await
    }

    pub async fn technical_settings(&self, conn: &mut PgConnection) -> Result<TechnicalSettings, AppError> {
        self.singleton(conn, "technical_settings").await
    }

    pub async fn price_per_ticket(&self) -> Result<Decimal, AppError> {
        let price: Option<Decimal> =
            sqlx::query_scalar("SELECT price_per_ticket FROM technical_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(price.unwrap_or(Decimal::ZERO))
    }

    pub async fn upsert_package<'e, E>(&self, executor: E, name: &str, price: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO packages (package_name, sale_price, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (package_name) DO UPDATE SET
                sale_price = EXCLUDED.sale_price,
                updated_at = NOW()
            "#,
        )
        .bind(name)
        .bind(price)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn upsert_assets_settings<'e, E>(
        &self,
        executor: E,
        input: &AssetsSettingsInput,
        updated_by: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO assets_settings
                (id, default_asset_price, asset_depreciation_rate, auto_assign_assets,
                 require_asset_approval, updated_by, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, NOW())
            ON CONFLICT (id) DO UPDATE SET
                default_asset_price = EXCLUDED.default_asset_price,
                asset_depreciation_rate = EXCLUDED.asset_depreciation_rate,
                auto_assign_assets = EXCLUDED.auto_assign_assets,
                require_asset_approval = EXCLUDED.require_asset_approval,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            "#,
        )
        .bind(input.default_asset_price)
        .bind(input.asset_depreciation_rate)
        .bind(input.auto_assign_assets)
        .bind(input.require_asset_approval)
        .bind(updated_by)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_price_per_ticket<'e, E>(
        &self,
        executor: E,
        price: Decimal,
        updated_by: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO technical_settings (id, price_per_ticket, updated_by, updated_at)
            VALUES (1, $1, $2, NOW())
            ON CONFLICT (id) DO UPDATE SET
                price_per_ticket = EXCLUDED.price_per_ticket,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            "#,
        )
        .bind(price)
        .bind(updated_by)
        .execute(executor)
        .await?;
        Ok(())
    }
}
