// src/db/schema.rs

use sqlx::PgPool;

use crate::common::error::AppError;

/// Credentials for the admin account created on an empty `employees` table.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub password: String,
    pub verification_code: String,
}

// Order matters: types before tables, referenced tables before referencing ones.
const ENUM_TYPES: &[&str] = &[
    r#"
    DO $$ BEGIN
        CREATE TYPE employee_role AS ENUM
            ('Admin', 'Manager', 'Dispatcher', 'Technician', 'Accounts', 'IT Support', 'Employee');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE employee_status AS ENUM ('Active', 'Pending', 'Suspended');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE client_status AS ENUM
            ('Pending', 'Connected', 'Relocated', 'Renewed', 'Reversed', 'Closed');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE client_category AS ENUM ('Actual', 'Virtual');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE asset_status AS ENUM
            ('Available', 'In Use', 'Relocated', 'Renewed', 'Reversed', 'Closed');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE expense_category AS ENUM ('EQUIPMENTS', 'FUEL', 'SALARY', 'TRANSPORT', 'OTHER');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
];

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username VARCHAR(100) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        full_name VARCHAR(200) NOT NULL,
        email VARCHAR(200) NOT NULL UNIQUE,
        status employee_status NOT NULL DEFAULT 'Pending',
        role employee_role NOT NULL DEFAULT 'Employee',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        full_name VARCHAR(200) NOT NULL,
        phone_number VARCHAR(50) NOT NULL,
        account_number VARCHAR(100) NOT NULL UNIQUE,
        package VARCHAR(100),
        client_category client_category NOT NULL DEFAULT 'Actual',
        virtual_location VARCHAR(255),
        ground_location VARCHAR(255),
        payment_date DATE NOT NULL,
        status client_status NOT NULL DEFAULT 'Pending',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        asset_name VARCHAR(200) NOT NULL,
        asset_type VARCHAR(100),
        serial_number VARCHAR(100) UNIQUE,
        status asset_status NOT NULL DEFAULT 'Available',
        assigned_to UUID REFERENCES employees(id) ON DELETE SET NULL,
        client_id UUID REFERENCES clients(id) ON DELETE SET NULL,
        purchase_date DATE,
        purchase_price NUMERIC(12, 2),
        location VARCHAR(255),
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS client_connections (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        technician_id UUID REFERENCES employees(id) ON DELETE SET NULL,
        serial_number VARCHAR(100) NOT NULL,
        power_levels VARCHAR(50),
        router_used VARCHAR(100),
        ground_location VARCHAR(255),
        port_number VARCHAR(50),
        connection_date DATE NOT NULL DEFAULT CURRENT_DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS client_relocations (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        old_location VARCHAR(255),
        new_location VARCHAR(255) NOT NULL,
        old_port VARCHAR(50),
        new_port VARCHAR(50),
        assigned_to UUID REFERENCES employees(id) ON DELETE SET NULL,
        old_router VARCHAR(100),
        new_router VARCHAR(100),
        old_serial_number VARCHAR(100),
        new_serial_number VARCHAR(100),
        relocated_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        relocation_date DATE NOT NULL DEFAULT CURRENT_DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS client_renewals (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        renewal_amount NUMERIC(12, 2) NOT NULL,
        renewed_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        renewal_date DATE NOT NULL DEFAULT CURRENT_DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS client_reversals (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        reversal_amount NUMERIC(12, 2) NOT NULL,
        reversed_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        reversal_date DATE NOT NULL DEFAULT CURRENT_DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS company_settings (
        id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        company_name VARCHAR(200) NOT NULL DEFAULT 'RUSHTACH',
        company_logo VARCHAR(255),
        company_address TEXT,
        company_phone VARCHAR(50),
        company_email VARCHAR(200),
        company_website VARCHAR(200),
        updated_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notification_settings (
        id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        sound_enabled BOOLEAN NOT NULL DEFAULT TRUE,
        notification_sound VARCHAR(100) NOT NULL DEFAULT 'default',
        volume INTEGER NOT NULL DEFAULT 50,
        email_new_client BOOLEAN NOT NULL DEFAULT TRUE,
        email_payment BOOLEAN NOT NULL DEFAULT TRUE,
        email_status_change BOOLEAN NOT NULL DEFAULT TRUE,
        system_alerts BOOLEAN NOT NULL DEFAULT TRUE,
        browser_notifications BOOLEAN NOT NULL DEFAULT TRUE,
        updated_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS packages (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        package_name VARCHAR(100) NOT NULL UNIQUE,
        sale_price NUMERIC(12, 2) NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets_settings (
        id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        default_asset_price NUMERIC(12, 2) NOT NULL DEFAULT 0,
        asset_depreciation_rate NUMERIC(5, 2) NOT NULL DEFAULT 0,
        auto_assign_assets BOOLEAN NOT NULL DEFAULT FALSE,
        require_asset_approval BOOLEAN NOT NULL DEFAULT FALSE,
        updated_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS technical_settings (
        id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        updated_by UUID REFERENCES employees(id) ON DELETE SET NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        category expense_category NOT NULL,
        name VARCHAR(200) NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        details TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

// Columns that arrived after the first release of each table.
const COLUMN_UPGRADES: &[&str] = &[
    "ALTER TABLE employees ADD COLUMN IF NOT EXISTS phone_number VARCHAR(50)",
    "ALTER TABLE employees ADD COLUMN IF NOT EXISTS profile_picture VARCHAR(255)",
    "ALTER TABLE employees ADD COLUMN IF NOT EXISTS verification_code VARCHAR(6)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS power_levels VARCHAR(50)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS router_used VARCHAR(100)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS router_name VARCHAR(100)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS router_password VARCHAR(255)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS port_number VARCHAR(50)",
    "ALTER TABLE assets ADD COLUMN IF NOT EXISTS buyer_name VARCHAR(200)",
    "ALTER TABLE client_connections ADD COLUMN IF NOT EXISTS router_name VARCHAR(100)",
    "ALTER TABLE client_connections ADD COLUMN IF NOT EXISTS router_password VARCHAR(255)",
    "ALTER TABLE clients ADD COLUMN IF NOT EXISTS relocation_count INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE clients ADD COLUMN IF NOT EXISTS renewal_count INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE clients ADD COLUMN IF NOT EXISTS work_order VARCHAR(100)",
    "ALTER TABLE clients ADD COLUMN IF NOT EXISTS current_asset_id UUID REFERENCES assets(id) ON DELETE SET NULL",
    "ALTER TABLE notification_settings ADD COLUMN IF NOT EXISTS relocation_days INTEGER NOT NULL DEFAULT 30",
    "ALTER TABLE notification_settings ADD COLUMN IF NOT EXISTS renewal_days INTEGER NOT NULL DEFAULT 30",
    "ALTER TABLE notification_settings ADD COLUMN IF NOT EXISTS closing_days INTEGER NOT NULL DEFAULT 30",
    "ALTER TABLE technical_settings ADD COLUMN IF NOT EXISTS price_per_ticket NUMERIC(12, 2) NOT NULL DEFAULT 0",
    "ALTER TABLE expenses ADD COLUMN IF NOT EXISTS registered_by UUID REFERENCES employees(id) ON DELETE SET NULL",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_clients_status ON clients (status)",
    "CREATE INDEX IF NOT EXISTS idx_clients_created_at ON clients (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_clients_phone_number ON clients (phone_number)",
    "CREATE INDEX IF NOT EXISTS idx_assets_client_id ON assets (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_assets_status ON assets (status)",
    "CREATE INDEX IF NOT EXISTS idx_connections_client_date ON client_connections (client_id, connection_date DESC, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_connections_technician ON client_connections (technician_id)",
    "CREATE INDEX IF NOT EXISTS idx_relocations_client ON client_relocations (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_renewals_client ON client_renewals (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_renewals_date ON client_renewals (renewal_date)",
    "CREATE INDEX IF NOT EXISTS idx_reversals_client ON client_reversals (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_created_at ON expenses (created_at)",
];

const SINGLETON_SEEDS: &[&str] = &[
    "INSERT INTO company_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
    "INSERT INTO notification_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
    "INSERT INTO assets_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
    "INSERT INTO technical_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
];

/// Every statement the bootstrap runs, in execution order.
pub fn statements() -> impl Iterator<Item = &'static str> {
    ENUM_TYPES
        .iter()
        .chain(TABLES)
        .chain(COLUMN_UPGRADES)
        .chain(INDEXES)
        .chain(SINGLETON_SEEDS)
        .copied()
}

/// Creates or upgrades the schema and seeds the default rows. Idempotent.
/// Returns `true` when the default admin was created.
pub async fn bootstrap(pool: &PgPool, admin: &AdminSeed) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    for statement in statements() {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    let employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&mut *tx)
        .await?;

    let admin_created = if employees == 0 {
        let password = admin.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Admin password hashing task failed: {}", e))??;

        sqlx::query(
            r#"
            INSERT INTO employees
                (username, password_hash, full_name, email, status, role, verification_code)
            VALUES ('admin', $1, 'Administrator', 'admin@rushtach.com', 'Active', 'Admin', $2)
            "#,
        )
        .bind(password_hash)
        .bind(&admin.verification_code)
        .execute(&mut *tx)
        .await?;
        true
    } else {
        false
    };

    tx.commit().await?;
    Ok(admin_created)
}

/// Wipes client operational data. Employees and settings survive.
pub async fn reset_client_data(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        TRUNCATE client_connections, client_relocations, client_renewals,
                 client_reversals, assets, clients CASCADE
        "#,
    )
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for sql in statements() {
            let sql = sql.trim();
            let guarded = sql.contains("IF NOT EXISTS")
                || sql.contains("duplicate_object")
                || sql.contains("ON CONFLICT");
            assert!(guarded, "statement is not re-runnable: {sql}");
        }
    }

    #[test]
    fn enums_and_referenced_tables_come_first() {
        let all: Vec<&str> = statements().collect();
        let position = |needle: &str| all.iter().position(|s| s.contains(needle)).unwrap();

        assert!(position("CREATE TYPE expense_category") < position("CREATE TABLE IF NOT EXISTS expenses"));
        assert!(position("CREATE TABLE IF NOT EXISTS employees") < position("CREATE TABLE IF NOT EXISTS assets"));
        assert!(position("CREATE TABLE IF NOT EXISTS assets") < position("current_asset_id"));
        assert!(position("price_per_ticket") < position("INSERT INTO technical_settings"));
    }

    #[tokio::test]
    async fn bootstrap_runs_twice_without_changes() {
        use crate::db::test_support::{admin_seed, test_db};

        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let count = move |sql: &'static str| async move {
            sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
        };

        let employees = count("SELECT COUNT(*) FROM employees").await;
        assert!(employees > 0, "the first bootstrap seeds an admin");

        assert!(!bootstrap(pool, &admin_seed()).await.unwrap());
        assert!(!bootstrap(pool, &admin_seed()).await.unwrap());

        assert_eq!(count("SELECT COUNT(*) FROM employees").await, employees);
        assert_eq!(count("SELECT COUNT(*) FROM company_settings").await, 1);
        assert_eq!(count("SELECT COUNT(*) FROM notification_settings").await, 1);
        assert_eq!(count("SELECT COUNT(*) FROM technical_settings").await, 1);
    }
}
