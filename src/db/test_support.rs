// src/db/test_support.rs

use std::sync::OnceLock;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    db::{ClientRepository, EmployeeRepository, employee_repo::NewEmployee, schema::AdminSeed},
    models::{
        auth::Session,
        client::{Client, ClientCategory, NewClient},
    },
};

// Database tests share one database; they run one at a time so bootstrap DDL
// never overlaps with another test's transactions.
static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A bootstrapped pool, held exclusively until dropped.
pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

pub fn admin_seed() -> AdminSeed {
    AdminSeed {
        password: "admin-test-password".to_string(),
        verification_code: "000000".to_string(),
    }
}

/// `None` (the test is skipped) unless `TEST_DATABASE_URL` or `DATABASE_URL` is set.
pub async fn test_db() -> Option<TestDb> {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let guard = DB_LOCK.get_or_init(|| Mutex::new(())).lock().await;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("test database is reachable");
    crate::db::schema::bootstrap(&pool, &admin_seed())
        .await
        .expect("schema bootstrap");

    Some(TestDb {
        pool,
        _guard: guard,
    })
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

/// Session for a freshly inserted employee.
pub async fn session_in(pool: &PgPool) -> Session {
    let username = unique("tech");
    let email = format!("{username}@example.com");
    let code = format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000);
    let employee = EmployeeRepository::new(pool.clone())
        .create(
            pool,
            NewEmployee {
                username: &username,
                password_hash: "not-a-real-hash",
                full_name: "Test Technician",
                email: &email,
                phone_number: "0700000000",
                verification_code: &code,
            },
        )
        .await
        .expect("insert employee");
    Session {
        employee,
        switched_role: None,
    }
}

pub async fn pending_client(pool: &PgPool) -> Client {
    ClientRepository::new(pool.clone())
        .create(
            pool,
            &NewClient {
                full_name: "Test Client".to_string(),
                phone_number: "0711111111".to_string(),
                account_number: unique("ACC-"),
                package: Some("Basic".to_string()),
                client_category: ClientCategory::Actual,
                virtual_location: None,
                ground_location: Some("Kampala Road".to_string()),
                payment_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 24).expect("valid date"),
                work_order: None,
            },
        )
        .await
        .expect("insert client")
}

/// Rows in `table` belonging to `client_id`.
pub async fn count_rows(pool: &PgPool, table: &str, client_id: Uuid) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE client_id = $1");
    sqlx::query_scalar(&sql)
        .bind(client_id)
        .fetch_one(pool)
        .await
        .expect("count rows")
}
