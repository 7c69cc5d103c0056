//! Common test utilities

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Setup test database - truncate tables for a fresh state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE transfers, accounts RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Insert an account row directly and return its id
pub async fn create_account(
    pool: &PgPool,
    name: &str,
    iban: &str,
    status: &str,
    available_amount: Decimal,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO accounts (name, iban, status, available_amount)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(iban)
    .bind(status)
    .bind(available_amount)
    .fetch_one(pool)
    .await
    .expect("Failed to seed account")
}

/// Read an account's balance straight from the table
pub async fn balance_of(pool: &PgPool, id: i64) -> Decimal {
    sqlx::query_scalar("SELECT available_amount FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

/// Count ledger rows for an account (either side)
pub async fn ledger_rows_for(pool: &PgPool, id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM transfers WHERE account_id = $1 OR beneficiary_account_id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("Failed to count ledger rows")
}
