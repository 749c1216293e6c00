use crate::{
    error::{AppError, Result},
    models::weekly_code::WeeklyCode,
};
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

/// A helper function to map a `tokio_postgres::Row` to a `WeeklyCode`.
fn row_to_code(row: &Row) -> Result<WeeklyCode> {
    Ok(WeeklyCode {
        week_start: row.try_get("week_start").map_err(|_| AppError::MissingData("week_start".to_string()))?,
        secret_code: row.try_get("secret_code").map_err(|_| AppError::MissingData("secret_code".to_string()))?,
        is_active: row.try_get("is_active").map_err(|_| AppError::MissingData("is_active".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
    })
}

/// Finds the currently active weekly code, most recent week first.
pub async fn find_active(pool: &Pool) -> Result<Option<WeeklyCode>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT week_start, secret_code, is_active, created_at
            FROM secret_menu_codes
            WHERE is_active = true
            ORDER BY week_start DESC
            LIMIT 1
            "#,
            &[],
        )
        .await?;
    row.map(|r| row_to_code(&r)).transpose()
}

/// Creates or replaces the code for the given week.
///
/// This is the service-side face of the weekly "ensure" operation: the row
/// for the current week is created at week start and superseded when a new
/// week begins.
pub async fn upsert(pool: &Pool, week_start: NaiveDate, secret_code: &str) -> Result<WeeklyCode> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO secret_menu_codes (week_start, secret_code, is_active)
            VALUES ($1, $2, true)
            ON CONFLICT (week_start)
            DO UPDATE SET secret_code = EXCLUDED.secret_code, is_active = true
            RETURNING week_start, secret_code, is_active, created_at
            "#,
            &[&week_start, &secret_code],
        )
        .await?;
    row_to_code(&row)
}
