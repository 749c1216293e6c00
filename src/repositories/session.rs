use crate::{
    error::{AppError, Result},
    models::session::{NewSessionRecord, SessionRecord},
};
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;

/// A helper function to map a `tokio_postgres::Row` to a `SessionRecord`.
fn row_to_session(row: &Row) -> Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        phone: row.try_get("phone").map_err(|_| AppError::MissingData("phone".to_string()))?,
        first_name: row.try_get("first_name").map_err(|_| AppError::MissingData("first_name".to_string()))?,
        access_token: row.try_get("access_token").map_err(|_| AppError::MissingData("access_token".to_string()))?,
        secret_code: row.try_get("secret_code").map_err(|_| AppError::MissingData("secret_code".to_string()))?,
        week_start: row.try_get("week_start").map_err(|_| AppError::MissingData("week_start".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        expires_at: row.try_get("expires_at").map_err(|_| AppError::MissingData("expires_at".to_string()))?,
    })
}

/// Inserts a new session record. Append-only: tokens are unique and never
/// updated in place.
pub async fn insert(
    pool: &Pool,
    record: &NewSessionRecord,
    expires_at: DateTime<Utc>,
) -> Result<SessionRecord> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO secret_menu_sessions
                (email, phone, first_name, access_token, secret_code, week_start, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, phone, first_name, access_token, secret_code,
                      week_start, created_at, expires_at
            "#,
            &[
                &record.email,
                &record.phone,
                &record.first_name,
                &record.access_token,
                &record.secret_code,
                &record.week_start,
                &expires_at,
            ],
        )
        .await?;

    let session = row_to_session(&row)?;
    tracing::info!("✅ Session record stored: {}", session.id);
    Ok(session)
}

/// Finds an unexpired session record by its token.
pub async fn find_valid(pool: &Pool, access_token: &str) -> Result<Option<SessionRecord>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, phone, first_name, access_token, secret_code,
                   week_start, created_at, expires_at
            FROM secret_menu_sessions
            WHERE access_token = $1 AND expires_at > NOW()
            "#,
            &[&access_token],
        )
        .await?;
    row.map(|r| row_to_session(&r)).transpose()
}
