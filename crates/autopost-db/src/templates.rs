//! Database operations for `templates`. Read-only from the pipeline.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `templates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TemplateRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub html: String,
    pub created_at: DateTime<Utc>,
}

/// Fetch a template by internal id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_template(pool: &PgPool, id: i64) -> Result<Option<TemplateRow>, DbError> {
    let row = sqlx::query_as::<_, TemplateRow>(
        "SELECT id, public_id, user_id, name, html, created_at FROM templates WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
