use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Client record managed by the reporting backend.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub google_ads_id: Option<String>,
    pub meta_ads_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Client {
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: Option<&str>,
        google_ads_id: Option<&str>,
        meta_ads_id: Option<&str>,
    ) -> anyhow::Result<Client> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, email, google_ads_id, meta_ads_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, google_ads_id, meta_ads_id, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(google_ads_id)
        .bind(meta_ads_id)
        .fetch_one(db)
        .await?;
        Ok(client)
    }

    /// Newest clients first.
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Client>> {
        let rows = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, email, google_ads_id, meta_ads_id, created_at
            FROM clients
            ORDER BY id DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, email, google_ads_id, meta_ads_id, created_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(client)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        google_ads_id: Option<&str>,
        meta_ads_id: Option<&str>,
    ) -> anyhow::Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                google_ads_id = COALESCE($4, google_ads_id),
                meta_ads_id = COALESCE($5, meta_ads_id)
            WHERE id = $1
            RETURNING id, name, email, google_ads_id, meta_ads_id, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(google_ads_id)
        .bind(meta_ads_id)
        .fetch_optional(db)
        .await?;
        Ok(client)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
