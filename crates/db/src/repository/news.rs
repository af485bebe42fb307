//! News CRUD operations.

use chrono::Utc;

use crate::{
    DbError, DbPool,
    models::{NewNews, NewsFilter, NewsPatch, NewsRow},
};

const NEWS_COLUMNS: &str =
    "id, title, description, assets, language, published, source, created_at";

/// Insert a new news row with `published = false`.
pub async fn insert_news(pool: &DbPool, news: NewNews<'_>) -> Result<NewsRow, DbError> {
    let row = sqlx::query_as::<_, NewsRow>(&format!(
        r#"
        INSERT INTO news (title, description, assets, language, published, source, created_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
        RETURNING {NEWS_COLUMNS}
        "#
    ))
    .bind(news.title)
    .bind(news.description)
    .bind(news.assets)
    .bind(news.language)
    .bind(news.source)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single news row by its primary key.
pub async fn get_news(pool: &DbPool, id: i64) -> Result<NewsRow, DbError> {
    sqlx::query_as::<_, NewsRow>(&format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Return news rows matching `filter`, newest first.
///
/// `asset` is matched case-insensitively against the serialized `assets`
/// column, so `btc` finds `["BTC"]`.
pub async fn list_news(pool: &DbPool, filter: &NewsFilter) -> Result<Vec<NewsRow>, DbError> {
    let rows = sqlx::query_as::<_, NewsRow>(&format!(
        r#"
        SELECT {NEWS_COLUMNS} FROM news
        WHERE (?1 IS NULL OR instr(lower(assets), lower(?1)) > 0)
          AND (?2 IS NULL OR source = ?2)
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(filter.asset.as_deref())
    .bind(filter.source.as_deref())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Apply a partial update and return the updated row.
pub async fn update_news(pool: &DbPool, id: i64, patch: &NewsPatch) -> Result<NewsRow, DbError> {
    sqlx::query_as::<_, NewsRow>(&format!(
        r#"
        UPDATE news
        SET title       = COALESCE(?1, title),
            description = COALESCE(?2, description),
            published   = COALESCE(?3, published)
        WHERE id = ?4
        RETURNING {NEWS_COLUMNS}
        "#
    ))
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.published)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Mark a news row as published. Publishing twice is a no-op.
pub async fn publish_news(pool: &DbPool, id: i64) -> Result<NewsRow, DbError> {
    sqlx::query_as::<_, NewsRow>(&format!(
        "UPDATE news SET published = 1 WHERE id = ?1 RETURNING {NEWS_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Permanently delete a news row by its primary key.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_news(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM news WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Delete every news row; returns how many were removed.
pub async fn delete_all_news(pool: &DbPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM news").execute(pool).await?;
    Ok(result.rows_affected())
}
