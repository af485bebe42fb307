//! Schedule CRUD operations.

use chrono::Utc;

use crate::{
    DbError, DbPool,
    models::{NewSchedule, ScheduleRow},
};

const SCHEDULE_COLUMNS: &str = "id, asset, language, days, times, mode, impacts, is_active, created_at";

/// Insert a new, active schedule.
pub async fn insert_schedule(
    pool: &DbPool,
    schedule: NewSchedule<'_>,
) -> Result<ScheduleRow, DbError> {
    let row = sqlx::query_as::<_, ScheduleRow>(&format!(
        r#"
        INSERT INTO schedules (asset, language, days, times, mode, impacts, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
        RETURNING {SCHEDULE_COLUMNS}
        "#
    ))
    .bind(schedule.asset)
    .bind(schedule.language)
    .bind(schedule.days)
    .bind(schedule.times)
    .bind(schedule.mode)
    .bind(schedule.impacts)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single schedule by its primary key.
pub async fn get_schedule(pool: &DbPool, id: i64) -> Result<ScheduleRow, DbError> {
    sqlx::query_as::<_, ScheduleRow>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Return all schedules, newest first.
pub async fn list_schedules(pool: &DbPool) -> Result<Vec<ScheduleRow>, DbError> {
    let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Return only schedules with `is_active = true`, oldest first.
pub async fn list_active_schedules(pool: &DbPool) -> Result<Vec<ScheduleRow>, DbError> {
    let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE is_active = 1 ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flip `is_active` and return the updated row.
pub async fn toggle_schedule(pool: &DbPool, id: i64) -> Result<ScheduleRow, DbError> {
    sqlx::query_as::<_, ScheduleRow>(&format!(
        "UPDATE schedules SET is_active = NOT is_active WHERE id = ?1 RETURNING {SCHEDULE_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Permanently delete a schedule by its primary key.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_schedule(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
