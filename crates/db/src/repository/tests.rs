use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::models::{NewNews, NewSchedule, NewsFilter, NewsPatch, NewsSource};
use crate::pool::{create_memory_pool, init_schema};
use crate::repository::{news, schedules};
use crate::{DbError, DbPool};

async fn seed_news(pool: &DbPool, title: &str, assets: &str, source: NewsSource) -> i64 {
    news::insert_news(
        pool,
        NewNews {
            title,
            description: "line one\nline two",
            assets,
            language: "en",
            source,
        },
    )
    .await
    .expect("insert news")
    .id
}

#[tokio::test]
async fn inserted_news_defaults_to_unpublished() {
    let pool = create_memory_pool().await.unwrap();
    let id = seed_news(&pool, "Bitcoin rallies", r#"["BTC"]"#, NewsSource::Manual).await;

    let row = news::get_news(&pool, id).await.unwrap();
    assert_eq!(row.title, "Bitcoin rallies");
    assert_eq!(row.description, "line one\nline two");
    assert!(!row.published);
    assert_eq!(row.source, NewsSource::Manual);
}

#[tokio::test]
async fn list_is_newest_first() {
    let pool = create_memory_pool().await.unwrap();
    let first = seed_news(&pool, "first", "[]", NewsSource::Manual).await;
    let second = seed_news(&pool, "second", "[]", NewsSource::Manual).await;

    let rows = news::list_news(&pool, &NewsFilter::default()).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn asset_filter_is_case_insensitive_substring() {
    let pool = create_memory_pool().await.unwrap();
    let upper = seed_news(&pool, "upper", r#"["BTC","ETH"]"#, NewsSource::Manual).await;
    let lower = seed_news(&pool, "lower", r#"["btc"]"#, NewsSource::Scheduled).await;
    seed_news(&pool, "other", r#"["SOL"]"#, NewsSource::Manual).await;

    let filter = NewsFilter { asset: Some("BTC".into()), source: None };
    let mut ids: Vec<i64> = news::list_news(&pool, &filter)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![upper, lower]);
}

#[tokio::test]
async fn source_filter_is_exact() {
    let pool = create_memory_pool().await.unwrap();
    seed_news(&pool, "manual", r#"["BTC"]"#, NewsSource::Manual).await;
    let scheduled = seed_news(&pool, "scheduled", r#"["BTC"]"#, NewsSource::Scheduled).await;

    let filter = NewsFilter { asset: Some("btc".into()), source: Some("scheduled".into()) };
    let rows = news::list_news(&pool, &filter).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, scheduled);

    let filter = NewsFilter { asset: None, source: Some("Scheduled".into()) };
    assert!(news::list_news(&pool, &filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn partial_update_leaves_other_columns() {
    let pool = create_memory_pool().await.unwrap();
    let id = seed_news(&pool, "draft", r#"["BTC"]"#, NewsSource::Manual).await;

    let patch = NewsPatch { title: Some("final".into()), ..Default::default() };
    let row = news::update_news(&pool, id, &patch).await.unwrap();
    assert_eq!(row.title, "final");
    assert_eq!(row.description, "line one\nline two");
    assert!(!row.published);

    let patch = NewsPatch { published: Some(true), ..Default::default() };
    let row = news::update_news(&pool, id, &patch).await.unwrap();
    assert_eq!(row.title, "final");
    assert!(row.published);
}

#[tokio::test]
async fn publish_is_idempotent() {
    let pool = create_memory_pool().await.unwrap();
    let id = seed_news(&pool, "t", "[]", NewsSource::Manual).await;

    assert!(news::publish_news(&pool, id).await.unwrap().published);
    assert!(news::publish_news(&pool, id).await.unwrap().published);
}

#[tokio::test]
async fn writes_against_missing_ids_are_not_found() {
    let pool = create_memory_pool().await.unwrap();

    assert!(matches!(news::get_news(&pool, 42).await, Err(DbError::NotFound)));
    assert!(matches!(news::publish_news(&pool, 42).await, Err(DbError::NotFound)));
    assert!(matches!(news::delete_news(&pool, 42).await, Err(DbError::NotFound)));
    assert!(matches!(
        news::update_news(&pool, 42, &NewsPatch::default()).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(schedules::toggle_schedule(&pool, 42).await, Err(DbError::NotFound)));
    assert!(matches!(schedules::delete_schedule(&pool, 42).await, Err(DbError::NotFound)));
}

#[tokio::test]
async fn delete_all_empties_the_table() {
    let pool = create_memory_pool().await.unwrap();
    seed_news(&pool, "a", "[]", NewsSource::Manual).await;
    seed_news(&pool, "b", "[]", NewsSource::Scheduled).await;

    assert_eq!(news::delete_all_news(&pool).await.unwrap(), 2);
    assert!(news::list_news(&pool, &NewsFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_flips_and_reports_new_state() {
    let pool = create_memory_pool().await.unwrap();
    let row = schedules::insert_schedule(
        &pool,
        NewSchedule {
            asset: "BTC",
            language: "en",
            days: r#"["Mon","Fri"]"#,
            times: r#"["09:00","now"]"#,
            mode: "asset",
            impacts: "[]",
        },
    )
    .await
    .unwrap();
    assert!(row.is_active);
    assert_eq!(row.day_list(), vec!["Mon", "Fri"]);
    assert_eq!(row.time_list(), vec!["09:00", "now"]);

    let toggled = schedules::toggle_schedule(&pool, row.id).await.unwrap();
    assert!(!toggled.is_active);
    assert!(schedules::list_active_schedules(&pool).await.unwrap().is_empty());

    let toggled = schedules::toggle_schedule(&pool, row.id).await.unwrap();
    assert!(toggled.is_active);
    assert_eq!(schedules::list_active_schedules(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn calendar_columns_round_trip() {
    let pool = create_memory_pool().await.unwrap();
    let row = schedules::insert_schedule(
        &pool,
        NewSchedule {
            asset: "ECONOMIC_CALENDAR",
            language: "en",
            days: r#"["Mon"]"#,
            times: r#"["08:00"]"#,
            mode: "calendar",
            impacts: r#"["high","medium"]"#,
        },
    )
    .await
    .unwrap();

    let fetched = schedules::get_schedule(&pool, row.id).await.unwrap();
    assert_eq!(fetched.mode, "calendar");
    assert_eq!(fetched.impact_list(), vec!["high", "medium"]);
}

#[tokio::test]
async fn schema_upgrade_adds_calendar_columns() {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset TEXT NOT NULL,
            language TEXT NOT NULL,
            days TEXT NOT NULL,
            times TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO schedules (asset, language, days, times, created_at)
         VALUES ('BTC', 'en', '[\"Mon\"]', '[\"09:00\"]', '2025-06-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    init_schema(&pool).await.unwrap();
    init_schema(&pool).await.unwrap();

    let rows = schedules::list_schedules(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mode, "asset");
    assert_eq!(rows[0].impacts, "[]");
}
