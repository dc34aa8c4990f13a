//! PostgreSQL store tests against a real database.
//!
//! One Postgres container is shared by the whole test binary; each test
//! gets its own freshly created database so flags never leak between tests.

use ad_intel::types::{AdRow, ReelRow, RelevanceUpdate};
use ad_intel::{PostgresStore, RecordId, RecordStore, RelevanceFlag, TableName};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Container kept alive for every test in this binary.
struct SharedPostgres {
    base_url: String,
    _container: ContainerAsync<Postgres>,
}

static SHARED_POSTGRES: OnceCell<SharedPostgres> = OnceCell::const_new();
static NEXT_DATABASE: AtomicUsize = AtomicUsize::new(0);

impl SharedPostgres {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let container = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        Ok(Self {
            base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
            _container: container,
        })
    }

    async fn get() -> &'static Self {
        SHARED_POSTGRES
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared Postgres container")
            })
            .await
    }
}

/// A store connected to a new, empty database with the schema applied.
async fn fresh_store() -> Result<PostgresStore> {
    let shared = SharedPostgres::get().await;
    let name = format!("ad_intel_{}", NEXT_DATABASE.fetch_add(1, Ordering::SeqCst));

    let admin = PostgresStore::connect(&format!("{}/postgres", shared.base_url)).await?;
    sqlx::query(&format!("CREATE DATABASE {name}"))
        .execute(admin.pool())
        .await
        .context("Failed to create test database")?;

    let store = PostgresStore::connect(&format!("{}/{name}", shared.base_url)).await?;
    store.ensure_schema().await?;
    Ok(store)
}

fn ads_table() -> TableName {
    TableName::new("competitor_ads").unwrap()
}

fn ad(brand: &str, caption: &str) -> AdRow {
    AdRow::from_item(&json!({
        "brand": brand,
        "adArchiveID": format!("{brand}-1"),
        "snapshot": { "caption": caption, "cards": [{ "body": caption }] },
    }))
}

fn update(id: RecordId, relevant: bool) -> RelevanceUpdate {
    RelevanceUpdate { id, relevant }
}

#[tokio::test]
async fn test_inserted_ads_start_pending() {
    let store = fresh_store().await.unwrap();

    let ids = store
        .insert_ads(&[ad("snitch", "Polo drop"), ad("zara", "Linen shirts")])
        .await
        .unwrap();

    let pending = store.pending_records(&ads_table()).await.unwrap();
    assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
    assert_eq!(pending[0].raw["snapshot"]["caption"], "Polo drop");

    let cards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ad_cards")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(cards, 2);
}

#[tokio::test]
async fn test_second_apply_leaves_flags_unchanged() {
    let store = fresh_store().await.unwrap();
    let ids = store.insert_ads(&[ad("snitch", "Polo drop")]).await.unwrap();

    let first = store
        .apply_relevance(&ads_table(), &[update(ids[0], true)])
        .await
        .unwrap();
    let second = store
        .apply_relevance(&ads_table(), &[update(ids[0], false)])
        .await
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(
        store.relevance(&ads_table(), ids[0]).await.unwrap(),
        RelevanceFlag::Relevant
    );
}

#[tokio::test]
async fn test_failed_batch_rolls_back_every_flag() {
    let store = fresh_store().await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE guarded (
            id BIGSERIAL PRIMARY KEY,
            raw_json JSONB NOT NULL,
            is_relevant BOOLEAN,
            CHECK (is_relevant IS NULL OR NOT (raw_json ? 'reject'))
        )
        "#,
    )
    .execute(store.pool())
    .await
    .unwrap();

    let good: i64 = sqlx::query_scalar("INSERT INTO guarded (raw_json) VALUES ('{}') RETURNING id")
        .fetch_one(store.pool())
        .await
        .unwrap();
    let bad: i64 =
        sqlx::query_scalar(r#"INSERT INTO guarded (raw_json) VALUES ('{"reject": true}') RETURNING id"#)
            .fetch_one(store.pool())
            .await
            .unwrap();

    let table = TableName::new("guarded").unwrap();
    let result = store
        .apply_relevance(
            &table,
            &[update(RecordId(good), true), update(RecordId(bad), false)],
        )
        .await;

    assert!(result.is_err());
    assert_eq!(
        store.relevance(&table, RecordId(good)).await.unwrap(),
        RelevanceFlag::Unknown
    );
    assert_eq!(store.pending_records(&table).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pending_records_skips_flagged_rows() {
    let store = fresh_store().await.unwrap();
    let ids = store
        .insert_ads(&[ad("a", "one"), ad("b", "two"), ad("c", "three")])
        .await
        .unwrap();

    store
        .apply_relevance(&ads_table(), &[update(ids[0], true), update(ids[2], false)])
        .await
        .unwrap();

    let pending = store.pending_records(&ads_table()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, ids[1]);
    assert_eq!(pending[0].raw["brand"], "b");
}

#[tokio::test]
async fn test_reel_comments_are_stored_per_reel() {
    let store = fresh_store().await.unwrap();
    let reel = ReelRow::from_item(&json!({
        "brand": "snitch",
        "id": "r1",
        "caption": "New fits",
        "latestComments": [
            { "id": "c1", "text": "need this polo", "ownerUsername": "sam" },
            { "id": "c2", "text": "", "ownerUsername": "alex" },
        ],
    }));

    let ids = store.insert_reels(&[reel]).await.unwrap();
    let comments = TableName::new("reel_comments").unwrap();

    assert_eq!(
        store.comment_texts(&comments, ids[0]).await.unwrap(),
        vec!["need this polo"]
    );
}
