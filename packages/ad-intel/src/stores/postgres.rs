//! PostgreSQL record store.
//!
//! Table names for the relevance operations are validated [`TableName`]s and
//! interpolated into the SQL; every value is bound.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::{debug, info, instrument};

use crate::error::{AdIntelError, Result};
use crate::traits::store::{RecordStore, ADS_TABLE, AD_CARDS_TABLE, COMMENTS_TABLE, REELS_TABLE};
use crate::types::{AdRow, RawRecord, RecordId, ReelRow, RelevanceFlag, RelevanceUpdate, TableName};

/// PostgreSQL-backed record store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with a single pooled connection.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the scrape tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {ADS_TABLE} (
                    id BIGSERIAL PRIMARY KEY,
                    brand TEXT NOT NULL,
                    input_url TEXT,
                    page_id TEXT,
                    page_name TEXT,
                    page_likes BIGINT,
                    ad_archive_id TEXT,
                    start_date TIMESTAMPTZ,
                    end_date TIMESTAMPTZ,
                    is_active BOOLEAN,
                    total_active_time BIGINT,
                    cta_text TEXT,
                    link_url TEXT,
                    snapshot_caption TEXT,
                    raw_json JSONB NOT NULL,
                    is_relevant BOOLEAN,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {AD_CARDS_TABLE} (
                    id BIGSERIAL PRIMARY KEY,
                    ad_id BIGINT NOT NULL REFERENCES {ADS_TABLE}(id) ON DELETE CASCADE,
                    body TEXT,
                    caption TEXT,
                    cta_text TEXT,
                    cta_type TEXT,
                    link_description TEXT,
                    link_url TEXT,
                    title TEXT,
                    video_hd_url TEXT,
                    video_sd_url TEXT,
                    video_preview_image TEXT,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {REELS_TABLE} (
                    id BIGSERIAL PRIMARY KEY,
                    brand TEXT NOT NULL,
                    input_url TEXT,
                    reel_id TEXT,
                    shortcode TEXT,
                    caption TEXT,
                    url TEXT,
                    comments_count BIGINT,
                    likes_count BIGINT,
                    video_url TEXT,
                    display_url TEXT,
                    timestamp TIMESTAMPTZ,
                    raw_json JSONB NOT NULL,
                    is_relevant BOOLEAN,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {COMMENTS_TABLE} (
                    id BIGSERIAL PRIMARY KEY,
                    reel_id BIGINT NOT NULL REFERENCES {REELS_TABLE}(id) ON DELETE CASCADE,
                    comment_id TEXT,
                    text TEXT,
                    owner_username TEXT,
                    owner_id TEXT,
                    timestamp TIMESTAMPTZ,
                    parent_comment_id TEXT,
                    raw_json JSONB NOT NULL,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{COMMENTS_TABLE}_reel ON {COMMENTS_TABLE}(reel_id)"),
        ];

        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Ad-intel schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[instrument(skip(self), fields(table = %table))]
    async fn pending_records(&self, table: &TableName) -> Result<Vec<RawRecord>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT id, raw_json::text FROM {table} WHERE is_relevant IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Fetched pending records");
        rows.into_iter()
            .map(|(id, raw)| -> Result<RawRecord> {
                Ok(RawRecord {
                    id: RecordId(id),
                    raw: serde_json::from_str(&raw)?,
                })
            })
            .collect()
    }

    async fn comment_texts(&self, comments_table: &TableName, reel: RecordId) -> Result<Vec<String>> {
        let texts: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT text FROM {comments_table} WHERE reel_id = $1 AND text IS NOT NULL AND text <> '' ORDER BY id"
        ))
        .bind(reel.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(texts)
    }

    async fn relevance(&self, table: &TableName, id: RecordId) -> Result<RelevanceFlag> {
        let row: Option<(Option<bool>,)> =
            sqlx::query_as(&format!("SELECT is_relevant FROM {table} WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(flag,)| RelevanceFlag::from_column(flag))
            .ok_or_else(|| AdIntelError::Storage(format!("no record {id} in {table}").into()))
    }

    #[instrument(skip(self, updates), fields(table = %table, updates = updates.len()))]
    async fn apply_relevance(&self, table: &TableName, updates: &[RelevanceUpdate]) -> Result<u64> {
        let sql = format!("UPDATE {table} SET is_relevant = $1 WHERE id = $2 AND is_relevant IS NULL");

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for update in updates {
            written += sqlx::query(&sql)
                .bind(update.relevant)
                .bind(update.id.0)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        info!(written, "Relevance flags committed");
        Ok(written)
    }

    #[instrument(skip(self, ads), fields(ads = ads.len()))]
    async fn insert_ads(&self, ads: &[AdRow]) -> Result<Vec<RecordId>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(ads.len());
        let mut cards = 0usize;

        for ad in ads {
            let id: i64 = sqlx::query_scalar(&format!(
                r#"
                INSERT INTO {ADS_TABLE}
                    (brand, input_url, page_id, page_name, page_likes,
                     ad_archive_id, start_date, end_date, is_active,
                     total_active_time, cta_text, link_url,
                     snapshot_caption, raw_json)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                RETURNING id
                "#
            ))
            .bind(&ad.brand)
            .bind(&ad.input_url)
            .bind(&ad.page_id)
            .bind(&ad.page_name)
            .bind(ad.page_likes)
            .bind(&ad.ad_archive_id)
            .bind(ad.start_date)
            .bind(ad.end_date)
            .bind(ad.is_active)
            .bind(ad.total_active_time)
            .bind(&ad.cta_text)
            .bind(&ad.link_url)
            .bind(&ad.snapshot_caption)
            .bind(Json(&ad.raw))
            .fetch_one(&mut *tx)
            .await?;

            for card in &ad.cards {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {AD_CARDS_TABLE}
                        (ad_id, body, caption, cta_text, cta_type,
                         link_description, link_url, title,
                         video_hd_url, video_sd_url, video_preview_image)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#
                ))
                .bind(id)
                .bind(&card.body)
                .bind(&card.caption)
                .bind(&card.cta_text)
                .bind(&card.cta_type)
                .bind(&card.link_description)
                .bind(&card.link_url)
                .bind(&card.title)
                .bind(&card.video_hd_url)
                .bind(&card.video_sd_url)
                .bind(&card.video_preview_image)
                .execute(&mut *tx)
                .await?;
                cards += 1;
            }

            ids.push(RecordId(id));
        }

        tx.commit().await?;
        info!(ads = ids.len(), cards, "Inserted ads");
        Ok(ids)
    }

    #[instrument(skip(self, reels), fields(reels = reels.len()))]
    async fn insert_reels(&self, reels: &[ReelRow]) -> Result<Vec<RecordId>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(reels.len());
        let mut comments = 0usize;

        for reel in reels {
            let id: i64 = sqlx::query_scalar(&format!(
                r#"
                INSERT INTO {REELS_TABLE}
                    (brand, input_url, reel_id, shortcode, caption,
                     url, comments_count, likes_count,
                     video_url, display_url, timestamp, raw_json)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING id
                "#
            ))
            .bind(&reel.brand)
            .bind(&reel.input_url)
            .bind(&reel.reel_id)
            .bind(&reel.shortcode)
            .bind(&reel.caption)
            .bind(&reel.url)
            .bind(reel.comments_count)
            .bind(reel.likes_count)
            .bind(&reel.video_url)
            .bind(&reel.display_url)
            .bind(reel.timestamp)
            .bind(Json(&reel.raw))
            .fetch_one(&mut *tx)
            .await?;

            for comment in &reel.comments {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {COMMENTS_TABLE}
                        (reel_id, comment_id, text, owner_username, owner_id,
                         timestamp, parent_comment_id, raw_json)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#
                ))
                .bind(id)
                .bind(&comment.comment_id)
                .bind(&comment.text)
                .bind(&comment.owner_username)
                .bind(&comment.owner_id)
                .bind(comment.timestamp)
                .bind(&comment.parent_comment_id)
                .bind(Json(&comment.raw))
                .execute(&mut *tx)
                .await?;
                comments += 1;
            }

            ids.push(RecordId(id));
        }

        tx.commit().await?;
        info!(reels = ids.len(), comments, "Inserted reels");
        Ok(ids)
    }
}
