//! In-memory record store for testing and development.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AdIntelError, Result};
use crate::traits::store::{RecordStore, ADS_TABLE, COMMENTS_TABLE, REELS_TABLE};
use crate::types::{AdCardRow, AdRow, RawRecord, RecordId, ReelRow, RelevanceFlag, RelevanceUpdate, TableName};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<RecordId, StoredRow>,
    next_id: i64,
}

#[derive(Debug, Clone)]
struct StoredRow {
    raw: Value,
    relevance: Option<bool>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    reel: RecordId,
    text: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    comments: HashMap<String, Vec<StoredComment>>,
    cards: Vec<(RecordId, AdCardRow)>,
}

impl State {
    fn insert(&mut self, table: &str, raw: Value) -> RecordId {
        let table = self.tables.entry(table.to_string()).or_default();
        table.next_id += 1;
        let id = RecordId(table.next_id);
        table.rows.insert(id, StoredRow { raw, relevance: None });
        id
    }
}

/// Record store backed by process memory.
///
/// Data is lost on drop. Writes can be made to fail for exercising
/// all-or-nothing behaviour.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a raw payload with an unknown flag.
    pub fn insert_raw(&self, table: &TableName, raw: Value) -> RecordId {
        self.write().insert(table.as_str(), raw)
    }

    /// Store a raw payload with its flag already set.
    pub fn insert_resolved(&self, table: &TableName, raw: Value, relevant: bool) -> RecordId {
        let mut state = self.write();
        let id = state.insert(table.as_str(), raw);
        if let Some(row) = state
            .tables
            .get_mut(table.as_str())
            .and_then(|t| t.rows.get_mut(&id))
        {
            row.relevance = Some(relevant);
        }
        id
    }

    pub fn add_comment(&self, comments_table: &TableName, reel: RecordId, text: impl Into<String>) {
        self.write()
            .comments
            .entry(comments_table.as_str().to_string())
            .or_default()
            .push(StoredComment {
                reel,
                text: Some(text.into()),
            });
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.read().tables.get(table).map_or(0, |t| t.rows.len())
    }

    pub fn comment_count(&self, comments_table: &str) -> usize {
        self.read().comments.get(comments_table).map_or(0, Vec::len)
    }

    pub fn card_count(&self) -> usize {
        self.read().cards.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AdIntelError::Storage("memory store writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn pending_records(&self, table: &TableName) -> Result<Vec<RawRecord>> {
        let state = self.read();
        let Some(table) = state.tables.get(table.as_str()) else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .iter()
            .filter(|(_, row)| row.relevance.is_none())
            .map(|(id, row)| RawRecord {
                id: *id,
                raw: row.raw.clone(),
            })
            .collect())
    }

    async fn comment_texts(&self, comments_table: &TableName, reel: RecordId) -> Result<Vec<String>> {
        let state = self.read();
        Ok(state
            .comments
            .get(comments_table.as_str())
            .map(|comments| {
                comments
                    .iter()
                    .filter(|c| c.reel == reel)
                    .filter_map(|c| c.text.clone())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn relevance(&self, table: &TableName, id: RecordId) -> Result<RelevanceFlag> {
        self.read()
            .tables
            .get(table.as_str())
            .and_then(|t| t.rows.get(&id))
            .map(|row| RelevanceFlag::from_column(row.relevance))
            .ok_or_else(|| AdIntelError::Storage(format!("no record {id} in {table}").into()))
    }

    async fn apply_relevance(&self, table: &TableName, updates: &[RelevanceUpdate]) -> Result<u64> {
        self.check_writable()?;
        let mut state = self.write();
        let Some(rows) = state.tables.get_mut(table.as_str()).map(|t| &mut t.rows) else {
            return Ok(0);
        };

        let mut written = 0;
        for update in updates {
            if let Some(row) = rows.get_mut(&update.id) {
                if row.relevance.is_none() {
                    row.relevance = Some(update.relevant);
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    async fn insert_ads(&self, ads: &[AdRow]) -> Result<Vec<RecordId>> {
        self.check_writable()?;
        let mut state = self.write();
        let mut ids = Vec::with_capacity(ads.len());
        for ad in ads {
            let id = state.insert(ADS_TABLE, ad.raw.clone());
            state.cards.extend(ad.cards.iter().cloned().map(|card| (id, card)));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn insert_reels(&self, reels: &[ReelRow]) -> Result<Vec<RecordId>> {
        self.check_writable()?;
        let mut state = self.write();
        let mut ids = Vec::with_capacity(reels.len());
        for reel in reels {
            let id = state.insert(REELS_TABLE, reel.raw.clone());
            let comments = reel.comments.iter().map(|c| StoredComment {
                reel: id,
                text: c.text.clone(),
            });
            state
                .comments
                .entry(COMMENTS_TABLE.to_string())
                .or_default()
                .extend(comments);
            ids.push(id);
        }
        Ok(ids)
    }
}
