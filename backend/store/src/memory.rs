use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use inkread_core::{
    Conversion, ConversionId, ConversionPatch, ConversionStore, ListQuery, NewConversion,
    StoreError,
};

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Update,
    Delete,
    List,
}

#[derive(Default)]
struct Inner {
    /// Insertion order.
    records: Vec<Conversion>,
    next_id: u64,
    pending_failures: HashMap<StoreOp, usize>,
    updates: Vec<(ConversionId, ConversionPatch)>,
}

/// Process-local store. Ids are assigned as `c1`, `c2`, ...
pub struct InMemoryConversionStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
    reply_delays: HashMap<StoreOp, Duration>,
}

impl InMemoryConversionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            latency: None,
            reply_delays: HashMap::new(),
        }
    }

    /// Delay every call, to simulate a slow round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Apply `op` when it is called but hold its answer back for `delay`,
    /// like a server that has committed and is still responding.
    pub fn with_reply_delay(mut self, op: StoreOp, delay: Duration) -> Self {
        self.reply_delays.insert(op, delay);
        self
    }

    /// Insert pre-built records as if they had been created earlier.
    pub fn seed(&self, records: impl IntoIterator<Item = Conversion>) {
        self.state().records.extend(records);
    }

    /// Make the next `times` calls of `op` fail with a 500.
    pub fn fail_next(&self, op: StoreOp, times: usize) {
        *self.state().pending_failures.entry(op).or_insert(0) += times;
    }

    pub fn records(&self) -> Vec<Conversion> {
        self.state().records.clone()
    }

    pub fn get(&self, id: &ConversionId) -> Option<Conversion> {
        self.state().records.iter().find(|r| &r.id == id).cloned()
    }

    /// Every successful update, in call order.
    pub fn updates(&self) -> Vec<(ConversionId, ConversionPatch)> {
        self.state().updates.clone()
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn reply<T>(&self, op: StoreOp, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Some(delay) = self.reply_delays.get(&op) {
            tokio::time::sleep(*delay).await;
        }
        result
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(inner: &mut Inner, op: StoreOp) -> Result<(), StoreError> {
        match inner.pending_failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(StoreError::Status {
                    status: 500,
                    message: format!("injected {op:?} failure"),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for InMemoryConversionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversionStore for InMemoryConversionStore {
    async fn create(&self, record: NewConversion) -> Result<Conversion, StoreError> {
        self.round_trip().await;
        let result = self.apply_create(record);
        self.reply(StoreOp::Create, result).await
    }

    async fn update(&self, id: &ConversionId, patch: ConversionPatch) -> Result<(), StoreError> {
        self.round_trip().await;
        let result = self.apply_update(id, patch);
        self.reply(StoreOp::Update, result).await
    }

    async fn delete(&self, id: &ConversionId) -> Result<(), StoreError> {
        self.round_trip().await;
        let result = self.apply_delete(id);
        self.reply(StoreOp::Delete, result).await
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Conversion>, StoreError> {
        self.round_trip().await;
        let result = self.apply_list(query);
        self.reply(StoreOp::List, result).await
    }
}

impl InMemoryConversionStore {
    fn apply_create(&self, record: NewConversion) -> Result<Conversion, StoreError> {
        let mut inner = self.state();
        Self::take_failure(&mut inner, StoreOp::Create)?;

        inner.next_id += 1;
        let now = Utc::now();
        let created = Conversion {
            id: ConversionId::new(format!("c{}", inner.next_id)),
            image_source: record.image_url,
            extracted_text: record.extracted_text,
            edited_text: None,
            created_at: now,
            updated_at: Some(now),
        };
        inner.records.push(created.clone());
        Ok(created)
    }

    fn apply_update(&self, id: &ConversionId, patch: ConversionPatch) -> Result<(), StoreError> {
        let mut inner = self.state();
        Self::take_failure(&mut inner, StoreOp::Update)?;

        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.edited_text = Some(patch.edited_text.clone());
        record.updated_at = Some(patch.updated_at);
        inner.updates.push((id.clone(), patch));
        Ok(())
    }

    fn apply_delete(&self, id: &ConversionId) -> Result<(), StoreError> {
        let mut inner = self.state();
        Self::take_failure(&mut inner, StoreOp::Delete)?;
        inner.records.retain(|r| &r.id != id);
        Ok(())
    }

    fn apply_list(&self, query: ListQuery) -> Result<Vec<Conversion>, StoreError> {
        let mut inner = self.state();
        Self::take_failure(&mut inner, StoreOp::List)?;

        // Later inserts win ties on created_at.
        let mut rows: Vec<Conversion> = inner.records.iter().rev().cloned().collect();
        if query.newest_first {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            rows.reverse();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        rows.truncate(query.limit);
        Ok(rows)
    }
}
