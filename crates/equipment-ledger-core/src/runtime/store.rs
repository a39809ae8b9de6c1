// equipment-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Equipment Ledger In-Memory Store
// Description: In-memory batch store and the shared store wrapper.
// Purpose: Provide a deterministic store for tests and ephemeral servers.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryBatchStore`] keeps all state behind one mutex. A write
//! transaction works on a copy of the state and swaps it in only when the
//! work succeeds, so failed ingestions leave nothing behind and readers never
//! see a half-applied write. State is lost when the process exits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::batch::BatchMeta;
use crate::core::batch::NewBatch;
use crate::core::batch::StoredBatch;
use crate::core::identifiers::BatchId;
use crate::core::record::Record;
use crate::core::record::RecordFields;
use crate::core::time::unix_millis_not_before;
use crate::interfaces::BatchStore;
use crate::interfaces::BatchTransaction;
use crate::interfaces::StoreError;
use crate::interfaces::TransactionWork;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Complete in-memory store contents.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Batches keyed by identifier.
    batches: BTreeMap<BatchId, StoredBatch>,
    /// Last assigned batch identifier.
    last_id: i64,
}

impl MemoryState {
    /// Returns batch metadata ordered oldest-first.
    fn metas_oldest_first(&self) -> Vec<BatchMeta> {
        let mut metas: Vec<BatchMeta> =
            self.batches.values().map(|batch| batch.meta.clone()).collect();
        metas.sort_by_key(|meta| (meta.created_at_ms, meta.id));
        metas
    }
}

/// In-memory batch store for tests and ephemeral deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBatchStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBatchStore {
    /// Creates an empty in-memory batch store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, mapping poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("batch store mutex poisoned".to_string()))
    }
}

/// Transaction over a private copy of the store state.
struct MemoryTransaction<'a> {
    /// Working copy swapped in on commit.
    state: &'a mut MemoryState,
}

impl BatchTransaction for MemoryTransaction<'_> {
    fn create_batch(&mut self, batch: &NewBatch) -> Result<BatchMeta, StoreError> {
        let next = self
            .state
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Invalid("batch id space exhausted".to_string()))?;
        self.state.last_id = next;
        let latest = self.state.batches.values().map(|stored| stored.meta.created_at_ms).max();
        let meta = BatchMeta {
            id: BatchId::new(next),
            filename: batch.filename.clone(),
            owner: batch.owner.clone(),
            created_at_ms: unix_millis_not_before(latest),
        };
        self.state.batches.insert(meta.id, StoredBatch {
            meta: meta.clone(),
            records: Vec::new(),
        });
        Ok(meta)
    }

    fn bulk_insert_records(
        &mut self,
        batch_id: BatchId,
        records: &[RecordFields],
    ) -> Result<(), StoreError> {
        let batch = self
            .state
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| StoreError::Invalid(format!("unknown batch {batch_id}")))?;
        let start = batch.records.len() as u64;
        batch.records.extend(records.iter().zip(start..).map(|(fields, position)| Record {
            batch_id,
            position,
            fields: fields.clone(),
        }));
        Ok(())
    }

    fn count_batches(&mut self) -> Result<u64, StoreError> {
        Ok(self.state.batches.len() as u64)
    }

    fn oldest_batches(&mut self, limit: u64) -> Result<Vec<BatchId>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.state.metas_oldest_first().into_iter().take(limit).map(|meta| meta.id).collect())
    }

    fn delete_batch(&mut self, batch_id: BatchId) -> Result<bool, StoreError> {
        Ok(self.state.batches.remove(&batch_id).is_some())
    }

    fn records_of(&mut self, batch_id: BatchId) -> Result<Vec<Record>, StoreError> {
        Ok(self.state.batches.get(&batch_id).map(|batch| batch.records.clone()).unwrap_or_default())
    }
}

impl BatchStore for InMemoryBatchStore {
    fn write_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        work(&mut MemoryTransaction {
            state: &mut working,
        })?;
        *guard = working;
        drop(guard);
        Ok(())
    }

    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError> {
        let mut metas = self.lock()?.metas_oldest_first();
        metas.reverse();
        Ok(metas)
    }

    fn load_batch(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError> {
        Ok(self.lock()?.batches.get(&batch_id).cloned())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared batch store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedBatchStore {
    /// Inner store implementation.
    inner: Arc<dyn BatchStore + Send + Sync>,
}

impl SharedBatchStore {
    /// Wraps a batch store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl BatchStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn BatchStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl BatchStore for SharedBatchStore {
    fn write_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        self.inner.write_transaction(work)
    }

    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError> {
        self.inner.list_batches()
    }

    fn load_batch(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError> {
        self.inner.load_batch(batch_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
