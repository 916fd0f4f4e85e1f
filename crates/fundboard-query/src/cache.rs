use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fundboard_client::ApiError;
use fundboard_domain::{CapTable, Fund, FundList, TransferList};

use crate::key::{QueryKey, QueryScope};
use crate::optimistic::OptimisticTransfers;

/// Payload stored under a [`QueryKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum CachedData {
    FundList(FundList),
    Fund(Fund),
    CapTable(CapTable),
    Transfers(TransferList),
}

/// Typed access to [`CachedData`].
pub trait QueryData: Clone {
    fn into_cached(self) -> CachedData;
    fn from_cached(data: &CachedData) -> Option<&Self>;
}

macro_rules! query_data {
    ($ty:ty, $variant:ident) => {
        impl QueryData for $ty {
            fn into_cached(self) -> CachedData {
                CachedData::$variant(self)
            }

            fn from_cached(data: &CachedData) -> Option<&Self> {
                match data {
                    CachedData::$variant(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

query_data!(FundList, FundList);
query_data!(Fund, Fund);
query_data!(CapTable, CapTable);
query_data!(TransferList, Transfers);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched and nothing in flight.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    Success,
    Failed,
}

/// Read-only view of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub error: Option<ApiError>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Proof that a fetch was started. Only the most recent ticket for a key may
/// write its result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    #[must_use]
    pub fn key(&self) -> QueryKey {
        self.key
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    data: Option<CachedData>,
    error: Option<ApiError>,
    stale: bool,
    fetching: bool,
    generation: u64,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    next_generation: u64,
    pub(crate) transfers: OptimisticTransfers,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    #[must_use]
    pub fn get<T: QueryData>(&self, key: &QueryKey) -> Option<T> {
        let data = self.entries.get(key)?.data.as_ref()?;
        T::from_cached(data).cloned()
    }

    /// Cached value that has not been invalidated since it was written.
    #[must_use]
    pub fn fresh<T: QueryData>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.stale {
            return None;
        }
        T::from_cached(entry.data.as_ref()?).cloned()
    }

    #[must_use]
    pub fn raw(&self, key: &QueryKey) -> Option<&CachedData> {
        self.entries.get(key)?.data.as_ref()
    }

    /// Writes a value directly. Any fetch already in flight for the key is
    /// superseded.
    pub fn set<T: QueryData>(&mut self, key: QueryKey, value: T) {
        let generation = self.bump();
        let entry = self.entries.entry(key).or_default();
        entry.data = Some(value.into_cached());
        entry.error = None;
        entry.stale = false;
        entry.fetching = false;
        entry.generation = generation;
        entry.updated_at = Some(Utc::now());
    }

    pub fn begin_fetch(&mut self, key: QueryKey) -> FetchTicket {
        let generation = self.bump();
        let entry = self.entries.entry(key).or_default();
        entry.fetching = true;
        entry.generation = generation;
        FetchTicket { key, generation }
    }

    /// Records a fetch outcome. Returns `false` when the ticket was superseded
    /// by a later fetch, a direct write, a cancel or a clear; the result is
    /// then dropped.
    pub fn finish_fetch<T: QueryData>(
        &mut self,
        ticket: &FetchTicket,
        result: &Result<T, ApiError>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            tracing::debug!(key = %ticket.key, "dropping fetch result for cleared entry");
            return false;
        };
        if entry.generation != ticket.generation {
            tracing::warn!(
                key = %ticket.key,
                ticket = ticket.generation,
                current = entry.generation,
                "discarding superseded fetch result"
            );
            return false;
        }

        entry.fetching = false;
        match result {
            Ok(value) => {
                entry.data = Some(value.clone().into_cached());
                entry.error = None;
                entry.stale = false;
                entry.updated_at = Some(Utc::now());
            }
            Err(error) => {
                entry.error = Some(error.clone());
                entry.stale = true;
            }
        }
        true
    }

    /// Abandons any fetch in flight for `key`.
    pub fn cancel(&mut self, key: &QueryKey) {
        let generation = self.bump();
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.fetching {
                tracing::debug!(key = %key, "cancelling in-flight fetch");
            }
            entry.fetching = false;
            entry.generation = generation;
        }
    }

    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    pub fn invalidate_scope(&mut self, scope: QueryScope) {
        for (key, entry) in &mut self.entries {
            if key.scope() == scope {
                entry.stale = true;
            }
        }
    }

    pub fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.transfers.clear();
    }

    #[must_use]
    pub fn state(&self, key: &QueryKey) -> QueryState {
        let Some(entry) = self.entries.get(key) else {
            return QueryState {
                status: QueryStatus::Idle,
                is_fetching: false,
                is_stale: true,
                error: None,
                updated_at: None,
            };
        };

        let status = if entry.error.is_some() {
            QueryStatus::Failed
        } else if entry.data.is_some() {
            QueryStatus::Success
        } else if entry.fetching {
            QueryStatus::Loading
        } else {
            QueryStatus::Idle
        };

        QueryState {
            status,
            is_fetching: entry.fetching,
            is_stale: entry.stale || entry.data.is_none(),
            error: entry.error.clone(),
            updated_at: entry.updated_at,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
