use std::sync::{Arc, Mutex, MutexGuard};

use fundboard_client::{ApiError, FundApi};
use fundboard_domain::{
    AggregatedOwner, CapTable, Fund, FundList, PageParams, TransferList, aggregate_owners,
};
use uuid::Uuid;

use crate::cache::{FetchTicket, QueryCache, QueryData, QueryState};
use crate::key::QueryKey;

/// Cached reads and optimistic mutations over a [`FundApi`].
///
/// The cache lock is only taken inside synchronous sections; it is never held
/// across an API call.
pub struct QueryClient<A> {
    api: Arc<A>,
    cache: Mutex<QueryCache>,
}

impl<A: FundApi> QueryClient<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_shared(Arc::new(api))
    }

    #[must_use]
    pub fn with_shared(api: Arc<A>) -> Self {
        Self {
            api,
            cache: Mutex::new(QueryCache::new()),
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, QueryCache> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn with_cache<R>(&self, f: impl FnOnce(&mut QueryCache) -> R) -> R {
        let mut cache = self.lock();
        f(&mut cache)
    }

    #[must_use]
    pub fn cached<T: QueryData>(&self, key: &QueryKey) -> Option<T> {
        self.lock().get(key)
    }

    #[must_use]
    pub fn state(&self, key: &QueryKey) -> QueryState {
        self.lock().state(key)
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.lock().invalidate(key);
    }

    fn start<T: QueryData>(&self, key: QueryKey, force: bool) -> Result<T, FetchTicket> {
        let mut cache = self.lock();
        if !force && let Some(value) = cache.fresh::<T>(&key) {
            tracing::debug!(key = %key, "serving cached query");
            return Ok(value);
        }
        tracing::debug!(key = %key, force, "fetching query");
        Err(cache.begin_fetch(key))
    }

    fn settle<T: QueryData>(&self, ticket: &FetchTicket, result: &Result<T, ApiError>) {
        if let Err(error) = result {
            tracing::debug!(key = %ticket.key(), code = %error.code, "query failed");
        }
        self.lock().finish_fetch(ticket, result);
    }

    pub async fn fund_list(&self, page: PageParams) -> Result<FundList, ApiError> {
        self.load_fund_list(page, false).await
    }

    async fn load_fund_list(&self, page: PageParams, force: bool) -> Result<FundList, ApiError> {
        let ticket = match self.start(QueryKey::FundList(page), force) {
            Ok(cached) => return Ok(cached),
            Err(ticket) => ticket,
        };
        let result = self.api.list_funds(page).await;
        self.settle(&ticket, &result);
        result
    }

    pub async fn fund(&self, fund_id: Uuid) -> Result<Fund, ApiError> {
        self.load_fund(fund_id, false).await
    }

    async fn load_fund(&self, fund_id: Uuid, force: bool) -> Result<Fund, ApiError> {
        let ticket = match self.start(QueryKey::Fund(fund_id), force) {
            Ok(cached) => return Ok(cached),
            Err(ticket) => ticket,
        };
        let result = self.api.get_fund(fund_id).await;
        self.settle(&ticket, &result);
        result
    }

    pub async fn cap_table(&self, fund_id: Uuid) -> Result<CapTable, ApiError> {
        self.load_cap_table(fund_id, false).await
    }

    async fn load_cap_table(&self, fund_id: Uuid, force: bool) -> Result<CapTable, ApiError> {
        let ticket = match self.start(QueryKey::CapTable(fund_id), force) {
            Ok(cached) => return Ok(cached),
            Err(ticket) => ticket,
        };
        let result = self.api.get_cap_table(fund_id, PageParams::default()).await;
        self.settle(&ticket, &result);
        result
    }

    pub async fn transfers(&self, fund_id: Uuid) -> Result<TransferList, ApiError> {
        self.load_transfers(fund_id, false).await
    }

    async fn load_transfers(&self, fund_id: Uuid, force: bool) -> Result<TransferList, ApiError> {
        let ticket = match self.start(QueryKey::Transfers(fund_id), force) {
            Ok(cached) => return Ok(cached),
            Err(ticket) => ticket,
        };
        let result = self
            .api
            .list_transfers(fund_id, PageParams::default())
            .await;
        self.settle(&ticket, &result);
        result
    }

    /// Fetches `key` again regardless of cache freshness.
    pub async fn refetch(&self, key: QueryKey) -> Result<(), ApiError> {
        match key {
            QueryKey::FundList(page) => self.load_fund_list(page, true).await.map(|_| ()),
            QueryKey::Fund(fund_id) => self.load_fund(fund_id, true).await.map(|_| ()),
            QueryKey::CapTable(fund_id) => self.load_cap_table(fund_id, true).await.map(|_| ()),
            QueryKey::Transfers(fund_id) => self.load_transfers(fund_id, true).await.map(|_| ()),
        }
    }

    /// Every owner across all funds, with one holding per fund. Fund pages
    /// are followed until the server's reported total is reached.
    pub async fn owners(&self) -> Result<Vec<AggregatedOwner>, ApiError> {
        let mut funds = Vec::new();
        let mut page = PageParams::default();
        loop {
            let list = self.fund_list(page).await?;
            let received = list.funds.len();
            funds.extend(list.funds);
            if received == 0 || funds.len() as i64 >= list.total {
                break;
            }
            let Ok(offset) = u32::try_from(funds.len()) else {
                break;
            };
            tracing::debug!(offset, total = list.total, "following fund list page");
            page = PageParams {
                limit: page.limit,
                offset: Some(offset),
            };
        }

        let mut tables = Vec::with_capacity(funds.len());
        for fund in funds {
            let cap_table = self.cap_table(fund.id).await?;
            tables.push((fund, cap_table));
        }
        Ok(aggregate_owners(&tables))
    }
}
