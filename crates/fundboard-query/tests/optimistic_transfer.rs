#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fundboard_client::{ApiError, CreatedTransfer, ErrorCode, FundApi};
use fundboard_domain::{
    CapTable, CapTableEntry, CreateFundRequest, CreateTransferRequest, Field, Fund, FundDraft,
    FundList, PageParams, ResetSummary, Transfer, TransferDraft, TransferList,
};
use fundboard_query::{MutationError, QueryClient, QueryKey, QueryStatus};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn fund_id() -> Uuid {
    Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("uuid")
}

fn fund() -> Fund {
    Fund {
        id: fund_id(),
        name: "Growth Fund I".to_string(),
        total_units: 1000,
        created_at: at(9),
    }
}

fn server_cap_table() -> CapTable {
    CapTable {
        fund_id: fund_id(),
        entries: vec![
            CapTableEntry {
                owner_name: "A".to_string(),
                units: 600,
                percentage: 60.0,
                acquired_at: at(9),
            },
            CapTableEntry {
                owner_name: "B".to_string(),
                units: 400,
                percentage: 40.0,
                acquired_at: at(10),
            },
        ],
        total: 2,
        limit: 100,
        offset: 0,
    }
}

fn transfer(units: i64) -> Transfer {
    Transfer {
        id: Uuid::new_v4(),
        fund_id: fund_id(),
        from_owner: "A".to_string(),
        to_owner: "B".to_string(),
        units,
        transferred_at: at(11),
    }
}

fn draft(from: &str, to: &str, units: &str) -> TransferDraft {
    TransferDraft {
        from_owner: from.to_string(),
        to_owner: to.to_string(),
        units: units.to_string(),
    }
}

#[derive(Default)]
struct Calls {
    list_funds: usize,
    get_fund: usize,
    cap_table: usize,
    transfers: usize,
    create_transfer: usize,
    create_fund: usize,
    reset: usize,
    last_transfer: Option<CreateTransferRequest>,
}

struct FakeApi {
    calls: Mutex<Calls>,
    funds: Mutex<Vec<Fund>>,
    fund_page_size: AtomicUsize,
    cap_table: Mutex<Result<CapTable, ApiError>>,
    transfer_outcome: Mutex<Result<CreatedTransfer, ApiError>>,
    hold_cap_table: AtomicBool,
    cap_table_entered: Notify,
    cap_table_release: Notify,
    hold_transfers: AtomicBool,
    transfer_entered: Notify,
    transfer_gate: Semaphore,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            funds: Mutex::new(vec![fund()]),
            fund_page_size: AtomicUsize::new(100),
            cap_table: Mutex::new(Ok(server_cap_table())),
            transfer_outcome: Mutex::new(Ok(CreatedTransfer {
                transfer: transfer(250),
                replayed: false,
            })),
            hold_cap_table: AtomicBool::new(false),
            cap_table_entered: Notify::new(),
            cap_table_release: Notify::new(),
            hold_transfers: AtomicBool::new(false),
            transfer_entered: Notify::new(),
            transfer_gate: Semaphore::new(0),
        }
    }

    fn fail_transfers_with(&self, error: ApiError) {
        *self.transfer_outcome.lock().expect("lock") = Err(error);
    }

    fn calls<R>(&self, read: impl FnOnce(&Calls) -> R) -> R {
        read(&self.calls.lock().expect("lock"))
    }
}

#[async_trait]
impl FundApi for FakeApi {
    async fn list_funds(&self, page: PageParams) -> Result<FundList, ApiError> {
        self.calls.lock().expect("lock").list_funds += 1;
        let funds = self.funds.lock().expect("lock").clone();
        let offset = page.offset.unwrap_or(0) as usize;
        let limit = page
            .limit
            .map_or(self.fund_page_size.load(Ordering::SeqCst), |limit| limit as usize);
        Ok(FundList {
            funds: funds.iter().skip(offset).take(limit).cloned().collect(),
            total: funds.len() as i64,
            limit: limit as i64,
            offset: offset as i64,
        })
    }

    async fn create_fund(&self, request: &CreateFundRequest) -> Result<Fund, ApiError> {
        self.calls.lock().expect("lock").create_fund += 1;
        Ok(Fund {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            total_units: request.total_units,
            created_at: at(12),
        })
    }

    async fn get_fund(&self, id: Uuid) -> Result<Fund, ApiError> {
        self.calls.lock().expect("lock").get_fund += 1;
        if id == fund_id() {
            Ok(fund())
        } else {
            Err(ApiError::new(404, ErrorCode::FundNotFound, "fund not found"))
        }
    }

    async fn get_cap_table(&self, _fund_id: Uuid, _page: PageParams) -> Result<CapTable, ApiError> {
        self.calls.lock().expect("lock").cap_table += 1;
        let response = self.cap_table.lock().expect("lock").clone();
        if self.hold_cap_table.load(Ordering::SeqCst) {
            self.cap_table_entered.notify_one();
            self.cap_table_release.notified().await;
        }
        response
    }

    async fn list_transfers(
        &self,
        fund_id: Uuid,
        _page: PageParams,
    ) -> Result<TransferList, ApiError> {
        self.calls.lock().expect("lock").transfers += 1;
        Ok(TransferList {
            fund_id,
            transfers: Vec::new(),
            total: 0,
            limit: 100,
            offset: 0,
        })
    }

    async fn create_transfer(
        &self,
        _fund_id: Uuid,
        request: &CreateTransferRequest,
    ) -> Result<CreatedTransfer, ApiError> {
        {
            let mut calls = self.calls.lock().expect("lock");
            calls.create_transfer += 1;
            calls.last_transfer = Some(request.clone());
        }
        if self.hold_transfers.load(Ordering::SeqCst) {
            self.transfer_entered.notify_one();
            self.transfer_gate.acquire().await.expect("gate open").forget();
        }
        self.transfer_outcome.lock().expect("lock").clone()
    }

    async fn reset(&self) -> Result<ResetSummary, ApiError> {
        self.calls.lock().expect("lock").reset += 1;
        Ok(ResetSummary {
            message: Some("all data deleted".to_string()),
            deleted_funds: Some(1),
            deleted_transfers: Some(0),
            deleted_ownership: Some(2),
        })
    }
}

fn holdings(table: &CapTable) -> Vec<(&str, i64, f64)> {
    table
        .entries
        .iter()
        .map(|entry| (entry.owner_name.as_str(), entry.units, entry.percentage))
        .collect()
}

#[tokio::test]
async fn fresh_reads_are_served_from_cache() {
    let client = QueryClient::new(FakeApi::new());

    client.cap_table(fund_id()).await.expect("first read");
    client.cap_table(fund_id()).await.expect("cached read");
    assert_eq!(client.api().calls(|calls| calls.cap_table), 1);

    client.invalidate(&QueryKey::CapTable(fund_id()));
    client.cap_table(fund_id()).await.expect("refetch");
    assert_eq!(client.api().calls(|calls| calls.cap_table), 2);

    client
        .refetch(QueryKey::CapTable(fund_id()))
        .await
        .expect("forced refetch");
    assert_eq!(client.api().calls(|calls| calls.cap_table), 3);
}

#[tokio::test]
async fn successful_transfer_installs_provisional_table_then_invalidates() {
    let client = QueryClient::new(FakeApi::new());
    client.cap_table(fund_id()).await.expect("seed");
    client.transfers(fund_id()).await.expect("seed");

    let key = Uuid::new_v4();
    let created = client
        .create_transfer(fund_id(), &draft("A", "B", "250"), Some(key))
        .await
        .expect("transfer succeeds");
    assert!(!created.replayed);

    let provisional = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("provisional table");
    assert_eq!(
        holdings(&provisional),
        vec![("A", 350, 35.0), ("B", 650, 65.0)]
    );
    assert!(client.state(&QueryKey::CapTable(fund_id())).is_stale);
    assert!(client.state(&QueryKey::Transfers(fund_id())).is_stale);

    let sent = client
        .api()
        .calls(|calls| calls.last_transfer.clone())
        .expect("request sent");
    assert_eq!(sent.idempotency_key, Some(key));
    assert_eq!(sent.units, 250);

    let resynced = client.cap_table(fund_id()).await.expect("refetch");
    assert_eq!(resynced, server_cap_table());
    assert_eq!(client.api().calls(|calls| calls.cap_table), 2);
    client.transfers(fund_id()).await.expect("refetch");
    assert_eq!(client.api().calls(|calls| calls.transfers), 2);
}

#[tokio::test]
async fn failed_transfer_restores_snapshot_exactly() {
    let client = QueryClient::new(FakeApi::new());
    let snapshot = client.cap_table(fund_id()).await.expect("seed");
    client.api().fail_transfers_with(ApiError::new(
        400,
        ErrorCode::InsufficientUnits,
        "insufficient units",
    ));

    let error = client
        .create_transfer(fund_id(), &draft("A", "B", "250"), None)
        .await
        .expect_err("transfer fails");
    let api_error = error.api_error().expect("api error");
    assert_eq!(api_error.code, ErrorCode::InsufficientUnits);
    assert_eq!(api_error.field(), Some(Field::Units));

    let restored = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("cached table");
    assert_eq!(restored, snapshot);
    assert!(client.state(&QueryKey::CapTable(fund_id())).is_stale);
}

#[tokio::test]
async fn overlapping_failed_transfers_leave_no_provisional_units() {
    let client = Arc::new(QueryClient::new(FakeApi::new()));
    let snapshot = client.cap_table(fund_id()).await.expect("seed");
    client.api().fail_transfers_with(ApiError::new(
        400,
        ErrorCode::InsufficientUnits,
        "insufficient units",
    ));
    client.api().hold_transfers.store(true, Ordering::SeqCst);

    let submit = |to: &'static str, units: &'static str| {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .create_transfer(fund_id(), &draft("A", to, units), None)
                .await
        })
    };

    let first = submit("B", "250");
    client.api().transfer_entered.notified().await;
    let second = submit("C", "100");
    client.api().transfer_entered.notified().await;

    let both = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("provisional table");
    assert_eq!(
        holdings(&both),
        vec![("A", 250, 25.0), ("B", 650, 65.0), ("C", 100, 10.0)]
    );

    client.api().transfer_gate.add_permits(1);
    first
        .await
        .expect("join")
        .expect_err("first transfer fails");
    let remaining = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("provisional table");
    assert_eq!(
        holdings(&remaining),
        vec![("A", 500, 50.0), ("B", 400, 40.0), ("C", 100, 10.0)]
    );

    client.api().transfer_gate.add_permits(1);
    second
        .await
        .expect("join")
        .expect_err("second transfer fails");
    let restored = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("cached table");
    assert_eq!(restored, snapshot);
    assert!(client.state(&QueryKey::CapTable(fund_id())).is_stale);
    assert_eq!(client.with_cache(|cache| cache.transfers_in_flight(fund_id())), 0);
}

#[tokio::test]
async fn conflict_is_returned_without_retry() {
    let client = QueryClient::new(FakeApi::new());
    client.api().fail_transfers_with(ApiError::new(
        409,
        ErrorCode::DuplicateTransfer,
        "idempotency key reused",
    ));

    let error = client
        .create_transfer(fund_id(), &draft("A", "B", "5"), Some(Uuid::new_v4()))
        .await
        .expect_err("conflict");
    assert!(matches!(error, MutationError::Api(ref api) if api.is_conflict()));
    assert_eq!(client.api().calls(|calls| calls.create_transfer), 1);
}

#[tokio::test]
async fn transfer_without_cached_table_skips_optimistic_write() {
    let client = QueryClient::new(FakeApi::new());
    client
        .create_transfer(fund_id(), &draft("A", "B", "1"), None)
        .await
        .expect("transfer succeeds");
    assert_eq!(
        client.cached::<CapTable>(&QueryKey::CapTable(fund_id())),
        None
    );
}

#[tokio::test]
async fn validation_errors_never_reach_the_api() {
    let client = QueryClient::new(FakeApi::new());
    let seeded = client.cap_table(fund_id()).await.expect("seed");

    let error = client
        .create_transfer(fund_id(), &draft("A", "A", "10"), None)
        .await
        .expect_err("self transfer");
    let fields = error.field_errors().expect("field errors");
    assert_eq!(fields.get(Field::ToOwner), Some("Cannot transfer to same owner"));

    let error = client
        .create_transfer(fund_id(), &draft("A", "B", "0"), None)
        .await
        .expect_err("zero units");
    assert!(error.field_errors().expect("field errors").contains(Field::Units));

    assert_eq!(client.api().calls(|calls| calls.create_transfer), 0);
    assert_eq!(
        client.cached::<CapTable>(&QueryKey::CapTable(fund_id())),
        Some(seeded)
    );
    assert!(!client.state(&QueryKey::CapTable(fund_id())).is_stale);
}

#[tokio::test]
async fn in_flight_refetch_cannot_clobber_optimistic_table() {
    let client = Arc::new(QueryClient::new(FakeApi::new()));
    client.cap_table(fund_id()).await.expect("seed");

    client.api().hold_cap_table.store(true, Ordering::SeqCst);
    let background = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.refetch(QueryKey::CapTable(fund_id())).await })
    };
    client.api().cap_table_entered.notified().await;

    client
        .create_transfer(fund_id(), &draft("A", "B", "250"), None)
        .await
        .expect("transfer succeeds");

    client.api().cap_table_release.notify_one();
    background
        .await
        .expect("join")
        .expect("stale fetch still resolves");

    let cached = client
        .cached::<CapTable>(&QueryKey::CapTable(fund_id()))
        .expect("cached table");
    assert_eq!(holdings(&cached), vec![("A", 350, 35.0), ("B", 650, 65.0)]);
}

#[tokio::test]
async fn failed_read_is_recorded_and_retryable() {
    let client = QueryClient::new(FakeApi::new());
    *client.api().cap_table.lock().expect("lock") = Err(ApiError::transport("connection refused"));

    client
        .cap_table(fund_id())
        .await
        .expect_err("first read fails");
    let state = client.state(&QueryKey::CapTable(fund_id()));
    assert_eq!(state.status, QueryStatus::Failed);
    assert_eq!(state.error.map(|error| error.status), Some(0));

    *client.api().cap_table.lock().expect("lock") = Ok(server_cap_table());
    client
        .refetch(QueryKey::CapTable(fund_id()))
        .await
        .expect("retry succeeds");
    assert_eq!(
        client.state(&QueryKey::CapTable(fund_id())).status,
        QueryStatus::Success
    );
}

#[tokio::test]
async fn fund_creation_invalidates_lists_and_seeds_fund() {
    let client = QueryClient::new(FakeApi::new());
    client
        .fund_list(PageParams::default())
        .await
        .expect("list");

    let created = client
        .create_fund(&FundDraft {
            name: "Venture Fund II".to_string(),
            total_units: "5000".to_string(),
            initial_owner: "Founder LLC".to_string(),
        })
        .await
        .expect("fund created");

    assert!(
        client
            .state(&QueryKey::FundList(PageParams::default()))
            .is_stale
    );
    let fetched = client.fund(created.id).await.expect("seeded fund");
    assert_eq!(fetched, created);
    assert_eq!(client.api().calls(|calls| calls.get_fund), 0);

    let error = client
        .create_fund(&FundDraft::default())
        .await
        .expect_err("empty draft");
    assert!(error.field_errors().is_some_and(|fields| fields.len() == 3));
    assert_eq!(client.api().calls(|calls| calls.create_fund), 1);
}

#[tokio::test]
async fn reset_clears_every_cached_query() {
    let client = QueryClient::new(FakeApi::new());
    client.cap_table(fund_id()).await.expect("seed");
    client.fund(fund_id()).await.expect("seed");

    let summary = client.reset().await.expect("reset");
    assert_eq!(summary.deleted_funds, Some(1));
    assert_eq!(client.api().calls(|calls| calls.reset), 1);
    assert!(client.with_cache(|cache| cache.is_empty()));
    assert_eq!(
        client.state(&QueryKey::Fund(fund_id())).status,
        QueryStatus::Idle
    );
}

#[tokio::test]
async fn owners_are_aggregated_from_every_fund() {
    let client = QueryClient::new(FakeApi::new());
    let owners = client.owners().await.expect("owners");
    let names: Vec<_> = owners.iter().map(|owner| owner.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(owners[0].holdings[0].fund_name, "Growth Fund I");
    assert_eq!(client.api().calls(|calls| calls.list_funds), 1);
}

#[tokio::test]
async fn owners_follow_every_fund_page() {
    let client = QueryClient::new(FakeApi::new());
    client.api().fund_page_size.store(1, Ordering::SeqCst);
    client.api().funds.lock().expect("lock").push(Fund {
        id: Uuid::new_v4(),
        name: "Venture Fund II".to_string(),
        total_units: 1000,
        created_at: at(12),
    });

    let owners = client.owners().await.expect("owners");
    assert_eq!(client.api().calls(|calls| calls.list_funds), 2);
    assert_eq!(client.api().calls(|calls| calls.cap_table), 2);
    let funds: Vec<_> = owners[0]
        .holdings
        .iter()
        .map(|holding| holding.fund_name.as_str())
        .collect();
    assert_eq!(funds, vec!["Growth Fund I", "Venture Fund II"]);
    assert_eq!(owners[0].total_funds(), 2);
}
