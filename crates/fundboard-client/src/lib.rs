//! HTTP client for the fund, cap table and transfer API.
//!
//! [`FundApi`] is the seam the query layer depends on; [`FundApiClient`] is the
//! reqwest implementation. Every failure comes back as an [`ApiError`].

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use fundboard_domain::{
    CapTable, CreateFundRequest, CreateTransferRequest, Fund, FundList, PageParams, ResetSummary,
    Transfer, TransferList,
};
use reqwest::StatusCode;
use serde::Serialize;
use uuid::Uuid;

pub use config::{
    ClientConfigError, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_MS, ENV_API_TIMEOUT_MS, ENV_API_URL,
    ResolvedApiBaseUrl, normalize_base_url, resolve_api_base_url, resolve_timeout_ms,
};
pub use error::{ApiError, ErrorClass, ErrorCode, GENERIC_ERROR_MESSAGE};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Result of a transfer submission. `replayed` is set when the server answered
/// 200 for an idempotency key it had already processed with the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTransfer {
    pub transfer: Transfer,
    pub replayed: bool,
}

#[async_trait]
pub trait FundApi: Send + Sync {
    async fn list_funds(&self, page: PageParams) -> Result<FundList, ApiError>;
    async fn create_fund(&self, request: &CreateFundRequest) -> Result<Fund, ApiError>;
    async fn get_fund(&self, fund_id: Uuid) -> Result<Fund, ApiError>;
    async fn get_cap_table(&self, fund_id: Uuid, page: PageParams) -> Result<CapTable, ApiError>;
    async fn list_transfers(
        &self,
        fund_id: Uuid,
        page: PageParams,
    ) -> Result<TransferList, ApiError>;
    async fn create_transfer(
        &self,
        fund_id: Uuid,
        request: &CreateTransferRequest,
    ) -> Result<CreatedTransfer, ApiError>;
    async fn reset(&self) -> Result<ResetSummary, ApiError>;
}

#[derive(Debug, Clone)]
pub struct FundApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl FundApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FundApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl FundApiClient {
    pub fn new(config: FundApiClientConfig) -> Result<Self, ClientConfigError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(config::MIN_TIMEOUT_MS)),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn funds_path(page: PageParams) -> String {
        format!("/funds{}", page.query_string())
    }

    #[must_use]
    pub fn fund_path(fund_id: Uuid) -> String {
        format!("/funds/{fund_id}")
    }

    #[must_use]
    pub fn cap_table_path(fund_id: Uuid, page: PageParams) -> String {
        format!("/funds/{fund_id}/cap-table{}", page.query_string())
    }

    #[must_use]
    pub fn transfers_path(fund_id: Uuid, page: PageParams) -> String {
        format!("/funds/{fund_id}/transfers{}", page.query_string())
    }

    #[must_use]
    pub fn reset_path() -> &'static str {
        "/reset"
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let request = self.http.get(self.url(path)?);
        let (_, value) = self.send(request, "GET", path).await?;
        Ok(value)
    }

    pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let (_, value) = self.post_json_with_status(path, payload).await?;
        Ok(value)
    }

    async fn post_json_with_status<Req, Res>(
        &self,
        path: &str,
        payload: &Req,
    ) -> Result<(StatusCode, Res), ApiError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let request = self.http.post(self.url(path)?).json(payload);
        self.send(request, "POST", path).await
    }

    fn url(&self, path: &str) -> Result<String, ApiError> {
        self.endpoint(path).ok_or_else(|| {
            ApiError::new(0, ErrorCode::InvalidRequest, "request path must not be empty")
        })
    }

    async fn send<T>(
        &self,
        request: reqwest::RequestBuilder,
        method: &'static str,
        path: &str,
    ) -> Result<(StatusCode, T), ApiError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        tracing::debug!(method, path, request_id = %request_id, "sending fund api request");

        let response = request
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(method, path, request_id = %request_id, error = %error, "fund api request failed");
                ApiError::transport(error)
            })?;

        decode_json_response(response, method, path).await
    }
}

#[async_trait]
impl FundApi for FundApiClient {
    async fn list_funds(&self, page: PageParams) -> Result<FundList, ApiError> {
        self.get_json(Self::funds_path(page).as_str()).await
    }

    async fn create_fund(&self, request: &CreateFundRequest) -> Result<Fund, ApiError> {
        self.post_json(Self::funds_path(PageParams::default()).as_str(), request)
            .await
    }

    async fn get_fund(&self, fund_id: Uuid) -> Result<Fund, ApiError> {
        self.get_json(Self::fund_path(fund_id).as_str()).await
    }

    async fn get_cap_table(&self, fund_id: Uuid, page: PageParams) -> Result<CapTable, ApiError> {
        self.get_json(Self::cap_table_path(fund_id, page).as_str())
            .await
    }

    async fn list_transfers(
        &self,
        fund_id: Uuid,
        page: PageParams,
    ) -> Result<TransferList, ApiError> {
        self.get_json(Self::transfers_path(fund_id, page).as_str())
            .await
    }

    async fn create_transfer(
        &self,
        fund_id: Uuid,
        request: &CreateTransferRequest,
    ) -> Result<CreatedTransfer, ApiError> {
        let path = Self::transfers_path(fund_id, PageParams::default());
        let (status, transfer) = self
            .post_json_with_status::<_, Transfer>(path.as_str(), request)
            .await?;
        Ok(CreatedTransfer {
            transfer,
            replayed: status == StatusCode::OK,
        })
    }

    async fn reset(&self) -> Result<ResetSummary, ApiError> {
        let request = self.http.post(self.url(Self::reset_path())?);
        let (_, summary) = self.send(request, "POST", Self::reset_path()).await?;
        Ok(summary)
    }
}

async fn decode_json_response<T>(
    response: reqwest::Response,
    method: &'static str,
    path: &str,
) -> Result<(StatusCode, T), ApiError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::transport)?;

    if !status.is_success() {
        let error = ApiError::from_response(status, &bytes);
        tracing::debug!(
            method,
            path,
            status = status.as_u16(),
            code = %error.code,
            request_id = error.request_id().unwrap_or_default(),
            "fund api returned an error"
        );
        return Err(error);
    }

    serde_json::from_slice::<T>(&bytes)
        .map(|value| (status, value))
        .map_err(|error| ApiError::decode(status, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund_id() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("uuid")
    }

    #[test]
    fn endpoint_builder_normalizes_paths() {
        let client = FundApiClient::new(FundApiClientConfig::new("https://funds.example.com/api/"))
            .expect("client");

        assert_eq!(
            client.endpoint("/funds"),
            Some("https://funds.example.com/api/funds".to_string())
        );
        assert_eq!(
            client.endpoint("funds"),
            Some("https://funds.example.com/api/funds".to_string())
        );
        assert_eq!(client.endpoint(" "), None);
    }

    #[test]
    fn path_helpers_are_deterministic() {
        let page = PageParams::new(Some(10), Some(20)).expect("page");
        assert_eq!(FundApiClient::funds_path(PageParams::default()), "/funds");
        assert_eq!(FundApiClient::funds_path(page), "/funds?limit=10&offset=20");
        assert_eq!(
            FundApiClient::fund_path(fund_id()),
            "/funds/550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(
            FundApiClient::cap_table_path(fund_id(), page),
            "/funds/550e8400-e29b-41d4-a716-446655440000/cap-table?limit=10&offset=20"
        );
        assert_eq!(
            FundApiClient::transfers_path(fund_id(), PageParams::default()),
            "/funds/550e8400-e29b-41d4-a716-446655440000/transfers"
        );
        assert_eq!(FundApiClient::reset_path(), "/reset");
    }

    #[test]
    fn base_url_missing_is_rejected() {
        let result = FundApiClient::new(FundApiClientConfig::new("   "));
        assert!(matches!(result, Err(ClientConfigError::EmptyBaseUrl)));
    }
}
