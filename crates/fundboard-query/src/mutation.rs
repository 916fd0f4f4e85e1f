use chrono::Utc;
use fundboard_client::{ApiError, CreatedTransfer, FundApi};
use fundboard_domain::{
    FieldErrors, Fund, FundDraft, ResetSummary, TransferDraft, validate_create_fund,
    validate_create_transfer,
};
use thiserror::Error;
use uuid::Uuid;

use crate::client::QueryClient;
use crate::key::{QueryKey, QueryScope};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// Rejected locally; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl MutationError {
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Api(_) => None,
        }
    }

    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Validation(_) => None,
            Self::Api(error) => Some(error),
        }
    }
}

impl<A: FundApi> QueryClient<A> {
    /// Submits a transfer with an optimistic cap-table update.
    ///
    /// Fetches in flight for the fund's cap table and transfer list are
    /// cancelled first. When a cap table is cached, a provisional one is
    /// installed until the request settles. A failure takes this transfer back
    /// out of the provisional table; when every overlapping transfer on the
    /// fund fails, the table cached before the first of them is restored
    /// exactly. Both keys are invalidated once the request settles.
    pub async fn create_transfer(
        &self,
        fund_id: Uuid,
        draft: &TransferDraft,
        idempotency_key: Option<Uuid>,
    ) -> Result<CreatedTransfer, MutationError> {
        let mut request = validate_create_transfer(draft)?;
        request.idempotency_key = idempotency_key;

        let cap_key = QueryKey::CapTable(fund_id);
        let transfers_key = QueryKey::Transfers(fund_id);

        let pending = self.with_cache(|cache| {
            cache.cancel(&cap_key);
            cache.cancel(&transfers_key);
            cache.begin_transfer(fund_id, &request, Utc::now())
        });

        let result = self.api().create_transfer(fund_id, &request).await;

        self.with_cache(|cache| {
            if let Err(error) = &result {
                tracing::warn!(
                    fund_id = %fund_id,
                    code = %error.code,
                    status = error.status,
                    still_in_flight = cache.transfers_in_flight(fund_id).saturating_sub(1),
                    "transfer failed, rolling back cap table"
                );
            }
            cache.settle_transfer(pending, result.is_ok());
            cache.invalidate(&cap_key);
            cache.invalidate(&transfers_key);
        });

        if let Ok(created) = &result {
            tracing::debug!(
                fund_id = %fund_id,
                transfer_id = %created.transfer.id,
                replayed = created.replayed,
                "transfer settled"
            );
        }
        result.map_err(MutationError::Api)
    }

    pub async fn create_fund(&self, draft: &FundDraft) -> Result<Fund, MutationError> {
        let request = validate_create_fund(draft)?;
        let fund = self.api().create_fund(&request).await?;
        self.with_cache(|cache| {
            cache.invalidate_scope(QueryScope::FundLists);
            cache.set(QueryKey::Fund(fund.id), fund.clone());
        });
        tracing::debug!(fund_id = %fund.id, "fund created");
        Ok(fund)
    }

    /// Deletes all server data and empties the cache.
    pub async fn reset(&self) -> Result<ResetSummary, MutationError> {
        let summary = self.api().reset().await?;
        self.with_cache(crate::cache::QueryCache::clear);
        tracing::debug!(
            deleted_funds = summary.deleted_funds,
            deleted_transfers = summary.deleted_transfers,
            "reset complete"
        );
        Ok(summary)
    }
}
