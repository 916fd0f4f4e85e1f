use fundboard_domain::{
    CreateFundRequest, CreateTransferRequest, Field, FieldErrors, FundDraft, TransferDraft,
    validate_create_fund, validate_create_transfer,
};
use fundboard_query::MutationError;
use thiserror::Error;

use crate::banner::{ErrorBanner, FUND_FAILED_MESSAGE, TRANSFER_FAILED_MESSAGE};

/// Editable input behind a form.
pub trait FormDraft: Default + Clone {
    type Request;

    /// Banner text used when a failure carries no server message.
    const FALLBACK_MESSAGE: &'static str;

    fn validate(&self) -> Result<Self::Request, FieldErrors>;
}

impl FormDraft for FundDraft {
    type Request = CreateFundRequest;
    const FALLBACK_MESSAGE: &'static str = FUND_FAILED_MESSAGE;

    fn validate(&self) -> Result<CreateFundRequest, FieldErrors> {
        validate_create_fund(self)
    }
}

impl FormDraft for TransferDraft {
    type Request = CreateTransferRequest;
    const FALLBACK_MESSAGE: &'static str = TRANSFER_FAILED_MESSAGE;

    fn validate(&self) -> Result<CreateTransferRequest, FieldErrors> {
        validate_create_transfer(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("form has invalid fields: {0}")]
    Invalid(FieldErrors),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState<D> {
    pub draft: D,
    field_errors: FieldErrors,
    banner: Option<ErrorBanner>,
    submitting: bool,
}

impl<D: FormDraft> FormState<D> {
    #[must_use]
    pub fn new(draft: D) -> Self {
        Self {
            draft,
            field_errors: FieldErrors::new(),
            banner: None,
            submitting: false,
        }
    }

    #[must_use]
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    #[must_use]
    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors.get(field)
    }

    #[must_use]
    pub fn banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting
    }

    /// Validates the draft and marks the form in flight. Previous errors are
    /// cleared only when validation passes.
    pub fn begin_submit(&mut self) -> Result<D::Request, SubmitBlocked> {
        if self.submitting {
            return Err(SubmitBlocked::InFlight);
        }
        match self.draft.validate() {
            Ok(request) => {
                self.field_errors = FieldErrors::new();
                self.banner = None;
                self.submitting = true;
                Ok(request)
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(SubmitBlocked::Invalid(errors))
            }
        }
    }

    /// Records the mutation outcome. Success resets the draft; a server
    /// rejection that names a field is shown on that field as well as in the
    /// banner.
    pub fn finish<T>(&mut self, outcome: &Result<T, MutationError>) {
        self.submitting = false;
        match outcome {
            Ok(_) => {
                self.draft = D::default();
                self.field_errors = FieldErrors::new();
                self.banner = None;
            }
            Err(MutationError::Validation(errors)) => {
                self.field_errors = errors.clone();
            }
            Err(MutationError::Api(error)) => {
                if let Some(field) = error.field() {
                    self.field_errors.insert(field, error.message.clone());
                }
                self.banner = Some(ErrorBanner::from_api(error, D::FALLBACK_MESSAGE));
            }
        }
    }
}
