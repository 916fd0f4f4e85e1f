use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    CreateFund,
    ResetConfirm,
    OwnerDetail { fund_id: Uuid, owner_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    Cancel,
    BackdropClick,
    Escape,
    SubmitSucceeded,
}

impl CloseTrigger {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::BackdropClick => "backdrop",
            Self::Escape => "escape",
            Self::SubmitSucceeded => "submitted",
        }
    }
}

/// Closed/open dialog state. While busy every close trigger is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal<K> {
    open: Option<K>,
    busy: bool,
    closed_by: Option<CloseTrigger>,
}

impl<K> Default for Modal<K> {
    fn default() -> Self {
        Self {
            open: None,
            busy: false,
            closed_by: None,
        }
    }
}

impl<K> Modal<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Trigger that last closed the modal.
    #[must_use]
    pub fn closed_by(&self) -> Option<CloseTrigger> {
        self.closed_by
    }

    #[must_use]
    pub fn kind(&self) -> Option<&K> {
        self.open.as_ref()
    }

    /// Opens `kind`, replacing whatever was open. Refused while busy.
    pub fn open(&mut self, kind: K) -> bool {
        if self.busy {
            return false;
        }
        self.open = Some(kind);
        self.closed_by = None;
        true
    }

    /// Marks the destructive action in flight. Only meaningful while open.
    pub fn begin_action(&mut self) -> bool {
        if self.open.is_none() || self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Ends the in-flight action, closing on success and staying open on
    /// failure.
    pub fn finish_action(&mut self, succeeded: bool) {
        self.busy = false;
        if succeeded {
            self.close(CloseTrigger::SubmitSucceeded);
        }
    }

    /// Returns whether the modal actually closed.
    pub fn close(&mut self, trigger: CloseTrigger) -> bool {
        if self.busy || self.open.is_none() {
            return false;
        }
        self.open = None;
        self.closed_by = Some(trigger);
        true
    }
}
