use stockroom_core::AccountId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; every protected handler reads it before
/// touching a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    account_id: AccountId,
}

impl CallerContext {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }
}
