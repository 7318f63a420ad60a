use thiserror::Error;

use stockroom_core::AccountId;

use crate::ownership::OwnedResource;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: caller {caller} does not own this resource")]
    NotOwner { caller: AccountId },
}

/// Authorize `caller` against the owner recorded on `resource`.
///
/// - No IO
/// - No panics
/// - Single-owner policy: there is no role that bypasses ownership
pub fn authorize_owner<R>(resource: &R, caller: AccountId) -> Result<(), AuthzError>
where
    R: OwnedResource + ?Sized,
{
    if resource.owner() == caller {
        Ok(())
    } else {
        Err(AuthzError::NotOwner { caller })
    }
}
