//! Ownership and role checks for quote mutations

use super::models::Quote;
use crate::user::UserRole;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteAction {
    Edit,
    Delete,
    Verify,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Ownership denial. Surfaced to clients as 401, not 403, for
    /// compatibility with the historical behavior of this API.
    #[error("Unauthorized")]
    NotOwner,
    #[error("Access denied")]
    AdminRequired,
}

/// Decides whether `actor` may perform `action` on `quote`.
///
/// Edit and Delete are owner-only regardless of role: an admin cannot edit
/// someone else's quote. Verify is admin-only regardless of ownership.
/// Callers resolve unknown quote ids to 404 before consulting the policy.
pub fn authorize(
    action: QuoteAction,
    quote: &Quote,
    actor_id: i64,
    actor_role: UserRole,
) -> Result<(), PolicyError> {
    match action {
        QuoteAction::Edit | QuoteAction::Delete => {
            if quote.owner_id == actor_id {
                Ok(())
            } else {
                Err(PolicyError::NotOwner)
            }
        }
        QuoteAction::Verify => {
            if actor_role == UserRole::Admin {
                Ok(())
            } else {
                Err(PolicyError::AdminRequired)
            }
        }
    }
}
