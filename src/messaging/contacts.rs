//! Who a member may start a conversation with

use crate::models::UserRole;

/// Which profiles show up in a member's contact list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFilter {
    Role(UserRole),
    Everyone,
}

/// Borrowers see lenders, lenders see borrowers, anyone else sees everyone
pub fn contact_filter_for(role: UserRole) -> ContactFilter {
    match role {
        UserRole::Borrower => ContactFilter::Role(UserRole::Lender),
        UserRole::Lender => ContactFilter::Role(UserRole::Borrower),
        UserRole::Admin => ContactFilter::Everyone,
    }
}
