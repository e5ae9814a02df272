use crate::domain::RoleId;

// ============== Authorization ==============

/// True iff the invoker holds at least one allowed role.
///
/// An empty allow-list denies everyone.
pub fn is_authorized(invoker_roles: &[RoleId], allowed_roles: &[RoleId]) -> bool {
    if allowed_roles.is_empty() {
        return false;
    }
    invoker_roles.iter().any(|r| allowed_roles.contains(r))
}
