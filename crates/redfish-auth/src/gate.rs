//! Method-level authorization decision.
//!
//! [`authorize`] is a pure, total function: every combination of inputs
//! produces an [`AccessDecision`], and missing data is a denial.
//!
//! # Example
//!
//! ```
//! use redfish_auth::gate::{authorize, AccessDecision};
//! use redfish_auth::Identity;
//! use redfish_core::AclByMethod;
//!
//! let acl = AclByMethod::new().with("GET", ["Login"]);
//! let decision = authorize("GET", &acl, &Identity::basic("alice", ["Login"]));
//! assert!(decision.is_allowed());
//! ```

use axum::http::StatusCode;
use redfish_core::AclByMethod;

use crate::error::AuthError;
use crate::identity::Identity;

// =============================================================================
// Access Decision
// =============================================================================

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is granted.
    Allow,
    /// Access is denied with a reason.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Get the deny reason if access was denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }

    /// HTTP status for this decision.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Allow => StatusCode::OK,
            Self::Deny(reason) => reason.status(),
        }
    }

    /// Converts a denial into the matching error, `Ok(())` on allow.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The resource has no ACL entry for the method.
    NoAclForMethod { method: String },
    /// No matching privilege and credentials were not verified.
    NotAuthenticated,
    /// Credentials verified but no matching privilege.
    InsufficientPrivilege { method: String },
}

impl DenyReason {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::NoAclForMethod { .. } | Self::InsufficientPrivilege { .. } => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::NoAclForMethod { method } => {
                AuthError::forbidden(format!("method {method} is not permitted on this resource"))
            }
            DenyReason::NotAuthenticated => AuthError::unauthorized("authentication required"),
            DenyReason::InsufficientPrivilege { method } => {
                AuthError::forbidden(format!("insufficient privilege for {method}"))
            }
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Decide whether `identity` may perform `method` against a resource
/// protected by `acl`.
///
/// - No ACL entry for the method: 403 for everyone.
/// - Any overlap between the identity's privileges and the entry: allow.
/// - Otherwise 401 if credentials were not verified, 403 if they were.
#[must_use]
pub fn authorize(method: &str, acl: &AclByMethod, identity: &Identity) -> AccessDecision {
    let Some(required) = acl.required(method) else {
        return AccessDecision::Deny(DenyReason::NoAclForMethod {
            method: method.to_ascii_uppercase(),
        });
    };

    if required.iter().any(|p| identity.privileges.contains(p)) {
        return AccessDecision::Allow;
    }

    if identity.auth_complete {
        AccessDecision::Deny(DenyReason::InsufficientPrivilege {
            method: method.to_ascii_uppercase(),
        })
    } else {
        AccessDecision::Deny(DenyReason::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn identity(privileges: &[&str], auth_complete: bool) -> Identity {
        let mut id = Identity::anonymous();
        id.privileges = privileges.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>();
        id.auth_complete = auth_complete;
        id
    }

    fn get_login_acl() -> AclByMethod {
        AclByMethod::new().with("GET", ["Login"])
    }

    #[test]
    fn test_missing_method_is_forbidden_for_everyone() {
        let acl = get_login_acl();
        for id in [
            identity(&[], false),
            identity(&["Login"], true),
            identity(&["Login", "ConfigureManager"], true),
        ] {
            let decision = authorize("DELETE", &acl, &id);
            assert_eq!(decision.status(), StatusCode::FORBIDDEN);
            assert!(matches!(
                decision.deny_reason(),
                Some(DenyReason::NoAclForMethod { .. })
            ));
        }
    }

    #[test]
    fn test_matching_privilege_allows() {
        let decision = authorize("GET", &get_login_acl(), &identity(&["Login"], true));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_any_single_match_allows() {
        let acl = AclByMethod::new().with("DELETE", ["ConfigureSelf_alice", "ConfigureManager"]);
        assert!(authorize("DELETE", &acl, &identity(&["ConfigureSelf_alice"], true)).is_allowed());
        assert!(authorize("DELETE", &acl, &identity(&["ConfigureManager"], true)).is_allowed());
        assert!(!authorize("DELETE", &acl, &identity(&["ConfigureSelf_bob"], true)).is_allowed());
    }

    #[test]
    fn test_no_privileges_not_authenticated_is_401() {
        let decision = authorize("GET", &get_login_acl(), &identity(&[], false));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::NotAuthenticated));
        assert_eq!(decision.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_no_privileges_authenticated_is_403() {
        let decision = authorize("GET", &get_login_acl(), &identity(&[], true));
        assert_eq!(decision.status(), StatusCode::FORBIDDEN);
        assert!(matches!(
            decision.deny_reason(),
            Some(DenyReason::InsufficientPrivilege { .. })
        ));
    }

    #[test]
    fn test_anonymous_may_post_login() {
        let acl = AclByMethod::new().with("POST", ["Unauthenticated"]);
        assert!(authorize("POST", &acl, &Identity::anonymous()).is_allowed());
        assert_eq!(
            authorize("GET", &acl, &Identity::anonymous()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_empty_required_set_denies() {
        let acl = AclByMethod::new().with("GET", Vec::<String>::new());
        assert_eq!(
            authorize("GET", &acl, &identity(&["Login"], false)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            authorize("GET", &acl, &identity(&["Login"], true)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_denial_converts_to_error() {
        let err = authorize("GET", &get_login_acl(), &identity(&[], false))
            .into_result()
            .unwrap_err();
        assert!(err.is_authentication_error());

        let err = authorize("PATCH", &get_login_acl(), &identity(&["Login"], true))
            .into_result()
            .unwrap_err();
        assert!(err.is_authorization_error());
    }
}
