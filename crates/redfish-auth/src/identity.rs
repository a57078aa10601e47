//! Per-request identity produced by credential resolution.

use std::collections::BTreeSet;

/// Base privilege held by every request, with or without credentials.
pub const UNAUTHENTICATED: &str = "Unauthenticated";

/// Privilege required to log in and read most resources.
pub const LOGIN: &str = "Login";

/// Role privilege expanded to `ConfigureSelf_<username>` at resolution time.
pub const CONFIGURE_SELF: &str = "ConfigureSelf";

/// Administrative privilege over sessions and managers.
pub const CONFIGURE_MANAGER: &str = "ConfigureManager";

/// How an identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// No credentials were presented.
    Anonymous,
    /// `Authorization: Basic ...`
    Basic,
    /// Session token header.
    Session,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Basic => "basic",
            Self::Session => "session",
        }
    }
}

/// Resolved privileges for a single request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Granted privileges, ordered.
    pub privileges: BTreeSet<String>,
    /// `true` iff credentials were verified, even when no privilege was granted.
    pub auth_complete: bool,
    /// Account name, absent for anonymous requests.
    pub username: Option<String>,
    /// Session the token was bound to, for session-token identities.
    pub session_uri: Option<String>,
    pub scheme: AuthScheme,
}

impl Identity {
    /// Identity of a request without credentials.
    pub fn anonymous() -> Self {
        Self {
            privileges: BTreeSet::from([UNAUTHENTICATED.to_string()]),
            auth_complete: false,
            username: None,
            session_uri: None,
            scheme: AuthScheme::Anonymous,
        }
    }

    /// Identity verified with basic credentials.
    pub fn basic<I, S>(username: impl Into<String>, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            privileges: with_base_privilege(privileges),
            auth_complete: true,
            username: Some(username.into()),
            session_uri: None,
            scheme: AuthScheme::Basic,
        }
    }

    /// Identity verified with a session token.
    pub fn session<I, S>(username: impl Into<String>, session_uri: impl Into<String>, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            privileges: with_base_privilege(privileges),
            auth_complete: true,
            username: Some(username.into()),
            session_uri: Some(session_uri.into()),
            scheme: AuthScheme::Session,
        }
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privileges.contains(privilege)
    }
}

/// Verified credentials never hold less than anonymous requests.
fn with_base_privilege<I, S>(privileges: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set: BTreeSet<String> = privileges.into_iter().map(Into::into).collect();
    set.insert(UNAUTHENTICATED.to_string());
    set
}

/// Expands role privileges for `username`.
///
/// The result always contains [`UNAUTHENTICATED`]. `ConfigureSelf` is
/// replaced by the user-scoped `ConfigureSelf_<username>` so that ACLs can
/// grant users access to their own resources only.
pub fn expand_role_privileges<'a, I>(username: &str, assigned: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let expanded = assigned.into_iter().map(|p| {
        if p == CONFIGURE_SELF {
            configure_self_for(username)
        } else {
            p.clone()
        }
    });
    with_base_privilege(expanded)
}

/// `ConfigureSelf_<username>`
pub fn configure_self_for(username: &str) -> String {
    format!("{CONFIGURE_SELF}_{username}")
}
