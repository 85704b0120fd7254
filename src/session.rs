//! Signed-in identity and the role check in front of protected screens.
//!
//! The session lives only in this process. It is cleared once at start-up so
//! authentication never survives a restart, and set once per successful
//! sign-in.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Manager,
    Contributor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Contributor => "contributor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Role::Manager),
            "contributor" => Ok(Role::Contributor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectToSignIn,
}

/// Decides whether a protected view may render. Absent markers, or a role
/// different from the required one, send the user back to sign-in.
pub fn evaluate(
    stored_role: Option<&str>,
    stored_identity: Option<&str>,
    required_role: Option<&str>,
) -> Access {
    match (stored_role, stored_identity) {
        (Some(role), Some(_)) => match required_role {
            Some(required) if required != role => Access::RedirectToSignIn,
            _ => Access::Allow,
        },
        _ => Access::RedirectToSignIn,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Unauthenticated,
    Authenticated { role: String, user_id: String },
}

/// Process-scoped identity, passed to every screen that needs it.
#[derive(Debug, Clone)]
pub struct SessionContext {
    state: SessionState,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    pub fn clear(&mut self) {
        if self.state != SessionState::Unauthenticated {
            info!("Clearing session");
        }
        self.state = SessionState::Unauthenticated;
    }

    pub fn set(&mut self, role: &str, user_id: i32) {
        info!(role, user_id, "Session established");
        self.state = SessionState::Authenticated {
            role: role.to_string(),
            user_id: user_id.to_string(),
        };
    }

    pub fn role(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { role, .. } => Some(role),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { user_id, .. } => Some(user_id),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.identity().and_then(|id| id.parse().ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state != SessionState::Unauthenticated
    }

    pub fn gate(&self, required: Role) -> Access {
        evaluate(self.role(), self.identity(), Some(required.as_str()))
    }

    /// Home screen for the signed-in role, if the role is one we know.
    pub fn landing_role(&self) -> Option<Role> {
        self.role().and_then(|r| r.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_markers_redirect() {
        assert_eq!(evaluate(None, None, Some("manager")), Access::RedirectToSignIn);
        assert_eq!(evaluate(Some("manager"), None, Some("manager")), Access::RedirectToSignIn);
        assert_eq!(evaluate(None, Some("5"), None), Access::RedirectToSignIn);
    }

    #[test]
    fn role_must_match_when_required() {
        assert_eq!(
            evaluate(Some("contributor"), Some("5"), Some("manager")),
            Access::RedirectToSignIn
        );
        assert_eq!(evaluate(Some("manager"), Some("5"), Some("manager")), Access::Allow);
        assert_eq!(evaluate(Some("contributor"), Some("5"), None), Access::Allow);
    }

    #[test]
    fn session_transitions() {
        let mut session = SessionContext::new();
        assert_eq!(session.gate(Role::Manager), Access::RedirectToSignIn);

        session.set("manager", 5);
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some(5));
        assert_eq!(session.gate(Role::Manager), Access::Allow);
        assert_eq!(session.gate(Role::Contributor), Access::RedirectToSignIn);
        assert_eq!(session.landing_role(), Some(Role::Manager));

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.gate(Role::Manager), Access::RedirectToSignIn);
    }

    #[test]
    fn unknown_role_has_no_landing() {
        let mut session = SessionContext::new();
        session.set("auditor", 9);
        assert_eq!(session.landing_role(), None);
        assert_eq!("auditor".parse::<Role>(), Err(UnknownRole("auditor".to_string())));
    }
}
