//! ============================================================================
//! Session - Explicitly injected identity
//! ============================================================================
//! The token and signed-in user are owned by whoever performs login; the
//! client only reads them. Pass a `Session` into `ApiClient::new` rather than
//! reaching for ambient state.
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Marketplace roles, each with its own dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Collector,
    Citizen,
    Kabadiwala,
}

impl Role {
    /// Landing route for the role's dashboard
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Collector => "/collector",
            Role::Citizen => "/dashboard",
            Role::Kabadiwala => "/marketplace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn with_user(mut self, user: SessionUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}
