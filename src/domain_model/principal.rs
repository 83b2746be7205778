use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable external identity key assigned by the identity provider.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        PrincipalId(s.to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal id must not be empty")]
    EmptyId,
    #[error("principal email is not plausible: {0:?}")]
    BadEmail(String),
}

/// The authenticated identity record carried as the token payload.
/// Immutable once produced by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub display_name: String,
}

impl Principal {
    /// Records received from a collaborator are validated, not trusted
    /// structurally.
    pub fn validated(self) -> Result<Self, PrincipalError> {
        if self.id.0.is_empty() {
            return Err(PrincipalError::EmptyId);
        }
        if !self.email.contains('@') {
            return Err(PrincipalError::BadEmail(self.email));
        }
        Ok(self)
    }
}
