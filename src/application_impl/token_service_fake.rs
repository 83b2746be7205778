use crate::application_port::{AuthError, TokenService};
use crate::domain_model::{AccessToken, Principal, PrincipalId, RefreshToken, TokenPair};

/// Minimal fake for wiring-level use only. Tokens are transparent strings
/// that encode the principal id they were minted for.
#[derive(Debug, Default)]
pub struct FakeTokenService;

impl FakeTokenService {
    pub fn new() -> Self {
        Self
    }
}

fn fake_principal(id: &str) -> Principal {
    Principal {
        id: PrincipalId::from(id),
        email: format!("{id}@example.test"),
        display_name: id.to_owned(),
    }
}

#[async_trait::async_trait]
impl TokenService for FakeTokenService {
    async fn issue(&self, principal: Principal) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: AccessToken(format!("fake-access-token:{}", principal.id)),
            refresh_token: RefreshToken(format!("fake-refresh-token:{}", principal.id)),
        })
    }

    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError> {
        match token.strip_prefix("fake-access-token:") {
            Some(id) => Ok(fake_principal(id)),
            None => Err(AuthError::Verification),
        }
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        match refresh_token.strip_prefix("fake-refresh-token:") {
            Some(id) => self.issue(fake_principal(id)).await,
            None => Err(AuthError::RefreshNotRecognized),
        }
    }
}
