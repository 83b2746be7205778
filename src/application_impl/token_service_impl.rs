use crate::application_port::{AuthError, TokenCodec, TokenService};
use crate::domain_model::{AccessToken, Principal, RefreshToken, TokenPair};
use crate::domain_port::{CredentialCache, TakeOutcome};
use std::sync::Arc;
use std::time::Duration;

pub struct RealTokenService {
    codec: Arc<dyn TokenCodec>,
    cache: Arc<dyn CredentialCache>,
    refresh_ttl: Duration,
}

impl RealTokenService {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        cache: Arc<dyn CredentialCache>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            cache,
            refresh_ttl,
        }
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    async fn issue(&self, principal: Principal) -> Result<TokenPair, AuthError> {
        // the two signatures are independent; sign them concurrently
        let (access, refresh) = tokio::try_join!(
            self.codec.sign_access(&principal),
            self.codec.sign_refresh(&principal),
        )?;

        // the pair is only handed back once the refresh token is installed:
        // an access token must never circulate without its cached anchor
        self.cache
            .put(&principal.id, &refresh, self.refresh_ttl.as_secs())
            .await
            .map_err(|e| AuthError::Issuance(e.to_string()))?;

        Ok(TokenPair {
            access_token: AccessToken(access),
            refresh_token: RefreshToken(refresh),
        })
    }

    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError> {
        self.codec.verify_access(token).await
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let principal = self.codec.verify_refresh(refresh_token).await?;

        // exact-match consume: a presented token that is no longer the
        // cached one is spent or was never installed, either way dead
        match self
            .cache
            .take_if_match(&principal.id, refresh_token)
            .await
            .map_err(|e| AuthError::Cache(e.to_string()))?
        {
            TakeOutcome::Consumed => {}
            TakeOutcome::Mismatch | TakeOutcome::Missing => {
                return Err(AuthError::RefreshNotRecognized);
            }
        }

        // claims are trusted once signature-verified; reissuing installs
        // the replacement refresh token in the cache
        self.issue(principal).await
    }
}
