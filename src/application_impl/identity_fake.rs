use crate::application_port::{IdentityError, IdentityVerifier};
use crate::domain_model::{Principal, PrincipalId};

/// Stands in for the external identity provider. The real handshake is a
/// collaborator outside this repo; this fake derives a stable principal
/// from the callback code so the gateway flows can run end to end.
#[derive(Debug, Default)]
pub struct FakeIdentityVerifier;

impl FakeIdentityVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for FakeIdentityVerifier {
    async fn verify_callback(&self, code: &str) -> Result<Principal, IdentityError> {
        if code.is_empty() {
            return Err(IdentityError::Rejected);
        }
        let id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, code.as_bytes());
        Principal {
            id: PrincipalId(id.to_string()),
            email: format!("{code}@example.test"),
            display_name: code.to_owned(),
        }
        .validated()
        .map_err(|e| IdentityError::Provider(e.to_string()))
    }
}
