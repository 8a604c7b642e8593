use super::domain::Actor;

/// Resolves a presented credential to an authenticated actor. Credential
/// storage, password verification, and token issuance live outside the core;
/// the resolved role is trusted verbatim.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Actor, IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("credential is missing, malformed, or expired")]
    Unauthenticated,
}
