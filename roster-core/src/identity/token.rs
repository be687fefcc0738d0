use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims the service reads from the identity provider's session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid verification key: {0}")]
    InvalidKey(String),
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token issuer rejected")]
    InvalidIssuer,
    #[error("token authorized party rejected")]
    InvalidAuthorizedParty,
    #[error("token subject is empty")]
    MissingSubject,
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Settings shared by both key flavours.
#[derive(Debug, Clone, Default)]
pub struct TokenSettings {
    pub issuer: Option<String>,
    pub authorized_parties: Vec<String>,
    pub leeway_secs: u64,
}

/// Validates identity provider session tokens. Production deployments
/// verify RS256 with the provider's PEM public key; HS256 with a shared
/// secret exists for development and tests.
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("issuer", &self.validation.iss)
            .field("authorized_parties", &self.authorized_parties)
            .finish()
    }
}

impl IdentityVerifier {
    pub fn rs256(public_key_pem: &str, settings: TokenSettings) -> Result<Self, TokenError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|err| TokenError::InvalidKey(err.to_string()))?;
        Ok(Self::build(key, Algorithm::RS256, settings))
    }

    pub fn hs256(secret: &[u8], settings: TokenSettings) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidKey("HS256 secret must not be empty".into()));
        }
        Ok(Self::build(
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
            settings,
        ))
    }

    fn build(key: DecodingKey, algorithm: Algorithm, settings: TokenSettings) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = settings.leeway_secs;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = settings.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key,
            validation,
            authorized_parties: settings.authorized_parties,
        }
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                _ => TokenError::Malformed(err.to_string()),
            })?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::MissingSubject);
        }
        // Tokens without `azp` come from backend-issued sessions and pass.
        if !self.authorized_parties.is_empty()
            && let Some(azp) = claims.azp.as_deref()
            && !self.authorized_parties.iter().any(|party| party == azp)
        {
            return Err(TokenError::InvalidAuthorizedParty);
        }

        Ok(claims)
    }
}
