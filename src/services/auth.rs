//! Bearer-token verification against the auth provider
//!
//! Clerk session tokens are RS256 JWTs. Verification is networkless: the
//! instance's public key is configured up front.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::UserId,
};

#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    /// Returns the user id the token was issued for
    fn verify(&self, token: &str) -> AppResult<UserId>;
}

/// Session token claims we rely on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the provider's user id
    pub sub: String,
    /// Authorized party: origin the token was minted for
    #[serde(default)]
    pub azp: Option<String>,
    /// Session id
    #[serde(default)]
    pub sid: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

pub struct ClerkVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl ClerkVerifier {
    pub fn new(public_key_pem: &str, authorized_parties: Vec<String>) -> AppResult<Self> {
        // Env files often carry the PEM on one line with literal "\n"
        let pem = public_key_pem.replace("\\n", "\n");
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid Clerk public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            decoding_key,
            validation,
            authorized_parties,
        })
    }

    fn check_authorized_party(&self, claims: &SessionClaims) -> AppResult<()> {
        if self.authorized_parties.is_empty() {
            return Ok(());
        }
        match &claims.azp {
            Some(azp) if self.authorized_parties.iter().any(|p| p == azp) => Ok(()),
            other => Err(AppError::Unauthorized(format!(
                "authorized party {:?} not allowed",
                other
            ))),
        }
    }
}

impl TokenVerifier for ClerkVerifier {
    fn verify(&self, token: &str) -> AppResult<UserId> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;

        self.check_authorized_party(&data.claims)?;

        Ok(data.claims.sub)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
