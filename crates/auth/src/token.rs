//! HS256 token issue/verify.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use assetflow_core::EmailAddress;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Issued tokens are long-lived; the client holds one per login session.
pub const TOKEN_TTL_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encoding/decoding failed: {0}")]
    Codec(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    InvalidClaims(#[from] TokenValidationError),
}

/// Symmetric-key token service.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for the given identity, valid for [`TOKEN_TTL_DAYS`].
    pub fn issue(
        &self,
        email: EmailAddress,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = JwtClaims {
            sub: email,
            name,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature and claims, returning the decoded claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailAddress {
        EmailAddress::parse("user@company.com").unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let service = TokenService::new("test-secret");
        let now = Utc::now();
        let token = service.issue(email(), "User".to_string(), now).unwrap();

        let claims = service.verify(&token, now).unwrap();
        assert_eq!(claims.sub, email());
        assert_eq!(claims.name, "User");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let now = Utc::now();
        let token = issuer.issue(email(), "User".to_string(), now).unwrap();

        assert!(matches!(
            verifier.verify(&token, now),
            Err(TokenError::Codec(_))
        ));
    }
}
