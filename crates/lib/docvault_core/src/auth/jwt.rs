//! JWT token generation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenPair};

/// Access token lifetime: 10 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 10 * 60;

/// Length of the random nonce embedded in every token.
const NONCE_LEN: usize = 16;

/// Signs and verifies access/refresh tokens (HS256) with one process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
        }
    }

    /// Override the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Mint an access/refresh pair for `user_id`.
    ///
    /// Both tokens embed the issue time in milliseconds and a fresh random
    /// nonce; only the access token carries `exp`.
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            timestamp: now.timestamp_millis(),
            nonce: generate_nonce(),
            iat: now.timestamp(),
            exp: None,
        };
        let refresh_token = self.sign(&claims)?;
        let access_token = self.sign(&TokenClaims {
            exp: Some((now + self.access_ttl).timestamp()),
            ..claims
        })?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token's signature and expiry.
    ///
    /// An expired token yields [`AuthError::TokenExpired`]; every other
    /// failure yields [`AuthError::InvalidToken`].
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken("Invalid token".into()),
            })
    }

    /// Verify a refresh token's signature. Refresh tokens carry no expiry.
    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken("Invalid refresh token".into()))
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }
}

/// Random alphanumeric nonce from the thread-local CSPRNG.
fn generate_nonce() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips_claims() {
        let signer = TokenSigner::new(b"test-secret");
        let pair = signer.issue_pair("user-1").unwrap();

        let claims = signer.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.nonce.len(), NONCE_LEN);
        assert!(claims.exp.is_some());
    }

    #[test]
    fn refresh_token_has_no_expiry() {
        let signer = TokenSigner::new(b"test-secret");
        let pair = signer.issue_pair("user-1").unwrap();

        let claims = signer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let signer = TokenSigner::new(b"test-secret");
        let pair = signer.issue_pair("user-1").unwrap();

        // Missing `exp` fails access validation.
        assert!(matches!(
            signer.verify_access(&pair.refresh_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn consecutive_pairs_never_collide() {
        let signer = TokenSigner::new(b"test-secret");
        let a = signer.issue_pair("user-1").unwrap();
        let b = signer.issue_pair("user-1").unwrap();
        assert_ne!(a.access_token, b.access_token);
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.access_token, a.refresh_token);
    }

    #[test]
    fn expired_access_token_is_distinguished() {
        // Past the default 60s validation leeway.
        let signer = TokenSigner::new(b"test-secret").with_access_ttl(Duration::seconds(-300));
        let pair = signer.issue_pair("user-1").unwrap();

        assert!(matches!(
            signer.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_not_expired() {
        let signer = TokenSigner::new(b"test-secret");
        let other = TokenSigner::new(b"other-secret");
        let pair = signer.issue_pair("user-1").unwrap();

        assert!(matches!(
            other.verify_access(&pair.access_token),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            other.verify_refresh(&pair.refresh_token),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            signer.verify_refresh("not.a.jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
