//! Session lifecycle: issue, validate, rotate and revoke device sessions.
//!
//! Every decision reads the Token Store at call time; there is no in-process
//! token cache. Store state overrides signature validity in both directions:
//! a correctly signed token whose record is blocked or missing is rejected.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AuthError;
use super::jwt::TokenSigner;
use crate::models::auth::{NewTokenRecord, Principal, TokenPair, TokenRecord};
use crate::store::{StoreError, TokenStore};

/// Issues and checks token pairs against the Token Store.
#[derive(Clone)]
pub struct SessionManager {
    tokens: Arc<dyn TokenStore>,
    signer: TokenSigner,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(tokens: Arc<dyn TokenStore>, signer: TokenSigner) -> Self {
        Self { tokens, signer }
    }

    /// Convenience constructor from the raw signing secret.
    pub fn with_secret(tokens: Arc<dyn TokenStore>, secret: &[u8]) -> Self {
        Self::new(tokens, TokenSigner::new(secret))
    }

    /// Start a new device session for `user_id`.
    pub async fn issue(
        &self,
        user_id: &str,
        device_info: Option<String>,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.signer.issue_pair(user_id)?;
        let record = self
            .tokens
            .insert_token(NewTokenRecord {
                user_id: user_id.to_string(),
                access_token: pair.access_token.clone(),
                refresh_token: pair.refresh_token.clone(),
                device_info,
            })
            .await?;
        info!(user_id, session_id = %record.id, "issued device session");
        Ok(pair)
    }

    /// Resolve a presented access token to the caller and its session record.
    pub async fn validate_access(&self, raw_token: &str) -> Result<Principal, AuthError> {
        let claims = self.signer.verify_access(raw_token)?;
        let matches = self
            .tokens
            .find_active_by_access(&claims.sub, raw_token)
            .await?;
        let record = exactly_one(matches, "access token")?
            .ok_or_else(|| AuthError::InvalidToken("Token revoked or unknown".into()))?;
        Ok(Principal {
            user_id: claims.sub,
            record,
        })
    }

    /// Exchange a refresh token for a new pair, rewriting the same record.
    ///
    /// The store is consulted before the signature; the old pair stops
    /// working the moment the record is overwritten.
    pub async fn rotate(&self, raw_refresh: Option<&str>) -> Result<TokenPair, AuthError> {
        let raw_refresh = raw_refresh
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MissingToken("No refresh token provided".into()))?;

        let matches = self.tokens.find_active_by_refresh(raw_refresh).await?;
        let record = exactly_one(matches, "refresh token")?
            .ok_or_else(|| AuthError::InvalidToken("Invalid refresh token".into()))?;

        let claims = self.signer.verify_refresh(raw_refresh)?;
        if claims.sub != record.user_id {
            warn!(session_id = %record.id, "refresh token subject does not match its record");
            return Err(AuthError::InvalidToken("Invalid refresh token".into()));
        }

        let pair = self.signer.issue_pair(&record.user_id)?;
        let rotated = self
            .tokens
            .rotate_token(
                &record.id,
                raw_refresh,
                &pair.access_token,
                &pair.refresh_token,
            )
            .await?;
        match rotated {
            Some(_) => {
                debug!(session_id = %record.id, "rotated device session");
                Ok(pair)
            }
            None => {
                // A concurrent rotation or logout changed the record first.
                debug!(session_id = %record.id, "lost refresh race");
                Err(AuthError::InvalidToken("Invalid refresh token".into()))
            }
        }
    }

    /// Block exactly the given session.
    pub async fn revoke(&self, record: &TokenRecord) -> Result<(), AuthError> {
        self.tokens.block_token(&record.id).await?;
        info!(user_id = %record.user_id, session_id = %record.id, "revoked device session");
        Ok(())
    }

    /// Block every session of `user_id`, whatever its current status.
    pub async fn revoke_all(&self, user_id: &str) -> Result<u64, AuthError> {
        let blocked = self.tokens.block_all_tokens(user_id).await?;
        info!(user_id, blocked, "revoked all device sessions");
        Ok(blocked)
    }
}

/// Zero or one record; several matches mean the uniqueness invariant broke.
fn exactly_one(mut matches: Vec<TokenRecord>, what: &str) -> Result<Option<TokenRecord>, AuthError> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(AuthError::Store(StoreError::Corrupt(format!(
            "{n} active records share one {what}"
        )))),
    }
}
