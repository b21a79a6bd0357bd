//! In-memory holder for the access/refresh credential pair. Both tokens are
//! kept together so the store is either fully authenticated or empty; values are
//! `SecretString` so they never end up in `Debug` output or logs.

use secrecy::SecretString;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

#[derive(Debug, Default)]
pub struct TokenStore {
    pair: RwLock<Option<TokenPair>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both tokens at once.
    pub fn set_tokens(&self, access: impl Into<String>, refresh: impl Into<String>) {
        *self.write() = Some(TokenPair {
            access: SecretString::from(access.into()),
            refresh: SecretString::from(refresh.into()),
        });
    }

    /// Rotates the access token after a refresh. Keeps the current refresh token
    /// unless the server issued a new one. Does nothing when the store was cleared
    /// in the meantime.
    pub fn replace_access(&self, access: impl Into<String>, refresh: Option<String>) {
        let mut guard = self.write();
        if let Some(pair) = guard.as_mut() {
            pair.access = SecretString::from(access.into());
            if let Some(refresh) = refresh {
                pair.refresh = SecretString::from(refresh);
            }
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|pair| pair.access.clone())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|pair| pair.refresh.clone())
    }

    #[must_use]
    pub fn has_tokens(&self) -> bool {
        self.read().is_some()
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    // A panic while holding the lock cannot leave a half-written pair behind,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Option<TokenPair>> {
        self.pair
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenPair>> {
        self.pair
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
