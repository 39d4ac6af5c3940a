/// Secure storage for account secrets
///
/// Uses OS-backed secure storage:
/// - macOS/iOS: Keychain
/// - Linux: Secret Service API (gnome-keyring, KWallet, etc.)
/// - Windows: Credential Manager
use keyring::Entry;
use std::fmt;

const SERVICE_NAME: &str = "io.listsync.client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureKey {
    /// nsec or ncryptsec of the active account
    AccountNsec,
    /// NIP-46 bunker URI, including its connection secret
    BunkerUri,
}

impl SecureKey {
    fn key_name(&self) -> &'static str {
        match self {
            SecureKey::AccountNsec => "account_nsec",
            SecureKey::BunkerUri => "bunker_uri",
        }
    }
}

impl fmt::Display for SecureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SecureStorageError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(SecureKey),
}

pub struct SecureStorage;

impl SecureStorage {
    pub fn set(key: SecureKey, value: &str) -> Result<(), SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn get(key: SecureKey) -> Result<String, SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        match entry.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(SecureStorageError::KeyNotFound(key)),
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Deleting a missing entry is not an error.
    pub fn delete(key: SecureKey) -> Result<(), SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Like [`SecureStorage::get`], with a missing entry mapped to `None`.
    pub fn get_optional(key: SecureKey) -> Result<Option<String>, SecureStorageError> {
        match Self::get(key) {
            Ok(value) => Ok(Some(value)),
            Err(SecureStorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn exists(key: SecureKey) -> bool {
        Self::get(key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_are_distinct() {
        assert_ne!(
            SecureKey::AccountNsec.to_string(),
            SecureKey::BunkerUri.to_string()
        );
        assert_eq!(SecureKey::BunkerUri.to_string(), "bunker_uri");
    }
}
