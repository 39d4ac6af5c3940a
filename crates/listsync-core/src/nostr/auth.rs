use anyhow::Result;
use nostr_sdk::nips::nip49::EncryptedSecretKey;
use nostr_sdk::prelude::*;

use crate::secure_storage::{SecureKey, SecureStorage, SecureStorageError};

/// Whether a stored credential is a NIP-49 ncryptsec that needs a password.
pub fn credentials_need_password(stored: &str) -> bool {
    stored.trim().starts_with("ncryptsec")
}

/// Decode an nsec, a hex secret key, or an ncryptsec (with `password`).
pub fn keys_from_credential(stored: &str, password: Option<&str>) -> Result<Keys> {
    let stored = stored.trim();
    let secret_key = if credentials_need_password(stored) {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Credentials are encrypted, password required"))?;
        let encrypted = EncryptedSecretKey::from_bech32(stored)?;
        encrypted.decrypt(password)?
    } else {
        SecretKey::parse(stored)?
    };
    Ok(Keys::new(secret_key))
}

/// Produce the string to persist for `keys`: an ncryptsec when a password is
/// given, the plain nsec otherwise.
pub fn credential_for_storage(keys: &Keys, password: Option<&str>) -> Result<String> {
    match password.filter(|p| !p.is_empty()) {
        Some(pwd) => {
            let encrypted = keys.secret_key().encrypt(pwd)?;
            Ok(encrypted.to_bech32()?)
        }
        None => Ok(keys.secret_key().to_bech32()?),
    }
}

/// Parse `nsec` and remember it in the OS keyring.
pub fn login_with_nsec(nsec: &str, password: Option<&str>) -> Result<Keys> {
    let keys = keys_from_credential(nsec, None)?;
    let stored = credential_for_storage(&keys, password)?;
    SecureStorage::set(SecureKey::AccountNsec, &stored)?;
    Ok(keys)
}

pub fn has_stored_credentials() -> bool {
    SecureStorage::exists(SecureKey::AccountNsec)
}

/// Load the keyring credential, decrypting it with `password` when needed.
pub fn load_stored_keys(password: Option<&str>) -> Result<Keys> {
    let stored = match SecureStorage::get(SecureKey::AccountNsec) {
        Ok(value) => value,
        Err(SecureStorageError::KeyNotFound(_)) => anyhow::bail!("No stored credentials"),
        Err(e) => return Err(e.into()),
    };
    keys_from_credential(&stored, password)
}

/// Remember a remote signer URI; it carries the connection secret.
pub fn store_bunker_uri(uri: &str) -> Result<()> {
    let uri = uri.trim();
    if !uri.starts_with("bunker://") && !uri.starts_with("nostrconnect://") {
        anyhow::bail!("Not a remote signer URI: {}", uri);
    }
    SecureStorage::set(SecureKey::BunkerUri, uri)?;
    Ok(())
}

pub fn stored_bunker_uri() -> Result<Option<String>> {
    Ok(SecureStorage::get_optional(SecureKey::BunkerUri)?)
}

/// Forget the stored key and remote signer.
pub fn clear_stored_credentials() -> Result<()> {
    SecureStorage::delete(SecureKey::AccountNsec)?;
    SecureStorage::delete(SecureKey::BunkerUri)?;
    Ok(())
}
