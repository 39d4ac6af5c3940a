//! Signing oracle and the encryption fallback chain.

use async_trait::async_trait;
use nostr_sdk::prelude::*;

use crate::error::CryptoError;
use crate::tlog;

/// Content encryption schemes, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionScheme {
    Nip44,
    Nip04,
}

impl EncryptionScheme {
    /// Order in which schemes are attempted for both directions.
    pub const PREFERENCE: [EncryptionScheme; 2] = [EncryptionScheme::Nip44, EncryptionScheme::Nip04];

    pub fn label(self) -> &'static str {
        match self {
            EncryptionScheme::Nip44 => "NIP-44",
            EncryptionScheme::Nip04 => "NIP-04",
        }
    }
}

/// Everything the list engine needs from the active identity.
#[async_trait]
pub trait EventSigner: Send + Sync {
    async fn public_key(&self) -> Result<PublicKey, CryptoError>;

    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, CryptoError>;

    /// Encrypt with the preferred scheme, falling back once to the legacy one.
    async fn encrypt(&self, plaintext: &str, counterparty: &PublicKey)
        -> Result<String, CryptoError>;

    async fn decrypt(&self, ciphertext: &str, counterparty: &PublicKey)
        -> Result<String, CryptoError>;
}

/// One scheme at a time; the fallback chain is layered on top.
#[async_trait]
pub trait SchemeCipher: Send + Sync {
    async fn encrypt_with(
        &self,
        scheme: EncryptionScheme,
        plaintext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError>;

    async fn decrypt_with(
        &self,
        scheme: EncryptionScheme,
        ciphertext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError>;
}

/// Try each scheme in [`EncryptionScheme::PREFERENCE`] exactly once.
pub async fn encrypt_with_fallback<C: SchemeCipher + ?Sized>(
    cipher: &C,
    plaintext: &str,
    counterparty: &PublicKey,
) -> Result<String, CryptoError> {
    let mut failures = Vec::new();
    for scheme in EncryptionScheme::PREFERENCE {
        match cipher.encrypt_with(scheme, plaintext, counterparty).await {
            Ok(ciphertext) => return Ok(ciphertext),
            Err(e) => {
                tlog!("CRYPTO", "{} encrypt failed: {}", scheme.label(), e);
                failures.push(format!("{}: {}", scheme.label(), e));
            }
        }
    }
    Err(CryptoError::Exhausted(failures.join("; ")))
}

/// Mirror of [`encrypt_with_fallback`] for decryption.
pub async fn decrypt_with_fallback<C: SchemeCipher + ?Sized>(
    cipher: &C,
    ciphertext: &str,
    counterparty: &PublicKey,
) -> Result<String, CryptoError> {
    let mut failures = Vec::new();
    for scheme in EncryptionScheme::PREFERENCE {
        match cipher.decrypt_with(scheme, ciphertext, counterparty).await {
            Ok(plaintext) => return Ok(plaintext),
            Err(e) => {
                tlog!("CRYPTO", "{} decrypt failed: {}", scheme.label(), e);
                failures.push(format!("{}: {}", scheme.label(), e));
            }
        }
    }
    Err(CryptoError::Exhausted(failures.join("; ")))
}
