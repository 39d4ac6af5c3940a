use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nostr_connect::client::NostrConnect;
use nostr_sdk::prelude::*;

use crate::error::CryptoError;
use crate::nostr::agent::KeySignerClient;
use crate::nostr::signer::{
    decrypt_with_fallback, encrypt_with_fallback, EncryptionScheme, EventSigner, SchemeCipher,
};

/// The mechanism that holds the user's key. Exactly one is active per session.
#[derive(Clone)]
pub enum SigningIdentity {
    /// Secret key held in process memory
    LocalKey(Keys),
    /// External signing daemon reached over a local socket
    Agent(KeySignerClient),
    /// NIP-46 remote signer (bunker)
    RemoteSigner(Arc<NostrConnect>),
    /// Any other signer capability supplied by the host application
    HostCapability(Arc<dyn NostrSigner>),
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningIdentity::LocalKey(keys) => f
                .debug_tuple("LocalKey")
                .field(&keys.public_key().to_hex())
                .finish(),
            SigningIdentity::Agent(client) => f
                .debug_tuple("Agent")
                .field(&client.socket_path())
                .finish(),
            SigningIdentity::RemoteSigner(_) => f.write_str("RemoteSigner"),
            SigningIdentity::HostCapability(_) => f.write_str("HostCapability"),
        }
    }
}

impl SigningIdentity {
    pub fn mechanism(&self) -> &'static str {
        match self {
            SigningIdentity::LocalKey(_) => "local-key",
            SigningIdentity::Agent(_) => "agent",
            SigningIdentity::RemoteSigner(_) => "remote-signer",
            SigningIdentity::HostCapability(_) => "host",
        }
    }

    /// Only a local key can be read back without a round-trip.
    pub fn local_keys(&self) -> Option<&Keys> {
        match self {
            SigningIdentity::LocalKey(keys) => Some(keys),
            _ => None,
        }
    }
}

impl From<Keys> for SigningIdentity {
    fn from(keys: Keys) -> Self {
        SigningIdentity::LocalKey(keys)
    }
}

fn scheme_error(scheme: EncryptionScheme, err: impl fmt::Display) -> CryptoError {
    CryptoError::SchemeFailed {
        scheme: scheme.label(),
        message: err.to_string(),
    }
}

async fn signer_encrypt(
    signer: &dyn NostrSigner,
    scheme: EncryptionScheme,
    plaintext: &str,
    counterparty: &PublicKey,
) -> Result<String, CryptoError> {
    let result = match scheme {
        EncryptionScheme::Nip44 => signer.nip44_encrypt(counterparty, plaintext).await,
        EncryptionScheme::Nip04 => signer.nip04_encrypt(counterparty, plaintext).await,
    };
    result.map_err(|e| scheme_error(scheme, e))
}

async fn signer_decrypt(
    signer: &dyn NostrSigner,
    scheme: EncryptionScheme,
    ciphertext: &str,
    counterparty: &PublicKey,
) -> Result<String, CryptoError> {
    let result = match scheme {
        EncryptionScheme::Nip44 => signer.nip44_decrypt(counterparty, ciphertext).await,
        EncryptionScheme::Nip04 => signer.nip04_decrypt(counterparty, ciphertext).await,
    };
    result.map_err(|e| scheme_error(scheme, e))
}

#[async_trait]
impl SchemeCipher for SigningIdentity {
    async fn encrypt_with(
        &self,
        scheme: EncryptionScheme,
        plaintext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        match self {
            SigningIdentity::LocalKey(keys) => match scheme {
                EncryptionScheme::Nip44 => nip44::encrypt(
                    keys.secret_key(),
                    counterparty,
                    plaintext,
                    nip44::Version::default(),
                )
                .map_err(|e| scheme_error(scheme, e)),
                EncryptionScheme::Nip04 => {
                    nip04::encrypt(keys.secret_key(), counterparty, plaintext)
                        .map_err(|e| scheme_error(scheme, e))
                }
            },
            SigningIdentity::Agent(client) => client
                .encrypt(scheme, plaintext, counterparty)
                .await
                .map_err(|e| scheme_error(scheme, e)),
            SigningIdentity::RemoteSigner(signer) => {
                signer_encrypt(signer.as_ref(), scheme, plaintext, counterparty).await
            }
            SigningIdentity::HostCapability(signer) => {
                signer_encrypt(signer.as_ref(), scheme, plaintext, counterparty).await
            }
        }
    }

    async fn decrypt_with(
        &self,
        scheme: EncryptionScheme,
        ciphertext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        match self {
            SigningIdentity::LocalKey(keys) => match scheme {
                EncryptionScheme::Nip44 => nip44::decrypt(keys.secret_key(), counterparty, ciphertext)
                    .map_err(|e| scheme_error(scheme, e)),
                EncryptionScheme::Nip04 => {
                    nip04::decrypt(keys.secret_key(), counterparty, ciphertext)
                        .map_err(|e| scheme_error(scheme, e))
                }
            },
            SigningIdentity::Agent(client) => client
                .decrypt(scheme, ciphertext, counterparty)
                .await
                .map_err(|e| scheme_error(scheme, e)),
            SigningIdentity::RemoteSigner(signer) => {
                signer_decrypt(signer.as_ref(), scheme, ciphertext, counterparty).await
            }
            SigningIdentity::HostCapability(signer) => {
                signer_decrypt(signer.as_ref(), scheme, ciphertext, counterparty).await
            }
        }
    }
}

#[async_trait]
impl EventSigner for SigningIdentity {
    async fn public_key(&self) -> Result<PublicKey, CryptoError> {
        match self {
            SigningIdentity::LocalKey(keys) => Ok(keys.public_key()),
            SigningIdentity::Agent(client) => Ok(client.get_public_key().await?),
            SigningIdentity::RemoteSigner(signer) => signer
                .get_public_key()
                .await
                .map_err(|e| CryptoError::Signing(e.to_string())),
            SigningIdentity::HostCapability(signer) => signer
                .get_public_key()
                .await
                .map_err(|e| CryptoError::Signing(e.to_string())),
        }
    }

    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, CryptoError> {
        match self {
            SigningIdentity::LocalKey(keys) => unsigned
                .sign_with_keys(keys)
                .map_err(|e| CryptoError::Signing(e.to_string())),
            SigningIdentity::Agent(client) => Ok(client.sign_event(&unsigned).await?),
            SigningIdentity::RemoteSigner(signer) => signer
                .sign_event(unsigned)
                .await
                .map_err(|e| CryptoError::Signing(e.to_string())),
            SigningIdentity::HostCapability(signer) => signer
                .sign_event(unsigned)
                .await
                .map_err(|e| CryptoError::Signing(e.to_string())),
        }
    }

    async fn encrypt(
        &self,
        plaintext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        encrypt_with_fallback(self, plaintext, counterparty).await
    }

    async fn decrypt(
        &self,
        ciphertext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        decrypt_with_fallback(self, ciphertext, counterparty).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_key_self_encrypt_roundtrip() {
        let keys = Keys::generate();
        let pk = keys.public_key();
        let identity = SigningIdentity::from(keys);

        let ciphertext = identity.encrypt("[[\"p\",\"abc\"]]", &pk).await.unwrap();
        assert_ne!(ciphertext, "[[\"p\",\"abc\"]]");
        let plaintext = identity.decrypt(&ciphertext, &pk).await.unwrap();
        assert_eq!(plaintext, "[[\"p\",\"abc\"]]");
    }

    #[tokio::test]
    async fn test_local_key_reads_legacy_nip04() {
        let keys = Keys::generate();
        let pk = keys.public_key();
        let legacy = nip04::encrypt(keys.secret_key(), &pk, "hello").unwrap();

        let identity = SigningIdentity::from(keys);
        assert_eq!(identity.decrypt(&legacy, &pk).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_local_key_signs() {
        let keys = Keys::generate();
        let identity = SigningIdentity::from(keys.clone());
        let unsigned = EventBuilder::new(Kind::MuteList, "").build(keys.public_key());
        let event = identity.sign(unsigned).await.unwrap();
        assert!(event.verify().is_ok());
        assert_eq!(event.pubkey, keys.public_key());
    }

    #[tokio::test]
    async fn test_host_capability_delegates() {
        let keys = Keys::generate();
        let pk = keys.public_key();
        let identity = SigningIdentity::HostCapability(Arc::new(keys));
        assert_eq!(identity.public_key().await.unwrap(), pk);
        let ciphertext = identity.encrypt("x", &pk).await.unwrap();
        assert_eq!(identity.decrypt(&ciphertext, &pk).await.unwrap(), "x");
    }

    #[test]
    fn test_mechanism_names() {
        let identity = SigningIdentity::from(Keys::generate());
        assert_eq!(identity.mechanism(), "local-key");
        assert!(identity.local_keys().is_some());
        let agent = SigningIdentity::Agent(KeySignerClient::new("/tmp/none.sock"));
        assert_eq!(agent.mechanism(), "agent");
        assert!(agent.local_keys().is_none());
    }
}
