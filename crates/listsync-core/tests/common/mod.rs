#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use listsync_core::config::CoreConfig;
use listsync_core::error::CryptoError;
use listsync_core::nostr::{EventSigner, MemoryTransport, SigningIdentity};
use listsync_core::store::ListStateStore;
use listsync_core::sync::EngineContext;
use nostr_sdk::prelude::*;
use tempfile::TempDir;

pub const TEST_RELAY: &str = "wss://memory.test";

/// One account wired to an in-memory relay inside a temp data dir.
pub struct Harness {
    pub dir: TempDir,
    pub keys: Keys,
    pub transport: Arc<MemoryTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_keys(Keys::generate())
    }

    pub fn with_keys(keys: Keys) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            keys,
            transport: Arc::new(MemoryTransport::new()),
        }
    }

    pub fn author(&self) -> PublicKey {
        self.keys.public_key()
    }

    pub fn signer(&self) -> Arc<dyn EventSigner> {
        Arc::new(SigningIdentity::from(self.keys.clone()))
    }

    pub fn config(&self) -> CoreConfig {
        test_config(self.dir.path())
    }

    pub fn context(&self) -> EngineContext {
        self.context_with_signer(self.signer())
    }

    pub fn context_with_signer(&self, signer: Arc<dyn EventSigner>) -> EngineContext {
        let account_dir = self.dir.path().join(self.author().to_hex());
        let state = Arc::new(ListStateStore::open(&account_dir).unwrap());
        EngineContext::from_config(
            &self.config(),
            account_dir,
            signer,
            self.transport.clone(),
            state,
        )
    }
}

pub fn test_config(data_dir: &Path) -> CoreConfig {
    let mut config = CoreConfig::new(data_dir);
    config.relays.read_relays = vec![TEST_RELAY.to_string()];
    config.relays.write_relays = vec![TEST_RELAY.to_string()];
    config.relays.timeout_secs = 1;
    config
}

pub fn random_pubkey() -> String {
    Keys::generate().public_key().to_hex()
}

/// Knows its key but refuses to sign or encrypt.
pub struct RefusingSigner {
    pub keys: Keys,
}

#[async_trait]
impl EventSigner for RefusingSigner {
    async fn public_key(&self) -> Result<PublicKey, CryptoError> {
        Ok(self.keys.public_key())
    }

    async fn sign(&self, _unsigned: UnsignedEvent) -> Result<Event, CryptoError> {
        Err(CryptoError::Signing("user rejected".to_string()))
    }

    async fn encrypt(
        &self,
        _plaintext: &str,
        _counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        Err(CryptoError::Exhausted("user rejected".to_string()))
    }

    async fn decrypt(
        &self,
        _ciphertext: &str,
        _counterparty: &PublicKey,
    ) -> Result<String, CryptoError> {
        Err(CryptoError::Exhausted("user rejected".to_string()))
    }
}

/// A contact list signed by `keys` with the given public `p` tags and raw content.
pub fn contact_event(keys: &Keys, pubkeys: &[String], content: &str, created_at: u64) -> Event {
    let tags: Vec<Tag> = pubkeys
        .iter()
        .map(|pk| Tag::parse(["p", pk.as_str()]).unwrap())
        .collect();
    EventBuilder::new(Kind::ContactList, content)
        .tags(tags)
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(keys)
        .unwrap()
}
