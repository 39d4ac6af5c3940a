pub mod agent;
pub mod auth;
pub mod bunker;
pub mod identity;
pub mod memory;
pub mod signer;
pub mod transport;

pub use agent::{has_valid_trust_session, KeySignerClient, TrustSession};
pub use auth::{
    clear_stored_credentials, credentials_need_password, has_stored_credentials,
    keys_from_credential, load_stored_keys, login_with_nsec, store_bunker_uri, stored_bunker_uri,
};
pub use bunker::connect_remote_signer;
pub use identity::SigningIdentity;
pub use memory::MemoryTransport;
pub use signer::{EncryptionScheme, EventSigner, SchemeCipher};
pub use transport::{RelayPool, RelayTransport};
