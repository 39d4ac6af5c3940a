use std::sync::Arc;
use std::time::Duration;

use nostr::nips::nip46::NostrConnectURI;
use nostr_connect::client::NostrConnect;
use nostr_sdk::prelude::*;

use crate::constants::REMOTE_SIGNER_TIMEOUT_SECS;
use crate::error::CryptoError;
use crate::logging::short;
use crate::nostr::identity::SigningIdentity;
use crate::tlog;

/// Accept `bunker://` and `nostrconnect://` URIs; anything else is rejected early
/// so a typo does not hang for the full connect timeout.
pub fn parse_remote_signer_uri(uri: &str) -> Result<NostrConnectURI, CryptoError> {
    let trimmed = uri.trim();
    if !(trimmed.starts_with("bunker://") || trimmed.starts_with("nostrconnect://")) {
        return Err(CryptoError::Signing(format!(
            "not a remote signer URI: {}",
            trimmed
        )));
    }
    NostrConnectURI::parse(trimmed).map_err(|e| CryptoError::Signing(e.to_string()))
}

/// Connect to a NIP-46 remote signer and wrap it as a [`SigningIdentity`].
///
/// `app_keys` identify this client to the signer; pass the same keys on every
/// launch so the signer keeps its approval.
pub async fn connect_remote_signer(
    uri: &str,
    app_keys: Keys,
    timeout: Option<Duration>,
) -> Result<SigningIdentity, CryptoError> {
    let uri = parse_remote_signer_uri(uri)?;
    let timeout = timeout.unwrap_or(Duration::from_secs(REMOTE_SIGNER_TIMEOUT_SECS));

    let client = NostrConnect::new(uri, app_keys, timeout, None)
        .map_err(|e| CryptoError::Signing(format!("Failed to create remote signer: {}", e)))?;

    // The first request performs the handshake
    let user_pubkey = client
        .get_public_key()
        .await
        .map_err(|e| CryptoError::Signing(format!("Remote signer handshake failed: {}", e)))?;
    tlog!("BUNKER", "connected to remote signer for {}", short(&user_pubkey.to_hex()));

    Ok(SigningIdentity::RemoteSigner(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_nip46_uri() {
        assert!(parse_remote_signer_uri("https://example.com").is_err());
        assert!(parse_remote_signer_uri("").is_err());
    }

    #[test]
    fn test_parses_bunker_uri() {
        let signer = Keys::generate().public_key().to_hex();
        let uri = format!("bunker://{}?relay=wss://relay.nsec.app&secret=abc", signer);
        assert!(parse_remote_signer_uri(&uri).is_ok());
    }
}
