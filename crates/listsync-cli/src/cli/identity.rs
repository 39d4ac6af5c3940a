use anyhow::{anyhow, Context, Result};
use listsync_core::nostr::agent::default_socket_path;
use listsync_core::nostr::{
    connect_remote_signer, has_stored_credentials, keys_from_credential, load_stored_keys,
    stored_bunker_uri, KeySignerClient, SigningIdentity,
};
use nostr_sdk::prelude::*;

use super::config::CliConfig;

/// Where the signing identity came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    RemoteSigner,
    Agent,
    ConfigKey,
    Keychain,
}

/// Pick the identity to sign with: bunker URI, then a running signing agent,
/// then the key from the config file, then the OS keychain.
pub fn identity_source(config: &CliConfig, agent_running: bool) -> Option<IdentitySource> {
    if config.bunker_uri.is_some() {
        Some(IdentitySource::RemoteSigner)
    } else if agent_running {
        Some(IdentitySource::Agent)
    } else if config.credentials.is_some() {
        Some(IdentitySource::ConfigKey)
    } else if has_stored_credentials() {
        Some(IdentitySource::Keychain)
    } else {
        None
    }
}

pub async fn resolve_identity(config: &CliConfig, password: Option<&str>) -> Result<SigningIdentity> {
    let mut config = config.clone();
    if config.bunker_uri.is_none() {
        // Keychain lookups fail on headless machines; treat that as no stored signer
        config.bunker_uri = stored_bunker_uri().ok().flatten();
    }
    let config = &config;

    let agent = KeySignerClient::new(
        config
            .agent_socket
            .clone()
            .unwrap_or_else(default_socket_path),
    );
    // An explicitly configured socket must be used even if it is not up yet
    let agent_running = config.agent_socket.is_some() || agent.is_running();

    match identity_source(config, agent_running) {
        Some(IdentitySource::RemoteSigner) => {
            let uri = config.bunker_uri.as_deref().unwrap_or_default();
            let app_keys = match &config.bunker_app_key {
                Some(nsec) => Keys::parse(nsec).context("Invalid bunkerAppKey")?,
                None => Keys::generate(),
            };
            Ok(connect_remote_signer(uri, app_keys, None).await?)
        }
        Some(IdentitySource::Agent) => {
            agent
                .get_public_key()
                .await
                .context("Signing agent did not return a public key")?;
            Ok(SigningIdentity::Agent(agent))
        }
        Some(IdentitySource::ConfigKey) => {
            let creds = config
                .credentials
                .as_ref()
                .ok_or_else(|| anyhow!("No credentials configured"))?;
            let password = creds.password.as_deref().or(password);
            Ok(SigningIdentity::LocalKey(keys_from_credential(&creds.key, password)?))
        }
        Some(IdentitySource::Keychain) => Ok(SigningIdentity::LocalKey(load_stored_keys(password)?)),
        None => Err(anyhow!(
            "No identity available. Run `listsync login <nsec>` or set credentials in the config file"
        )),
    }
}
