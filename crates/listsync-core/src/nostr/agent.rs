//! Client for an external key-signer daemon.
//!
//! The daemon holds the secret key and listens on a Unix domain socket. Each
//! request is one JSON object terminated by `\n`; each response is one JSON line:
//!
//! ```text
//! -> {"id":"<uuid>","method":"nip44_encrypt","params":{"pubkey":"<hex>","plaintext":"..."}}
//! <- {"id":"<uuid>","result":"<ciphertext>"}
//! <- {"id":"<uuid>","error":"not supported"}
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::AGENT_TIMEOUT_SECS;
use crate::error::AgentError;
use crate::models::now_secs;
use crate::nostr::signer::EncryptionScheme;
use crate::tlog;

/// Default socket path: `~/.noorsigner/noorsigner.sock`.
pub fn default_socket_path() -> PathBuf {
    agent_home().join("noorsigner.sock")
}

/// Default trust session path: `~/.noorsigner/trust_session`.
pub fn default_trust_session_path() -> PathBuf {
    agent_home().join("trust_session")
}

fn agent_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".noorsigner")
}

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    id: String,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// A cached unlock of the signing agent that lets it start without a password prompt.
///
/// File format: `token:expires_unix:created_unix:encrypted_blob`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustSession {
    pub expires_at: u64,
    pub created_at: u64,
}

impl TrustSession {
    pub fn parse(content: &str) -> Option<Self> {
        let parts: Vec<&str> = content.trim().split(':').collect();
        if parts.len() != 4 {
            return None;
        }
        Some(Self {
            expires_at: parts[1].parse().ok()?,
            created_at: parts[2].parse().ok()?,
        })
    }

    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse(&content)
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_secs())
    }
}

/// Check whether the default trust session file exists and has not expired.
pub fn has_valid_trust_session() -> bool {
    TrustSession::load(&default_trust_session_path())
        .map(|s| s.is_valid())
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct KeySignerClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl Default for KeySignerClient {
    fn default() -> Self {
        Self::new(default_socket_path())
    }
}

impl KeySignerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(AGENT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// The daemon is considered running when its socket exists.
    pub fn is_running(&self) -> bool {
        self.socket_path.exists()
    }

    pub async fn get_public_key(&self) -> Result<PublicKey, AgentError> {
        let value = self.request("get_npub", json!({})).await?;
        let npub = value
            .as_str()
            .ok_or_else(|| AgentError::Protocol("get_npub result is not a string".to_string()))?;
        PublicKey::parse(npub).map_err(|e| AgentError::Protocol(e.to_string()))
    }

    pub async fn sign_event(&self, unsigned: &UnsignedEvent) -> Result<Event, AgentError> {
        let event_json =
            serde_json::to_value(unsigned).map_err(|e| AgentError::Protocol(e.to_string()))?;
        let value = self
            .request("sign_event", json!({ "event": event_json }))
            .await?;
        // Some agent versions return the event as a JSON string instead of an object
        let event: Event = match value {
            Value::String(raw) => {
                serde_json::from_str(&raw).map_err(|e| AgentError::Protocol(e.to_string()))?
            }
            other => {
                serde_json::from_value(other).map_err(|e| AgentError::Protocol(e.to_string()))?
            }
        };
        event
            .verify()
            .map_err(|e| AgentError::Protocol(format!("agent returned invalid event: {}", e)))?;
        Ok(event)
    }

    pub async fn encrypt(
        &self,
        scheme: EncryptionScheme,
        plaintext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, AgentError> {
        let method = match scheme {
            EncryptionScheme::Nip44 => "nip44_encrypt",
            EncryptionScheme::Nip04 => "nip04_encrypt",
        };
        let value = self
            .request(
                method,
                json!({ "pubkey": counterparty.to_hex(), "plaintext": plaintext }),
            )
            .await?;
        string_result(method, value)
    }

    pub async fn decrypt(
        &self,
        scheme: EncryptionScheme,
        ciphertext: &str,
        counterparty: &PublicKey,
    ) -> Result<String, AgentError> {
        let method = match scheme {
            EncryptionScheme::Nip44 => "nip44_decrypt",
            EncryptionScheme::Nip04 => "nip04_decrypt",
        };
        let value = self
            .request(
                method,
                json!({ "pubkey": counterparty.to_hex(), "ciphertext": ciphertext }),
            )
            .await?;
        string_result(method, value)
    }

    /// Send one request and wait for its response line.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, AgentError> {
        let request = AgentRequest {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params,
        };
        let line =
            serde_json::to_string(&request).map_err(|e| AgentError::Protocol(e.to_string()))?;

        let raw = match tokio::time::timeout(self.timeout, self.round_trip(&line)).await {
            Ok(result) => result?,
            Err(_) => {
                tlog!("AGENT", "{} timed out after {:?}", method, self.timeout);
                return Err(AgentError::Timeout);
            }
        };

        let response: AgentResponse = serde_json::from_str(raw.trim_end())
            .map_err(|e| AgentError::Protocol(format!("{}: {}", e, raw.trim_end())))?;

        if let Some(id) = &response.id {
            if id != &request.id {
                return Err(AgentError::Protocol(format!(
                    "response id {} does not match request id {}",
                    id, request.id
                )));
            }
        }
        if let Some(error) = response.error {
            return Err(AgentError::Remote(error));
        }
        response
            .result
            .ok_or_else(|| AgentError::Protocol("response has neither result nor error".to_string()))
    }

    #[cfg(unix)]
    async fn round_trip(&self, line: &str) -> Result<String, AgentError> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::UnixStream;

        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| AgentError::Connect(e.to_string()))?;

        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        let read = reader.read_line(&mut response).await?;
        if read == 0 {
            return Err(AgentError::Protocol(
                "daemon closed the connection without answering".to_string(),
            ));
        }
        Ok(response)
    }

    #[cfg(not(unix))]
    async fn round_trip(&self, _line: &str) -> Result<String, AgentError> {
        Err(AgentError::Unsupported)
    }
}

fn string_result(method: &str, value: Value) -> Result<String, AgentError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AgentError::Protocol(format!("{} result is not a string", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_session_parse() {
        let session = TrustSession::parse("tok:2000:1000:deadbeef\n").unwrap();
        assert_eq!(session.expires_at, 2000);
        assert_eq!(session.created_at, 1000);
        assert!(session.is_valid_at(1999));
        assert!(!session.is_valid_at(2000));
    }

    #[test]
    fn test_trust_session_rejects_malformed() {
        assert!(TrustSession::parse("tok:2000:1000").is_none());
        assert!(TrustSession::parse("tok:soon:1000:blob").is_none());
    }

    #[test]
    fn test_missing_socket_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let client = KeySignerClient::new(dir.path().join("missing.sock"));
        assert!(!client.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_error_when_daemon_absent() {
        let dir = tempfile::tempdir().unwrap();
        let client = KeySignerClient::new(dir.path().join("missing.sock"));
        let err = client.request("get_npub", json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::Connect(_)));
    }
}
