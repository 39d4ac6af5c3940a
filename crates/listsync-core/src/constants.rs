//! Application-wide constants
//!
//! Centralized location for event kinds, default relays and timing values
//! shared by the engine, the list definitions and the CLI.

/// Default relays used for both reading and writing when nothing is configured
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.primal.net",
];

/// Timeout applied to every relay fetch and publish
pub const RELAY_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout for the external signing agent socket
pub const AGENT_TIMEOUT_SECS: u64 = 10;

/// Timeout for NIP-46 remote signer round-trips
pub const REMOTE_SIGNER_TIMEOUT_SECS: u64 = 60;

/// Name of the per-account list state file
pub const LIST_STATE_FILE: &str = "list_state.json";

/// Version written into every file-tier document
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Tag marking a category event as retracted
pub const DELETED_TAG: &str = "deleted";

/// Prefix of the `d` tag identifying a tribe category event
pub const TRIBE_IDENTIFIER_PREFIX: &str = "tribe:";

/// `d` tag of the legacy categorized bookmark list
pub const LEGACY_BOOKMARK_IDENTIFIER: &str = "bookmark";

// Consistency guard defaults
/// Largest tolerated shrink, as a fraction of the last known-good count
pub const GUARD_MAX_SHRINK_RATIO: f64 = 0.5;
/// Lists smaller than this are never blocked by the guard
pub const GUARD_MIN_BASELINE: usize = 10;

// Poller back-off
pub const POLL_INITIAL_INTERVAL_SECS: u64 = 60;
pub const POLL_MAX_INTERVAL_SECS: u64 = 900;

// Nostr event kinds used by the list engine
pub mod kinds {
    /// NIP-02 contact list
    pub const CONTACT_LIST: u16 = 3;
    /// NIP-09 deletion request
    pub const DELETION: u16 = 5;
    /// NIP-51 mute list
    pub const MUTE_LIST: u16 = 10000;
    /// NIP-51 bookmark list
    pub const BOOKMARK_LIST: u16 = 10003;
    /// NIP-51 follow set (one per tribe category)
    pub const FOLLOW_SET: u16 = 30000;
    /// Legacy NIP-51 categorized bookmark list
    pub const LEGACY_BOOKMARKS: u16 = 30001;
}
