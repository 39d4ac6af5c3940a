pub mod commands;
pub mod config;
pub mod identity;
pub mod tracing_setup;

pub use commands::{execute, CliCommand, MuteAs};
pub use config::{CliConfig, Credentials};
pub use identity::{identity_source, resolve_identity, IdentitySource};
pub use tracing_setup::init_tracing;
