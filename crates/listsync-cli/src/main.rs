use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use listsync_cli::cli::{execute, init_tracing, resolve_identity, CliCommand, CliConfig, MuteAs};
use listsync_core::error::ListError;
use listsync_core::nostr::{
    clear_stored_credentials, login_with_nsec, store_bunker_uri, RelayPool,
};
use listsync_core::session::{ListKind, ListSession};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "listsync")]
#[command(about = "Keep Nostr follow, mute, bookmark and tribe lists in sync")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (defaults to <config dir>/listsync/config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Password for an encrypted stored key
    #[arg(long, env = "LISTSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListArg {
    Contacts,
    Mutes,
    Bookmarks,
    Tribes,
}

impl From<ListArg> for ListKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Contacts => ListKind::Contacts,
            ListArg::Mutes => ListKind::Mutes,
            ListArg::Bookmarks => ListKind::Bookmarks,
            ListArg::Tribes => ListKind::Tribes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MuteArg {
    User,
    Thread,
    Word,
    Hashtag,
}

impl From<MuteArg> for MuteAs {
    fn from(arg: MuteArg) -> Self {
        match arg {
            MuteArg::User => MuteAs::User,
            MuteArg::Thread => MuteAs::Thread,
            MuteArg::Word => MuteAs::Word,
            MuteArg::Hashtag => MuteAs::Hashtag,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Store an nsec (encrypted when --password is given) or a bunker:// URI in the OS keychain
    Login {
        secret: String,
    },

    /// Remove stored credentials from the OS keychain
    Logout,

    /// Show the items of a list
    List {
        list: ListArg,
    },

    /// Add an item: npub/hex for contacts and tribes, anything for bookmarks
    Add {
        list: ListArg,
        target: String,
        /// Keep the item in the encrypted part of the list
        #[arg(long)]
        private: bool,
        /// Tribe category (root when omitted)
        #[arg(long)]
        category: Option<String>,
        /// What a mute entry refers to
        #[arg(long = "as", value_enum, default_value = "user")]
        mute_as: MuteArg,
    },

    /// Remove an item
    Remove {
        list: ListArg,
        target: String,
    },

    /// Show what the relays hold, without changing anything
    Fetch {
        list: ListArg,
    },

    /// Merge relay items into the local list (all lists when omitted)
    Sync {
        list: Option<ListArg>,
    },

    /// Publish the local list to relays
    Publish {
        list: ListArg,
        /// Publish even if the list shrank dramatically
        #[arg(long)]
        confirm: bool,
    },

    /// Overwrite the local list with the relay state
    Replace {
        list: ListArg,
        /// Replace even if the list shrinks dramatically
        #[arg(long)]
        confirm: bool,
    },

    /// Save the local list to its backup files
    Save {
        list: ListArg,
    },

    /// Replace the local list with its backup files
    Restore {
        list: ListArg,
    },

    /// Import lists from their legacy encoding (all lists when omitted)
    Migrate {
        list: Option<ListArg>,
    },

    /// Turn relay sync on for a list
    Enable {
        list: ListArg,
    },

    /// Turn relay sync off for a list
    Disable {
        list: ListArg,
    },

    /// Show persisted sync state of a list
    State {
        list: ListArg,
    },

    /// Compare local tribe categories with the relays
    Categories,

    /// Create a tribe category
    CreateCategory {
        name: String,
    },

    /// Rename a tribe category
    RenameCategory {
        from: String,
        to: String,
    },

    /// Delete a tribe category; members move to root
    DeleteCategory {
        name: String,
    },

    /// Check whether a note would be hidden by the mute list
    MuteCheck {
        note_id: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        root: Option<String>,
        /// Note content, checked against muted words and hashtags
        #[arg(long)]
        text: Option<String>,
    },

    /// Poll relays for a list until interrupted
    Watch {
        list: ListArg,
    },
}

fn all_or(list: Option<ListArg>) -> Vec<ListKind> {
    match list {
        Some(list) => vec![list.into()],
        None => ListKind::ALL.to_vec(),
    }
}

fn to_command(command: Commands) -> Option<CliCommand> {
    let command = match command {
        Commands::Login { .. } | Commands::Logout => return None,
        Commands::List { list } => CliCommand::List { list: list.into() },
        Commands::Add {
            list,
            target,
            private,
            category,
            mute_as,
        } => CliCommand::Add {
            list: list.into(),
            target,
            private,
            category,
            mute_as: mute_as.into(),
        },
        Commands::Remove { list, target } => CliCommand::Remove {
            list: list.into(),
            target,
        },
        Commands::Fetch { list } => CliCommand::Fetch { list: list.into() },
        Commands::Sync { list } => CliCommand::Sync {
            lists: all_or(list),
        },
        Commands::Publish { list, confirm } => CliCommand::Publish {
            list: list.into(),
            confirm,
        },
        Commands::Replace { list, confirm } => CliCommand::Replace {
            list: list.into(),
            confirm,
        },
        Commands::Save { list } => CliCommand::Save { list: list.into() },
        Commands::Restore { list } => CliCommand::Restore { list: list.into() },
        Commands::Migrate { list } => CliCommand::Migrate {
            lists: all_or(list),
        },
        Commands::Enable { list } => CliCommand::SetEnabled {
            list: list.into(),
            enabled: true,
        },
        Commands::Disable { list } => CliCommand::SetEnabled {
            list: list.into(),
            enabled: false,
        },
        Commands::State { list } => CliCommand::State { list: list.into() },
        Commands::Categories => CliCommand::Categories,
        Commands::CreateCategory { name } => CliCommand::CreateCategory { name },
        Commands::RenameCategory { from, to } => CliCommand::RenameCategory { from, to },
        Commands::DeleteCategory { name } => CliCommand::DeleteCategory { name },
        Commands::MuteCheck {
            note_id,
            author,
            parent,
            root,
            text,
        } => CliCommand::MuteCheck {
            note_id,
            author,
            parent,
            root,
            text,
        },
        Commands::Watch { list } => CliCommand::Watch { list: list.into() },
    };
    Some(command)
}

fn print_json(value: &Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to render output: {}", e),
    }
}

fn report_error(e: &anyhow::Error) {
    eprintln!("Error: {}", e);
    if let Some(list_error) = e.downcast_ref::<ListError>() {
        if list_error.needs_confirmation() {
            eprintln!("Re-run with --confirm to proceed anyway.");
        } else if list_error.is_retryable() {
            eprintln!("This is temporary; try again shortly.");
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let config = CliConfig::resolve(
        cli.config.as_deref(),
        CliConfig::default_path().as_deref(),
    )?;
    let password = cli.password.as_deref();

    match &cli.command {
        Commands::Login { secret } if secret.contains("://") => {
            store_bunker_uri(secret)?;
            return Ok(serde_json::json!({ "remoteSigner": true }));
        }
        Commands::Login { secret } => {
            let keys = login_with_nsec(secret, password)?;
            return Ok(serde_json::json!({ "loggedIn": keys.public_key().to_hex() }));
        }
        Commands::Logout => {
            clear_stored_credentials()?;
            return Ok(serde_json::json!({ "loggedOut": true }));
        }
        _ => {}
    }
    let Some(command) = to_command(cli.command) else {
        return Ok(Value::Null);
    };

    let core = config.core_config();
    let identity = resolve_identity(&config, password).await?;
    tracing::info!("signing with {}", identity.mechanism());

    let transport = Arc::new(RelayPool::default());
    let session = ListSession::open(&core, Arc::new(identity), transport.clone()).await?;
    let result = execute(&session, command).await;
    transport.disconnect().await;
    result
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let pretty = cli.pretty;

    match run(cli).await {
        Ok(value) => print_json(&value, pretty),
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    }
}
