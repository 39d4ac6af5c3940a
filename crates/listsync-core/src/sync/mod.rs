mod codec;
pub mod engine;
pub mod managed;
pub mod merge;
pub mod poller;
pub mod types;

pub use engine::ListSyncEngine;
pub use managed::{FetchSummary, ItemSummary, ManagedList};
pub use merge::{merge_items, MergeOutcome};
pub use poller::{PollerConfig, SyncPoller};
pub use types::{
    EngineContext, FetchResult, MigrationOutcome, PublishOutcome, ReplaceOutcome, SyncOutcome,
};
