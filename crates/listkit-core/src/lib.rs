pub mod allow_list;
pub mod custom_id;
pub mod error;
pub mod interaction_log;
pub mod metadata;
pub mod poll;
pub mod render;

use std::sync::Arc;
use std::time::Duration;

use listkit_services::{
    AllowListService, MemoryAllowListService, MemoryPollService, MemoryRecordStore, PollService,
    RecordStore,
};

use allow_list::AllowListAction;
use interaction_log::InteractionLog;
use poll::PollAction;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// How long a handled interaction stays retrievable by id.
    pub interaction_ttl: Duration,
    /// Upper bound on logged interactions per action.
    pub interaction_log_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interaction_ttl: interaction_log::DEFAULT_TTL,
            interaction_log_capacity: interaction_log::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Handles to the three external services.
#[derive(Clone)]
pub struct Services {
    pub records: RecordStore,
    pub entries: AllowListService,
    pub polls: PollService,
}

impl Services {
    pub fn in_memory() -> Self {
        Self {
            records: RecordStore::Memory(MemoryRecordStore::new()),
            entries: AllowListService::Memory(MemoryAllowListService::new()),
            polls: PollService::Memory(MemoryPollService::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub allow_list: Arc<AllowListAction>,
    pub poll: Arc<PollAction>,
    pub config: AppConfig,
}

impl AppState {
    /// Each action gets its own interaction log; they share nothing else.
    pub fn new(config: AppConfig, services: Services) -> Self {
        let log = || InteractionLog::new(config.interaction_ttl, config.interaction_log_capacity);
        Self {
            allow_list: Arc::new(AllowListAction::new(
                services.records,
                services.entries,
                log(),
            )),
            poll: Arc::new(PollAction::new(services.polls, log())),
            config,
        }
    }

    /// Drop every logged interaction. Called on shutdown.
    pub fn clear_logs(&self) {
        self.allow_list.log().clear();
        self.poll.log().clear();
    }
}
