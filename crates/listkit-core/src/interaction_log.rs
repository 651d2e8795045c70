//! Short-lived record of the responses an action produced, looked up by
//! interaction id.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use listkit_models::{ActionRequest, InteractionResponse};

pub const DEFAULT_TTL: Duration = Duration::from_secs(900);
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct LoggedInteraction {
    pub request: ActionRequest,
    pub response: InteractionResponse,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

/// Concurrent, bounded map of recent interactions.
///
/// An entry is live while `timestamp + ttl > now`. Lookups prune first, so an
/// expired entry is never returned. Once `max_entries` is reached the oldest
/// entry makes room for the new one.
pub struct InteractionLog {
    entries: DashMap<String, LoggedInteraction>,
    ttl_ms: i64,
    max_entries: usize,
}

impl Default for InteractionLog {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl InteractionLog {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            max_entries: max_entries.max(1),
        }
    }

    pub fn record(&self, request: &ActionRequest, response: &InteractionResponse) {
        self.record_at(request, response, Utc::now());
    }

    pub fn record_at(
        &self,
        request: &ActionRequest,
        response: &InteractionResponse,
        now: DateTime<Utc>,
    ) {
        let id = request.interaction.id.clone();
        if !self.entries.contains_key(&id) {
            self.prune_at(now);
            while self.entries.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(
            id,
            LoggedInteraction {
                request: request.clone(),
                response: response.clone(),
                timestamp: now.timestamp_millis(),
            },
        );
    }

    pub fn get(&self, interaction_id: &str) -> Option<LoggedInteraction> {
        self.get_at(interaction_id, Utc::now())
    }

    pub fn get_at(&self, interaction_id: &str, now: DateTime<Utc>) -> Option<LoggedInteraction> {
        self.prune_at(now);
        self.entries.get(interaction_id).map(|e| e.value().clone())
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let now_ms = now.timestamp_millis();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.timestamp.saturating_add(self.ttl_ms) > now_ms);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "expired interactions pruned");
        }
        removed
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().timestamp)
            .map(|e| e.key().clone());
        match oldest {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
