use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, normalize_base_url, require_secret, send_empty, send_json};
use crate::ServiceError;

const SERVICE: &str = "pollsapi";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes_count: u64,
    #[serde(default)]
    pub poll_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub poll_id: String,
    pub option_id: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
    pub poll_id: String,
    pub option_id: String,
    pub identifier: String,
}

/// One page of votes as returned by the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePage {
    #[serde(default)]
    pub docs: Vec<Vote>,
    #[serde(default)]
    pub total_docs: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub has_next_page: bool,
}

impl VotePage {
    pub fn vote_by(&self, identifier: &str) -> Option<&Vote> {
        self.docs.iter().find(|v| v.identifier == identifier)
    }
}

/// `{status, statusCode, data}` wrapper; only `data` is read.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct NewPollBody<'a> {
    question: &'a str,
    options: Vec<NewOptionBody<'a>>,
}

#[derive(Serialize)]
struct NewOptionBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RemoveVoteBody<'a> {
    vote_id: &'a str,
}

#[allow(async_fn_in_trait)]
pub trait PollBackend: Send + Sync {
    async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, ServiceError>;
    async fn get_poll(&self, poll_id: &str) -> Result<Poll, ServiceError>;
    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, ServiceError>;
    async fn list_votes(
        &self,
        poll_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<VotePage, ServiceError>;
    async fn remove_vote(&self, vote_id: &str) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub enum PollService {
    Http(PollsClient),
    Memory(MemoryPollService),
}

impl PollService {
    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, ServiceError> {
        match self {
            PollService::Http(s) => s.create_poll(question, options).await,
            PollService::Memory(s) => s.create_poll(question, options).await,
        }
    }

    pub async fn get_poll(&self, poll_id: &str) -> Result<Poll, ServiceError> {
        match self {
            PollService::Http(s) => s.get_poll(poll_id).await,
            PollService::Memory(s) => s.get_poll(poll_id).await,
        }
    }

    pub async fn create_vote(&self, vote: &NewVote) -> Result<Vote, ServiceError> {
        match self {
            PollService::Http(s) => s.create_vote(vote).await,
            PollService::Memory(s) => s.create_vote(vote).await,
        }
    }

    pub async fn list_votes(
        &self,
        poll_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<VotePage, ServiceError> {
        match self {
            PollService::Http(s) => s.list_votes(poll_id, offset, limit).await,
            PollService::Memory(s) => s.list_votes(poll_id, offset, limit).await,
        }
    }

    pub async fn remove_vote(&self, vote_id: &str) -> Result<(), ServiceError> {
        match self {
            PollService::Http(s) => s.remove_vote(vote_id).await,
            PollService::Memory(s) => s.remove_vote(vote_id).await,
        }
    }
}

// ── HTTP backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PollsConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct PollsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PollsClient {
    pub fn new(config: &PollsConfig) -> Result<Self, ServiceError> {
        require_secret(SERVICE, "api key", &config.api_key)?;
        Ok(Self {
            http: build_client(SERVICE)?,
            base_url: normalize_base_url(SERVICE, &config.base_url)?,
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("api-key", &self.api_key)
    }
}

impl PollBackend for PollsClient {
    async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, ServiceError> {
        let body = NewPollBody {
            question,
            options: options.iter().map(|text| NewOptionBody { text }).collect(),
        };
        let request = self.authorized(self.http.post(self.url("create/poll")).json(&body));
        let envelope: Envelope<Poll> = send_json(SERVICE, request).await?;
        tracing::info!(poll_id = %envelope.data.id, options = options.len(), "poll created");
        Ok(envelope.data)
    }

    async fn get_poll(&self, poll_id: &str) -> Result<Poll, ServiceError> {
        let request = self.authorized(self.http.get(self.url(&format!("get/poll/{poll_id}"))));
        let envelope: Envelope<Poll> = send_json(SERVICE, request).await?;
        Ok(envelope.data)
    }

    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, ServiceError> {
        let request = self.authorized(self.http.post(self.url("create/vote")).json(vote));
        let envelope: Envelope<Vote> = send_json(SERVICE, request).await?;
        Ok(envelope.data)
    }

    async fn list_votes(
        &self,
        poll_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<VotePage, ServiceError> {
        let request = self.authorized(
            self.http
                .get(self.url(&format!("get/votes/{poll_id}")))
                .query(&[("offset", offset), ("limit", limit)]),
        );
        let envelope: Envelope<VotePage> = send_json(SERVICE, request).await?;
        Ok(envelope.data)
    }

    async fn remove_vote(&self, vote_id: &str) -> Result<(), ServiceError> {
        let request = self.authorized(
            self.http
                .post(self.url("remove/vote"))
                .json(&RemoveVoteBody { vote_id }),
        );
        send_empty(SERVICE, request).await
    }
}

// ── In-memory backend ────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryPolls {
    polls: HashMap<String, Poll>,
    /// Votes per poll in creation order.
    votes: HashMap<String, Vec<Vote>>,
}

/// Offline poll service that keeps `votes_count` in step with the stored votes.
#[derive(Clone, Default)]
pub struct MemoryPollService {
    inner: Arc<RwLock<MemoryPolls>>,
}

fn new_id(prefix: &str) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &raw[..12])
}

impl MemoryPollService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryPolls> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryPolls> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn vote_count(&self, poll_id: &str) -> usize {
        self.read().votes.get(poll_id).map_or(0, Vec::len)
    }
}

impl PollBackend for MemoryPollService {
    async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, ServiceError> {
        let poll_id = new_id("poll");
        let poll = Poll {
            id: poll_id.clone(),
            question: question.to_string(),
            options: options
                .iter()
                .map(|text| PollOption {
                    id: new_id("opt"),
                    text: text.clone(),
                    votes_count: 0,
                    poll_id: poll_id.clone(),
                })
                .collect(),
        };
        self.write().polls.insert(poll_id, poll.clone());
        Ok(poll)
    }

    async fn get_poll(&self, poll_id: &str) -> Result<Poll, ServiceError> {
        self.read()
            .polls
            .get(poll_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("poll {poll_id}")))
    }

    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, ServiceError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let poll = state
            .polls
            .get_mut(&vote.poll_id)
            .ok_or_else(|| ServiceError::NotFound(format!("poll {}", vote.poll_id)))?;
        let option = poll
            .options
            .iter_mut()
            .find(|o| o.id == vote.option_id)
            .ok_or_else(|| ServiceError::NotFound(format!("option {}", vote.option_id)))?;
        option.votes_count += 1;

        let created = Vote {
            id: new_id("vote"),
            poll_id: vote.poll_id.clone(),
            option_id: vote.option_id.clone(),
            identifier: vote.identifier.clone(),
        };
        state
            .votes
            .entry(vote.poll_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn list_votes(
        &self,
        poll_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<VotePage, ServiceError> {
        let state = self.read();
        if !state.polls.contains_key(poll_id) {
            return Err(ServiceError::NotFound(format!("poll {poll_id}")));
        }
        let all = state.votes.get(poll_id).map(Vec::as_slice).unwrap_or(&[]);
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(all.len());
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let docs: Vec<Vote> = all[start..].iter().take(take).cloned().collect();
        let has_next_page = start + docs.len() < all.len();
        Ok(VotePage {
            docs,
            total_docs: all.len() as u64,
            offset,
            limit,
            has_next_page,
        })
    }

    async fn remove_vote(&self, vote_id: &str) -> Result<(), ServiceError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let removed = state.votes.values_mut().find_map(|votes| {
            let index = votes.iter().position(|v| v.id == vote_id)?;
            Some(votes.remove(index))
        });
        let Some(vote) = removed else {
            return Err(ServiceError::NotFound(format!("vote {vote_id}")));
        };
        if let Some(option) = state
            .polls
            .get_mut(&vote.poll_id)
            .and_then(|p| p.options.iter_mut().find(|o| o.id == vote.option_id))
        {
            option.votes_count = option.votes_count.saturating_sub(1);
        }
        Ok(())
    }
}
