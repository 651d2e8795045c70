//! Clients for the three external services the actions orchestrate: the
//! tabular record store holding allow-list definitions, the allow-list entry
//! service, and the poll service.
//!
//! Each client is a `*Backend` trait with an HTTP implementation and an
//! in-memory one, wrapped in an enum so callers can hold a concrete,
//! cloneable handle.

pub mod airtable;
pub mod error;
mod http;
pub mod polls;
pub mod spearmint;

pub use airtable::{
    AirtableClient, AirtableConfig, AllowListRecord, ListStatus, MemoryRecordStore, NewRecord,
    RecordPatch, RecordStore, RecordStoreBackend,
};
pub use error::ServiceError;
pub use polls::{
    MemoryPollService, NewVote, Poll, PollBackend, PollOption, PollService, PollsClient,
    PollsConfig, Vote, VotePage,
};
pub use spearmint::{
    AllowListBackend, AllowListService, AttestationField, Entry, EntryStatus,
    MemoryAllowListService, ProjectCredentials, Proof, SpearmintClient, SpearmintConfig,
};
