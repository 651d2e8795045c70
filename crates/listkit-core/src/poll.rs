//! `/poll`: a modal collects the question and options, the created poll is
//! posted with one button per option, and each click replaces the voter's
//! previous vote.

use listkit_models::action::ActionMetadata;
use listkit_models::component::{ButtonStyle, Component, TextInputStyle};
use listkit_models::{ActionRequest, Interaction, InteractionResponse, InteractionType};
use listkit_services::{NewVote, Poll, PollService, Vote};

use crate::custom_id::{CustomId, POLL_DESCRIPTION_INPUT, POLL_OPTIONS_INPUT};
use crate::error::{settle, CoreError};
use crate::interaction_log::{InteractionLog, LoggedInteraction};
use crate::metadata::poll_metadata;
use crate::render::{
    button, ephemeral_text, text_input, EmbedBuilder, MessageBuilder, ModalBuilder, COLOR_INFO,
};

const COMMAND: &str = "poll";

pub const MIN_OPTIONS: usize = 2;
/// Four rows of option buttons plus the results row.
pub const MAX_OPTIONS: usize = 20;
/// Page size used when looking for the voter's previous vote.
const VOTE_SCAN_LIMIT: u64 = 1000;

pub const MISSING_QUESTION: &str = "A poll needs a description.";
pub const BAD_OPTIONS: &str = "Provide between 2 and 20 options, one per line.";
pub const POLL_GONE: &str = "This poll no longer exists.";
pub const UNKNOWN_VOTER: &str = "Could not identify you, so the vote was not recorded.";
pub const UNKNOWN_OPTION: &str = "That option is not part of this poll.";

pub struct PollAction {
    polls: PollService,
    log: InteractionLog,
    metadata: ActionMetadata,
}

/// Non-empty, trimmed lines of the options field.
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl PollAction {
    pub fn new(polls: PollService, log: InteractionLog) -> Self {
        Self {
            polls,
            log,
            metadata: poll_metadata(),
        }
    }

    pub fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    pub fn interaction(&self, interaction_id: &str) -> Result<LoggedInteraction, CoreError> {
        self.log
            .get(interaction_id)
            .ok_or_else(|| CoreError::InteractionNotFound(interaction_id.to_string()))
    }

    pub async fn handle(&self, request: &ActionRequest) -> Option<InteractionResponse> {
        let interaction = &request.interaction;
        if interaction.interaction_type == InteractionType::Ping {
            return Some(InteractionResponse::pong());
        }
        if !self.metadata.accepts(interaction) {
            return None;
        }

        let outcome = self.route(interaction).await;
        let response = settle(interaction, outcome)?;
        self.log.record(request, &response);
        Some(response)
    }

    async fn route(
        &self,
        interaction: &Interaction,
    ) -> Result<Option<InteractionResponse>, CoreError> {
        let Some(data) = interaction.data.as_ref() else {
            return Ok(None);
        };

        match interaction.interaction_type {
            InteractionType::ApplicationCommand if interaction.command_name() == Some(COMMAND) => {
                Ok(Some(creation_modal()))
            }
            InteractionType::ModalSubmit => match interaction.custom_id().and_then(CustomId::parse) {
                Some(CustomId::PollModal) => self.create(&data.components).await.map(Some),
                _ => Ok(None),
            },
            InteractionType::MessageComponent => {
                match interaction.custom_id().and_then(CustomId::parse) {
                    Some(CustomId::PollVote { poll_id, option_id }) => {
                        self.vote(&poll_id, &option_id, interaction).await.map(Some)
                    }
                    Some(CustomId::PollResults { poll_id }) => {
                        self.results(&poll_id).await.map(Some)
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    async fn create(&self, inputs: &[Component]) -> Result<InteractionResponse, CoreError> {
        let question = Component::find_value(inputs, POLL_DESCRIPTION_INPUT)
            .map(str::trim)
            .unwrap_or_default();
        if question.is_empty() {
            return Ok(ephemeral_text(MISSING_QUESTION));
        }
        let raw_options = Component::find_value(inputs, POLL_OPTIONS_INPUT)
            .map(str::trim)
            .unwrap_or_default();
        let options = parse_options(raw_options);
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Ok(ephemeral_text(BAD_OPTIONS));
        }

        let poll = self.polls.create_poll(question, &options).await?;

        let embed = EmbedBuilder::new()
            .title(question)
            .field("pollID", poll.id.clone(), false)
            .description(raw_options)
            .build();
        let option_buttons = poll
            .options
            .iter()
            .map(|option| {
                button(
                    &option.text,
                    CustomId::PollVote {
                        poll_id: poll.id.clone(),
                        option_id: option.id.clone(),
                    },
                    ButtonStyle::Secondary,
                )
            })
            .collect();
        let results = button(
            "View Results",
            CustomId::PollResults {
                poll_id: poll.id.clone(),
            },
            ButtonStyle::Primary,
        );
        Ok(MessageBuilder::new()
            .embed(embed)
            .components(option_buttons)
            .components(vec![results])
            .build())
    }

    async fn vote(
        &self,
        poll_id: &str,
        option_id: &str,
        interaction: &Interaction,
    ) -> Result<InteractionResponse, CoreError> {
        let Some(voter) = interaction.user_id() else {
            return Ok(ephemeral_text(UNKNOWN_VOTER));
        };
        let poll = match self.polls.get_poll(poll_id).await {
            Ok(poll) => poll,
            Err(err) if err.is_not_found() => return Ok(ephemeral_text(POLL_GONE)),
            Err(err) => return Err(err.into()),
        };
        if !poll.options.iter().any(|option| option.id == option_id) {
            return Ok(ephemeral_text(UNKNOWN_OPTION));
        }
        match self.replace_vote(poll_id, option_id, voter).await {
            Ok((vote, poll)) => Ok(tally(&poll, Some(&vote))),
            Err(CoreError::Service(err)) if err.is_not_found() => Ok(ephemeral_text(POLL_GONE)),
            Err(err) => Err(err),
        }
    }

    /// Remove the voter's previous vote, if any, then cast the new one. The
    /// option must already be known to belong to the poll. Not atomic: two
    /// concurrent clicks by the same voter can both land.
    async fn replace_vote(
        &self,
        poll_id: &str,
        option_id: &str,
        voter: &str,
    ) -> Result<(Vote, Poll), CoreError> {
        let page = self.polls.list_votes(poll_id, 0, VOTE_SCAN_LIMIT).await?;
        if let Some(prior) = page.vote_by(voter) {
            self.polls.remove_vote(&prior.id).await?;
            tracing::debug!(poll_id, vote_id = %prior.id, "previous vote removed");
        }
        let vote = self
            .polls
            .create_vote(&NewVote {
                poll_id: poll_id.to_string(),
                option_id: option_id.to_string(),
                identifier: voter.to_string(),
            })
            .await?;
        let poll = self.polls.get_poll(poll_id).await?;
        Ok((vote, poll))
    }

    async fn results(&self, poll_id: &str) -> Result<InteractionResponse, CoreError> {
        match self.polls.get_poll(poll_id).await {
            Ok(poll) => Ok(tally(&poll, None)),
            Err(err) if err.is_not_found() => Ok(ephemeral_text(POLL_GONE)),
            Err(err) => Err(err.into()),
        }
    }
}

fn creation_modal() -> InteractionResponse {
    ModalBuilder::new(CustomId::PollModal, "Create a poll")
        .input(text_input(
            POLL_DESCRIPTION_INPUT,
            "Poll Description",
            TextInputStyle::Paragraph,
            Some("What should we have for lunch?"),
        ))
        .input(text_input(
            POLL_OPTIONS_INPUT,
            "Options for the poll",
            TextInputStyle::Paragraph,
            Some("One option per line"),
        ))
        .build()
}

/// Ephemeral vote counts, one inline field per option.
fn tally(poll: &Poll, vote: Option<&Vote>) -> InteractionResponse {
    let mut embed = EmbedBuilder::new().title(poll.question.as_str()).color(COLOR_INFO);
    for option in &poll.options {
        embed = embed.field(option.text.as_str(), option.votes_count.to_string(), true);
    }
    if let Some(vote) = vote {
        embed = embed.description(format!("Vote ID: {}", vote.id));
    }
    MessageBuilder::new().ephemeral().embed(embed.build()).build()
}
