//! `/list` command and the buttons and select menus it renders.
//!
//! Membership moves through join → leave → join; each transition is one write
//! to the allow-list service. The only local state is the record id embedded
//! in button custom ids.

use listkit_models::action::ActionMetadata;
use listkit_models::command::ParsedCommand;
use listkit_models::component::ButtonStyle;
use listkit_models::{ActionContext, ActionRequest, Interaction, InteractionResponse, InteractionType};
use listkit_services::{
    AllowListRecord, AllowListService, EntryStatus, ListStatus, NewRecord, RecordPatch,
    RecordStore,
};

use crate::custom_id::{CustomId, ListButton, ListSelect};
use crate::error::{settle, CoreError};
use crate::interaction_log::{InteractionLog, LoggedInteraction};
use crate::metadata::allow_list_metadata;
use crate::render::{
    button, channel_text, ephemeral_text, string_select, EmbedBuilder, MessageBuilder,
    COLOR_DANGER, COLOR_INFO, COLOR_SUCCESS,
};

const COMMAND: &str = "list";

pub const ADMIN_ONLY: &str = "This command is only accessible to administrators.";
pub const DUPLICATE_NAME: &str = "The name for the allow list already exists, please try again with another name or remove the current one.";
pub const MISSING_ARGUMENTS: &str = "Please provide a name, project ID and API key.";
pub const NO_LISTS: &str = "There are no allow lists yet. An administrator can add one with `/list initialize`.";
pub const NO_WALLET: &str = "Connect a wallet first, then try again.";
pub const LIST_GONE: &str = "This allow list no longer exists.";
pub const NAME_TOO_LONG: &str = "Allow list names can be at most 100 characters long.";
/// Names become select-option values, which Discord caps at 100 characters.
pub const MAX_NAME_CHARS: usize = 100;
/// Command arguments never written to the interaction log.
const SECRET_ARGS: &[&str] = &["apikey"];
pub const INSTRUCTIONS: &str = "1. Create an account on https://spearmint.xyz/\n\
2. Follow the instructions on https://docs.spearmint.xyz/docs/create-a-project to create your project\n\
3. Retrieve the project ID and API key under the Developers tab\n\
4. Use `/list initialize` with those values to bring the project into Discord";

pub struct AllowListAction {
    records: RecordStore,
    entries: AllowListService,
    log: InteractionLog,
    metadata: ActionMetadata,
}

impl AllowListAction {
    pub fn new(records: RecordStore, entries: AllowListService, log: InteractionLog) -> Self {
        Self {
            records,
            entries,
            log,
            metadata: allow_list_metadata(),
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

    /// Answer one interaction. `None` means the interaction is not ours and the
    /// caller should treat it as a no-op.
    pub async fn handle(&self, request: &ActionRequest) -> Option<InteractionResponse> {
        let interaction = &request.interaction;
        if interaction.interaction_type == InteractionType::Ping {
            return Some(InteractionResponse::pong());
        }
        if !self.metadata.accepts(interaction) {
            return None;
        }

        let outcome = self.route(interaction, &request.action_context).await;
        let response = settle(interaction, outcome)?;
        self.log.record(&request.redacted(SECRET_ARGS), &response);
        Some(response)
    }

    async fn route(
        &self,
        interaction: &Interaction,
        ctx: &ActionContext,
    ) -> Result<Option<InteractionResponse>, CoreError> {
        let Some(data) = interaction.data.as_ref() else {
            return Ok(None);
        };

        match interaction.interaction_type {
            InteractionType::ApplicationCommand => {
                let Some(command) = ParsedCommand::parse(data) else {
                    return Ok(None);
                };
                if command.name != COMMAND {
                    return Ok(None);
                }
                self.command(&command, ctx).await
            }
            InteractionType::MessageComponent => {
                let Some(custom_id) = interaction.custom_id().and_then(CustomId::parse) else {
                    return Ok(None);
                };
                match custom_id {
                    CustomId::ListSelect(select) => match data.values.first() {
                        Some(name) => self.select(select, name, interaction, ctx).await.map(Some),
                        None => Ok(None),
                    },
                    CustomId::ListButton { action, record_id } => self
                        .button(action, &record_id, interaction, ctx)
                        .await
                        .map(Some),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    async fn command(
        &self,
        command: &ParsedCommand,
        ctx: &ActionContext,
    ) -> Result<Option<InteractionResponse>, CoreError> {
        let response = match command.subcommand.as_deref() {
            Some("initialize") => self.initialize(command, ctx).await?,
            Some("status") => self.picker(ListSelect::Status).await?,
            Some("join") => self.picker(ListSelect::Join).await?,
            Some("close") => {
                if !ctx.is_community_admin {
                    return Ok(Some(ephemeral_text(ADMIN_ONLY)));
                }
                self.picker(ListSelect::Close).await?
            }
            Some("create") => ephemeral_text(INSTRUCTIONS),
            _ => return Ok(None),
        };
        Ok(Some(response))
    }

    async fn initialize(
        &self,
        command: &ParsedCommand,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        if !ctx.is_community_admin {
            return Ok(ephemeral_text(ADMIN_ONLY));
        }
        let arg = |name: &str| command.arg(name).map(str::trim).filter(|v| !v.is_empty());
        let (Some(name), Some(project_id), Some(api_key)) =
            (arg("name"), arg("projectid"), arg("apikey"))
        else {
            return Ok(ephemeral_text(MISSING_ARGUMENTS));
        };
        if name.chars().count() > MAX_NAME_CHARS {
            return Ok(ephemeral_text(NAME_TOO_LONG));
        }

        // Names are the lookup key for the select menus, so they must be unique.
        let existing = self.records.list_records().await?;
        if existing.iter().any(|r| r.name() == name) {
            return Ok(ephemeral_text(DUPLICATE_NAME));
        }

        let record = self
            .records
            .create_record(&NewRecord {
                name: name.to_string(),
                project_id: project_id.to_string(),
                api_key: api_key.to_string(),
                status: Some(ListStatus::Open),
                server_name: ctx.guild_name.clone(),
                creation_date: Some(chrono::Utc::now().to_rfc3339()),
            })
            .await?;
        tracing::info!(record_id = %record.id, name, "allow list initialized");

        let embed = EmbedBuilder::new()
            .title("Spearmint Allow List")
            .description(format!(
                "**{name}** is open. Press Join to enter the allow list."
            ))
            .color(COLOR_SUCCESS)
            .build();
        Ok(MessageBuilder::new()
            .embed(embed)
            .components(vec![button(
                "Join",
                CustomId::list_button(ListButton::Join, &record.id),
                ButtonStyle::Success,
            )])
            .build())
    }

    /// Select menu over every allow list, tagged with the action to apply.
    async fn picker(&self, select: ListSelect) -> Result<InteractionResponse, CoreError> {
        let records = self.records.list_records().await?;
        if records.is_empty() {
            return Ok(ephemeral_text(NO_LISTS));
        }
        let names = records.into_iter().map(|r| r.fields.name);
        Ok(MessageBuilder::new()
            .content("Please select an allow list:")
            .ephemeral()
            .components(vec![string_select(
                CustomId::ListSelect(select),
                "Select an allow list",
                names,
            )])
            .build())
    }

    async fn select(
        &self,
        select: ListSelect,
        name: &str,
        interaction: &Interaction,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        if select == ListSelect::Close && !ctx.is_community_admin {
            return Ok(ephemeral_text(ADMIN_ONLY));
        }
        let records = self.records.list_records().await?;
        let Some(record) = records.into_iter().find(|r| r.name() == name) else {
            return Ok(ephemeral_text(LIST_GONE));
        };

        match select {
            ListSelect::Status => self.status(&record, ctx).await,
            ListSelect::Join => self.join(&record, interaction, ctx).await,
            ListSelect::Close => self.close(&record).await,
        }
    }

    async fn button(
        &self,
        action: ListButton,
        record_id: &str,
        interaction: &Interaction,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        let record = match self.records.get_record(record_id).await {
            Ok(record) => record,
            Err(err) if err.is_not_found() => return Ok(ephemeral_text(LIST_GONE)),
            Err(err) => return Err(err.into()),
        };

        match action {
            ListButton::Join => self.join(&record, interaction, ctx).await,
            ListButton::Status => self.status(&record, ctx).await,
            ListButton::Leave => self.leave(&record, interaction, ctx).await,
        }
    }

    async fn join(
        &self,
        record: &AllowListRecord,
        interaction: &Interaction,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        if record.is_closed() {
            return Ok(ephemeral_text(format!(
                "The {} allow list is closed.",
                record.name()
            )));
        }
        let Some(address) = ctx.address() else {
            return Ok(ephemeral_text(NO_WALLET));
        };
        let user_id = interaction.user_id().ok_or(CoreError::MissingUser)?;

        self.entries
            .create_or_update_entry(
                &record.credentials(),
                address,
                user_id,
                EntryStatus::NotSelected,
            )
            .await?;

        let embed = EmbedBuilder::new()
            .title(record.name())
            .description(format!(
                "You have been entered into the {} allow list.",
                record.name()
            ))
            .color(COLOR_SUCCESS)
            .build();
        Ok(MessageBuilder::new()
            .ephemeral()
            .embed(embed)
            .components(vec![
                button(
                    "Status",
                    CustomId::list_button(ListButton::Status, &record.id),
                    ButtonStyle::Primary,
                ),
                button(
                    "Leave",
                    CustomId::list_button(ListButton::Leave, &record.id),
                    ButtonStyle::Danger,
                ),
            ])
            .build())
    }

    async fn status(
        &self,
        record: &AllowListRecord,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        let Some(address) = ctx.address() else {
            return Ok(ephemeral_text(NO_WALLET));
        };

        let status = match self
            .entries
            .get_entry_status(&record.credentials(), address)
            .await
        {
            Ok(status) => status,
            Err(err) if err.is_not_found() => {
                return Ok(ephemeral_text(format!(
                    "You have not joined the {} allow list.",
                    record.name()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let embed = EmbedBuilder::new()
            .title(format!("{} Allow List Status", record.name()))
            .description(status.as_str())
            .color(COLOR_INFO)
            .build();
        Ok(MessageBuilder::new()
            .ephemeral()
            .embed(embed)
            .components(vec![button(
                "Leave",
                CustomId::list_button(ListButton::Leave, &record.id),
                ButtonStyle::Danger,
            )])
            .build())
    }

    async fn leave(
        &self,
        record: &AllowListRecord,
        interaction: &Interaction,
        ctx: &ActionContext,
    ) -> Result<InteractionResponse, CoreError> {
        let Some(address) = ctx.address() else {
            return Ok(ephemeral_text(NO_WALLET));
        };
        let user_id = interaction.user_id().ok_or(CoreError::MissingUser)?;

        self.entries
            .create_or_update_entry(
                &record.credentials(),
                address,
                user_id,
                EntryStatus::Disqualified,
            )
            .await?;

        let embed = EmbedBuilder::new()
            .title(record.name())
            .description(format!("You have left the {} allow list.", record.name()))
            .color(COLOR_DANGER)
            .build();
        Ok(MessageBuilder::new()
            .ephemeral()
            .embed(embed)
            .components(vec![button(
                "Join",
                CustomId::list_button(ListButton::Join, &record.id),
                ButtonStyle::Success,
            )])
            .build())
    }

    async fn close(&self, record: &AllowListRecord) -> Result<InteractionResponse, CoreError> {
        self.records
            .update_record(&record.id, &RecordPatch::status(ListStatus::Closed))
            .await?;
        tracing::info!(record_id = %record.id, name = record.name(), "allow list closed");
        Ok(channel_text(format!(
            "The {} allow list is now closed.",
            record.name()
        )))
    }
}
