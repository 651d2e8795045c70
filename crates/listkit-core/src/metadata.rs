//! Metadata documents advertised to the action host: manifest, routing
//! patterns, slash-command schema and the context claims each action needs.

use listkit_models::action::{
    ActionMetadata, InteractionPattern, ManifestVersion, MiniAppManifest,
};
use listkit_models::command::{
    ApplicationCommandSpec, ApplicationCommandType, CommandMetadata, CommandOption,
};
use listkit_models::InteractionType;

const DEVELOPER: &str = "collab.land";
const WEBSITE: &str = "https://collab.land";
const VERSION: &str = "0.0.1";

pub const CONTEXT_IS_ADMIN: &str = "isCommunityAdmin";
pub const CONTEXT_ADDRESS: &str = "gmPassAddress";
pub const CONTEXT_GUILD_NAME: &str = "guildName";

fn manifest(app_id: &str, name: &str, description: &str) -> MiniAppManifest {
    MiniAppManifest {
        app_id: app_id.to_string(),
        developer: DEVELOPER.to_string(),
        name: name.to_string(),
        platforms: vec!["discord".to_string()],
        short_name: app_id.to_string(),
        version: ManifestVersion {
            name: VERSION.to_string(),
        },
        website: WEBSITE.to_string(),
        description: description.to_string(),
    }
}

/// Commands route on `<prefix>*`, components and modals on `<prefix>:*`.
fn patterns(prefix: &str) -> Vec<InteractionPattern> {
    let names = format!("{prefix}*");
    let ids = format!("{prefix}:*");
    vec![
        InteractionPattern::names(InteractionType::ApplicationCommand, &[names.as_str()]),
        InteractionPattern::names(InteractionType::ApplicationCommandAutocomplete, &[names.as_str()]),
        InteractionPattern::ids(InteractionType::MessageComponent, &[ids.as_str()]),
        InteractionPattern::ids(InteractionType::ModalSubmit, &[ids.as_str()]),
    ]
}

fn command_metadata(name: &str, short_name: &str, env: &str) -> CommandMetadata {
    CommandMetadata {
        name: name.to_string(),
        short_name: short_name.to_string(),
        supported_envs: vec![env.to_string(), "qa".to_string(), "staging".to_string()],
    }
}

pub fn allow_list_metadata() -> ActionMetadata {
    let list = ApplicationCommandSpec {
        metadata: command_metadata("AllowList", "allow-list", "list"),
        command_type: ApplicationCommandType::ChatInput,
        name: "list".to_string(),
        description: "Manage and join Spearmint allow lists".to_string(),
        options: vec![
            CommandOption::subcommand(
                "initialize",
                "Register a Spearmint project as a new allow list",
                vec![
                    CommandOption::required_string("name", "Unique name of the allow list"),
                    CommandOption::required_string("projectid", "Spearmint project ID"),
                    CommandOption::required_string("apikey", "Spearmint project API key"),
                ],
            ),
            CommandOption::subcommand("status", "Check your status on an allow list", vec![]),
            CommandOption::subcommand("close", "Close an allow list to new entries", vec![]),
            CommandOption::subcommand("join", "Join an allow list", vec![]),
            CommandOption::subcommand(
                "create",
                "How to create your allow list on the Spearmint website",
                vec![],
            ),
        ],
    };

    ActionMetadata {
        manifest: manifest(
            "allow-list",
            "AllowList",
            "Create, join and leave Spearmint allow lists from Discord",
        ),
        supported_interactions: patterns("list"),
        application_commands: vec![list],
        required_context: vec![
            CONTEXT_IS_ADMIN.to_string(),
            CONTEXT_ADDRESS.to_string(),
            CONTEXT_GUILD_NAME.to_string(),
        ],
    }
}

pub fn poll_metadata() -> ActionMetadata {
    let poll = ApplicationCommandSpec {
        metadata: command_metadata("PollAction", "poll-action", "poll"),
        command_type: ApplicationCommandType::ChatInput,
        name: "poll".to_string(),
        description: "Create a poll".to_string(),
        options: Vec::new(),
    };

    ActionMetadata {
        manifest: manifest(
            "poll-action",
            "PollAction",
            "Run button-driven polls in a Discord channel",
        ),
        supported_interactions: patterns("poll"),
        application_commands: vec![poll],
        required_context: Vec::new(),
    }
}
