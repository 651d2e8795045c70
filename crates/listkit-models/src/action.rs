//! Envelope types exchanged with the action host: the inbound request with its
//! verified context claims, and the metadata document describing an action.

use serde::{Deserialize, Serialize};

use crate::command::ApplicationCommandSpec;
use crate::interaction::{Interaction, InteractionType};

/// Claims the host has already verified about the invoking user. They are
/// trusted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    #[serde(default)]
    pub is_community_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_pass_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_name: Option<String>,
}

impl ActionContext {
    /// Wallet address, ignoring blank values.
    pub fn address(&self) -> Option<&str> {
        self.gm_pass_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(flatten)]
    pub interaction: Interaction,
    #[serde(rename = "actionContext", default)]
    pub action_context: ActionContext,
}

impl ActionRequest {
    /// Copy of the request with the named command options blanked out.
    pub fn redacted(&self, names: &[&str]) -> Self {
        let mut copy = self.clone();
        if let Some(data) = copy.interaction.data.as_mut() {
            data.redact_options(names);
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestVersion {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppManifest {
    pub app_id: String,
    pub developer: String,
    pub name: String,
    pub platforms: Vec<String>,
    pub short_name: String,
    pub version: ManifestVersion,
    pub website: String,
    pub description: String,
}

/// Routing pattern the host uses to forward interactions to an action.
/// Command interactions match on `names`, components and modals on `ids`.
/// A trailing `*` matches any suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionPattern {
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
}

impl InteractionPattern {
    pub fn names(interaction_type: InteractionType, names: &[&str]) -> Self {
        Self {
            interaction_type,
            names: Some(names.iter().map(|n| n.to_string()).collect()),
            ids: None,
        }
    }

    pub fn ids(interaction_type: InteractionType, ids: &[&str]) -> Self {
        Self {
            interaction_type,
            names: None,
            ids: Some(ids.iter().map(|n| n.to_string()).collect()),
        }
    }

    pub fn matches(&self, interaction: &Interaction) -> bool {
        if interaction.interaction_type != self.interaction_type {
            return false;
        }
        let (candidates, value) = match (&self.names, &self.ids) {
            (Some(names), _) => (names, interaction.command_name()),
            (None, Some(ids)) => (ids, interaction.custom_id()),
            (None, None) => return false,
        };
        let Some(value) = value else {
            return false;
        };
        candidates.iter().any(|p| glob_matches(p, value))
    }
}

fn glob_matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetadata {
    pub manifest: MiniAppManifest,
    pub supported_interactions: Vec<InteractionPattern>,
    pub application_commands: Vec<ApplicationCommandSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_context: Vec<String>,
}

impl ActionMetadata {
    pub fn accepts(&self, interaction: &Interaction) -> bool {
        self.supported_interactions
            .iter()
            .any(|p| p.matches(interaction))
    }
}
