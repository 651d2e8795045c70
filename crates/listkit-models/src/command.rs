use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::interaction::{InteractionData, ResolvedCommandOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ApplicationCommandType {
    #[default]
    ChatInput = 1,
    User = 2,
    Message = 3,
}

impl Serialize for ApplicationCommandType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ApplicationCommandType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        match value {
            1 => Ok(Self::ChatInput),
            2 => Ok(Self::User),
            3 => Ok(Self::Message),
            _ => Err(serde::de::Error::custom(format!(
                "unknown ApplicationCommandType: {value}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandOptionType {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
    Attachment = 11,
}

impl Serialize for CommandOptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for CommandOptionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        match value {
            1 => Ok(Self::SubCommand),
            2 => Ok(Self::SubCommandGroup),
            3 => Ok(Self::String),
            4 => Ok(Self::Integer),
            5 => Ok(Self::Boolean),
            6 => Ok(Self::User),
            7 => Ok(Self::Channel),
            8 => Ok(Self::Role),
            9 => Ok(Self::Mentionable),
            10 => Ok(Self::Number),
            11 => Ok(Self::Attachment),
            _ => Err(serde::de::Error::custom(format!(
                "unknown CommandOptionType: {value}"
            ))),
        }
    }
}

/// Option declaration inside an application command schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub option_type: CommandOptionType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    pub fn subcommand(name: &str, description: &str, options: Vec<CommandOption>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            option_type: CommandOptionType::SubCommand,
            required: false,
            options,
        }
    }

    pub fn required_string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            option_type: CommandOptionType::String,
            required: true,
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    pub name: String,
    pub short_name: String,
    pub supported_envs: Vec<String>,
}

/// Application command registered to a guild when the action is installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCommandSpec {
    pub metadata: CommandMetadata,
    #[serde(rename = "type", default)]
    pub command_type: ApplicationCommandType,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

/// A chat-input command flattened into its name, the invoked subcommand and
/// the stringified argument values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    pub name: String,
    pub subcommand: Option<String>,
    pub args: HashMap<String, String>,
}

impl ParsedCommand {
    pub fn parse(data: &InteractionData) -> Option<Self> {
        let name = data.name.clone()?;
        let mut parsed = ParsedCommand {
            name,
            ..Default::default()
        };
        parsed.collect(&data.options);
        Some(parsed)
    }

    fn collect(&mut self, options: &[ResolvedCommandOption]) {
        for option in options {
            match option.option_type {
                // Only the innermost subcommand is kept; groups just nest.
                CommandOptionType::SubCommand => {
                    self.subcommand = Some(option.name.clone());
                    self.collect(&option.options);
                }
                CommandOptionType::SubCommandGroup => self.collect(&option.options),
                _ => {
                    if let Some(value) = &option.value {
                        let text = match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        self.args.insert(option.name.clone(), text);
                    }
                }
            }
        }
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommand_and_string_args() {
        let data: InteractionData = serde_json::from_value(serde_json::json!({
            "name": "list",
            "type": 1,
            "options": [{
                "name": "initialize",
                "type": 1,
                "options": [
                    {"name": "name", "type": 3, "value": "Drop1"},
                    {"name": "projectid", "type": 3, "value": "P1"},
                    {"name": "apikey", "type": 3, "value": "K1"}
                ]
            }]
        }))
        .unwrap();

        let cmd = ParsedCommand::parse(&data).unwrap();
        assert_eq!(cmd.name, "list");
        assert_eq!(cmd.subcommand.as_deref(), Some("initialize"));
        assert_eq!(cmd.arg("name"), Some("Drop1"));
        assert_eq!(cmd.arg("projectid"), Some("P1"));
        assert_eq!(cmd.arg("apikey"), Some("K1"));
    }

    #[test]
    fn non_string_values_are_stringified() {
        let data: InteractionData = serde_json::from_value(serde_json::json!({
            "name": "poll",
            "options": [{"name": "limit", "type": 4, "value": 5}]
        }))
        .unwrap();
        let cmd = ParsedCommand::parse(&data).unwrap();
        assert_eq!(cmd.subcommand, None);
        assert_eq!(cmd.arg("limit"), Some("5"));
    }

    #[test]
    fn component_data_without_name_is_not_a_command() {
        let data: InteractionData = serde_json::from_value(serde_json::json!({
            "custom_id": "list:select:pjoin",
            "component_type": 3,
            "values": ["Drop1"]
        }))
        .unwrap();
        assert!(ParsedCommand::parse(&data).is_none());
    }
}
