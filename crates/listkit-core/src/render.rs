//! Builders for the reply payloads: messages, embeds, buttons, selects and
//! modals. Nothing here touches a service.

use listkit_models::component::{
    ButtonStyle, Component, ComponentType, SelectOption, TextInputStyle, MAX_ROWS,
    MAX_ROW_COMPONENTS, MAX_SELECT_OPTIONS,
};
use listkit_models::embed::{Embed, EmbedField, EmbedFooter, EmbedImage};
use listkit_models::interaction::{
    InteractionCallbackData, InteractionCallbackType, MESSAGE_FLAG_EPHEMERAL,
};
use listkit_models::InteractionResponse;

pub const COLOR_SUCCESS: u32 = 0x57F287;
pub const COLOR_INFO: u32 = 0x5865F2;
pub const COLOR_DANGER: u32 = 0xED4245;

const MAX_BUTTON_LABEL: usize = 80;
const MAX_OPTION_LABEL: usize = 100;

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

pub fn button(label: &str, custom_id: impl ToString, style: ButtonStyle) -> Component {
    let mut component = Component::empty(ComponentType::Button);
    component.label = Some(clip(label, MAX_BUTTON_LABEL));
    component.custom_id = Some(custom_id.to_string());
    component.style = Some(style as u8);
    component
}

/// Single-choice string select whose option labels double as values.
/// Options past Discord's limit of 25 are dropped with a warning.
pub fn string_select<I, S>(custom_id: impl ToString, placeholder: &str, options: I) -> Component
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut component = Component::empty(ComponentType::StringSelect);
    component.custom_id = Some(custom_id.to_string());
    component.placeholder = Some(placeholder.to_string());
    let mut options: Vec<String> = options.into_iter().map(Into::into).collect();
    if options.len() > MAX_SELECT_OPTIONS {
        tracing::warn!(
            total = options.len(),
            kept = MAX_SELECT_OPTIONS,
            "select menu truncated"
        );
        options.truncate(MAX_SELECT_OPTIONS);
    }
    component.options = options
        .into_iter()
        .map(|value| SelectOption {
            label: clip(&value, MAX_OPTION_LABEL),
            value,
            description: None,
            default: false,
        })
        .collect();
    component.min_values = Some(1);
    component.max_values = Some(1);
    component
}

pub fn text_input(
    custom_id: &str,
    label: &str,
    style: TextInputStyle,
    placeholder: Option<&str>,
) -> Component {
    let mut component = Component::empty(ComponentType::TextInput);
    component.custom_id = Some(custom_id.to_string());
    component.label = Some(label.to_string());
    component.style = Some(style as u8);
    component.placeholder = placeholder.map(str::to_string);
    component.required = Some(true);
    component
}

fn action_row(components: Vec<Component>) -> Component {
    let mut row = Component::empty(ComponentType::ActionRow);
    row.components = components;
    row
}

/// Pack components into action rows of at most five, keeping at most five rows.
pub fn action_rows(components: Vec<Component>) -> Vec<Component> {
    components
        .chunks(MAX_ROW_COMPONENTS)
        .take(MAX_ROWS)
        .map(|chunk| action_row(chunk.to_vec()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct EmbedBuilder {
    embed: Embed,
}

impl EmbedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.embed.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.embed.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.embed.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.embed.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.embed.image = Some(EmbedImage { url: url.into() });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.embed.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn build(self) -> Embed {
        self.embed
    }
}

/// A `ChannelMessageWithSource` reply.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    content: Option<String>,
    ephemeral: bool,
    embeds: Vec<Embed>,
    rows: Vec<Component>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Append the components as one or more rows, respecting the row limits.
    pub fn components(mut self, components: Vec<Component>) -> Self {
        let room = MAX_ROWS.saturating_sub(self.rows.len());
        self.rows
            .extend(action_rows(components).into_iter().take(room));
        self
    }

    pub fn build(self) -> InteractionResponse {
        InteractionResponse {
            response_type: InteractionCallbackType::ChannelMessageWithSource,
            data: Some(InteractionCallbackData {
                content: self.content,
                embeds: self.embeds,
                components: self.rows,
                flags: self.ephemeral.then_some(MESSAGE_FLAG_EPHEMERAL),
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModalBuilder {
    custom_id: String,
    title: String,
    inputs: Vec<Component>,
}

impl ModalBuilder {
    pub fn new(custom_id: impl ToString, title: &str) -> Self {
        Self {
            custom_id: custom_id.to_string(),
            title: title.to_string(),
            inputs: Vec::new(),
        }
    }

    /// Each input gets its own row; inputs beyond the fifth are ignored.
    pub fn input(mut self, input: Component) -> Self {
        if self.inputs.len() < MAX_ROWS {
            self.inputs.push(input);
        }
        self
    }

    pub fn build(self) -> InteractionResponse {
        InteractionResponse {
            response_type: InteractionCallbackType::Modal,
            data: Some(InteractionCallbackData {
                title: Some(self.title),
                custom_id: Some(self.custom_id),
                components: self
                    .inputs
                    .into_iter()
                    .map(|input| action_row(vec![input]))
                    .collect(),
                ..Default::default()
            }),
        }
    }
}

pub fn ephemeral_text(text: impl Into<String>) -> InteractionResponse {
    MessageBuilder::new().content(text).ephemeral().build()
}

pub fn channel_text(text: impl Into<String>) -> InteractionResponse {
    MessageBuilder::new().content(text).build()
}
