use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Discord caps every action row at five interactive components.
pub const MAX_ROW_COMPONENTS: usize = 5;
/// A message (or modal) carries at most five action rows.
pub const MAX_ROWS: usize = 5;
/// String selects accept at most 25 options.
pub const MAX_SELECT_OPTIONS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComponentType {
    ActionRow = 1,
    Button = 2,
    StringSelect = 3,
    TextInput = 4,
    UserSelect = 5,
    RoleSelect = 6,
    MentionableSelect = 7,
    ChannelSelect = 8,
}

impl Serialize for ComponentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown ComponentType: {value}"))
        })
    }
}

impl ComponentType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ActionRow),
            2 => Some(Self::Button),
            3 => Some(Self::StringSelect),
            4 => Some(Self::TextInput),
            5 => Some(Self::UserSelect),
            6 => Some(Self::RoleSelect),
            7 => Some(Self::MentionableSelect),
            8 => Some(Self::ChannelSelect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
    Link = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextInputStyle {
    Short = 1,
    Paragraph = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
}

/// A flat component struct that uses `component_type` to distinguish variants.
///
/// Using a flat struct avoids serde `tag` conflicts with the integer `type`
/// discriminator. Fields that don't apply to a given component type are simply
/// `None` / empty. The same shape is used for outbound buttons/selects/inputs
/// and for the inbound modal-submit payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Child components (only for ActionRow)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Button or text input style discriminator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// URL for link-style buttons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Options for string select menus
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_values: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_values: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Pre-filled value for text inputs, or the submitted value in a modal submit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Component {
    /// An empty component of the given type; builders fill in the rest.
    pub fn empty(component_type: ComponentType) -> Self {
        Self {
            component_type,
            components: Vec::new(),
            custom_id: None,
            style: None,
            label: None,
            url: None,
            disabled: false,
            options: Vec::new(),
            placeholder: None,
            min_values: None,
            max_values: None,
            min_length: None,
            max_length: None,
            required: None,
            value: None,
        }
    }

    /// Depth-first search for a text input with the given custom id, returning
    /// its submitted value.
    pub fn find_value<'a>(components: &'a [Component], custom_id: &str) -> Option<&'a str> {
        for component in components {
            if component.custom_id.as_deref() == Some(custom_id) {
                if let Some(value) = component.value.as_deref() {
                    return Some(value);
                }
            }
            if let Some(found) = Self::find_value(&component.components, custom_id) {
                return Some(found);
            }
        }
        None
    }
}
