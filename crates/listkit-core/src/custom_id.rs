//! Typed form of the custom ids carried by buttons, selects and modals.
//!
//! Rendering goes through `Display` and routing through [`CustomId::parse`], so
//! both sides share one definition of the string layout.

use std::fmt;

/// Text input ids inside the poll creation modal. They never route on their own.
pub const POLL_DESCRIPTION_INPUT: &str = "poll:text:description";
pub const POLL_OPTIONS_INPUT: &str = "poll:text:options";

const VIEW_RESULTS: &str = "view-results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListButton {
    Join,
    Status,
    Leave,
}

impl ListButton {
    fn as_str(self) -> &'static str {
        match self {
            ListButton::Join => "join",
            ListButton::Status => "status",
            ListButton::Leave => "leave",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "join" => Some(ListButton::Join),
            "status" => Some(ListButton::Status),
            "leave" => Some(ListButton::Leave),
            _ => None,
        }
    }
}

/// Select menus offered by the `list status|close|join` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSelect {
    Status,
    Close,
    Join,
}

impl ListSelect {
    fn as_str(self) -> &'static str {
        match self {
            ListSelect::Status => "pstatus",
            ListSelect::Close => "pclose",
            ListSelect::Join => "pjoin",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pstatus" => Some(ListSelect::Status),
            "pclose" => Some(ListSelect::Close),
            "pjoin" => Some(ListSelect::Join),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomId {
    /// `list:button:{join|status|leave}:<recordId>`
    ListButton { action: ListButton, record_id: String },
    /// `list:select:{pstatus|pclose|pjoin}`
    ListSelect(ListSelect),
    /// `poll:modal:modal`
    PollModal,
    /// `poll:<pollId>:view-results`
    PollResults { poll_id: String },
    /// `poll:<pollId>:<optionId>`
    PollVote { poll_id: String, option_id: String },
}

impl CustomId {
    pub fn list_button(action: ListButton, record_id: &str) -> Self {
        CustomId::ListButton {
            action,
            record_id: record_id.to_string(),
        }
    }

    /// Parse a raw custom id; anything outside the known layouts is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            ["list", "button", action, record_id] if !record_id.is_empty() => {
                Some(CustomId::ListButton {
                    action: ListButton::parse(action)?,
                    record_id: record_id.to_string(),
                })
            }
            ["list", "select", action] => ListSelect::parse(action).map(CustomId::ListSelect),
            ["poll", "modal", "modal"] => Some(CustomId::PollModal),
            ["poll", "modal" | "text", _] => None,
            ["poll", poll_id, target] if !poll_id.is_empty() && !target.is_empty() => {
                if *target == VIEW_RESULTS {
                    Some(CustomId::PollResults {
                        poll_id: poll_id.to_string(),
                    })
                } else {
                    Some(CustomId::PollVote {
                        poll_id: poll_id.to_string(),
                        option_id: target.to_string(),
                    })
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomId::ListButton { action, record_id } => {
                write!(f, "list:button:{}:{record_id}", action.as_str())
            }
            CustomId::ListSelect(select) => write!(f, "list:select:{}", select.as_str()),
            CustomId::PollModal => f.write_str("poll:modal:modal"),
            CustomId::PollResults { poll_id } => write!(f, "poll:{poll_id}:{VIEW_RESULTS}"),
            CustomId::PollVote { poll_id, option_id } => write!(f, "poll:{poll_id}:{option_id}"),
        }
    }
}
