pub mod action;
pub mod command;
pub mod component;
pub mod embed;
pub mod interaction;
pub mod user;

pub use action::{ActionContext, ActionRequest};
pub use interaction::{Interaction, InteractionResponse, InteractionType};
