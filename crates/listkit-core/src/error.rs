use listkit_models::{Interaction, InteractionResponse};
use listkit_services::ServiceError;
use thiserror::Error;

use crate::render::ephemeral_text;

pub const GENERIC_FAILURE: &str =
    "Something went wrong while handling your request. Please try again later.";

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("interaction {0} does not exist")]
    InteractionNotFound(String),
    #[error("interaction carries no invoking user")]
    MissingUser,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Turn a routing outcome into the reply sent back. Failures are logged with
/// the interaction id and answered with a generic ephemeral message, so a
/// recognised interaction is never left unanswered.
pub(crate) fn settle(
    interaction: &Interaction,
    outcome: Result<Option<InteractionResponse>, CoreError>,
) -> Option<InteractionResponse> {
    match outcome {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(
                interaction_id = %interaction.id,
                custom_id = interaction.custom_id().unwrap_or_default(),
                command = interaction.command_name().unwrap_or_default(),
                "interaction failed: {err}"
            );
            Some(ephemeral_text(GENERIC_FAILURE))
        }
    }
}
