pub mod allow_list;
pub mod health;
pub mod poll;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use listkit_models::InteractionResponse;

/// 204 when the action had nothing to say about the interaction.
pub(crate) fn reply(response: Option<InteractionResponse>) -> Response {
    match response {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
