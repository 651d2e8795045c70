use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use listkit_core::interaction_log::LoggedInteraction;
use listkit_core::AppState;
use listkit_models::action::ActionMetadata;
use listkit_models::ActionRequest;

use crate::error::ApiError;

pub async fn metadata(State(state): State<AppState>) -> Json<ActionMetadata> {
    Json(state.poll.metadata().clone())
}

pub async fn handle_interaction(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Response {
    tracing::debug!(interaction_id = %request.interaction.id, "poll interaction");
    super::reply(state.poll.handle(&request).await)
}

pub async fn get_interaction(
    State(state): State<AppState>,
    Path(interaction_id): Path<String>,
) -> Result<Json<LoggedInteraction>, ApiError> {
    Ok(Json(state.poll.interaction(&interaction_id)?))
}
