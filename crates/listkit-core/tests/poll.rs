use serde_json::{json, Value};

use listkit_core::interaction_log::InteractionLog;
use listkit_core::poll::{
    PollAction, BAD_OPTIONS, MISSING_QUESTION, POLL_GONE, UNKNOWN_OPTION, UNKNOWN_VOTER,
};
use listkit_models::interaction::{InteractionCallbackData, InteractionCallbackType};
use listkit_models::{ActionRequest, InteractionResponse};
use listkit_services::{MemoryPollService, PollBackend, PollService};

struct Harness {
    action: PollAction,
    polls: MemoryPollService,
}

fn harness() -> Harness {
    let polls = MemoryPollService::new();
    Harness {
        action: PollAction::new(PollService::Memory(polls.clone()), InteractionLog::default()),
        polls,
    }
}

fn request(value: Value) -> ActionRequest {
    serde_json::from_value(value).unwrap()
}

fn modal_submit(id: &str, description: &str, options: &str) -> ActionRequest {
    request(json!({
        "id": id,
        "type": 5,
        "member": {"user": {"id": "900", "username": "alice"}},
        "data": {
            "custom_id": "poll:modal:modal",
            "components": [
                {"type": 1, "components": [{"type": 4, "custom_id": "poll:text:description", "value": description}]},
                {"type": 1, "components": [{"type": 4, "custom_id": "poll:text:options", "value": options}]}
            ]
        }
    }))
}

fn click(id: &str, custom_id: &str, user: Option<&str>) -> ActionRequest {
    let mut value = json!({
        "id": id,
        "type": 3,
        "data": {"custom_id": custom_id, "component_type": 2}
    });
    if let Some(user) = user {
        value["member"] = json!({"user": {"id": user, "username": "voter"}});
    }
    request(value)
}

fn data(response: &InteractionResponse) -> &InteractionCallbackData {
    response.data.as_ref().unwrap()
}

fn content(response: &InteractionResponse) -> &str {
    data(response).content.as_deref().unwrap_or_default()
}

/// Create a poll through the modal and return its id and option ids.
async fn create_poll(h: &Harness, options: &str) -> (String, Vec<String>) {
    let response = h
        .action
        .handle(&modal_submit("create", "Lunch?", options))
        .await
        .unwrap();
    let embed = &data(&response).embeds[0];
    let poll_id = embed.fields[0].value.clone();
    let poll = h.polls.get_poll(&poll_id).await.unwrap();
    (poll_id, poll.options.into_iter().map(|o| o.id).collect())
}

#[tokio::test]
async fn poll_command_opens_the_modal() {
    let h = harness();
    let response = h
        .action
        .handle(&request(json!({"id": "1", "type": 2, "data": {"name": "poll"}})))
        .await
        .unwrap();
    assert_eq!(response.response_type, InteractionCallbackType::Modal);
    assert_eq!(data(&response).custom_id.as_deref(), Some("poll:modal:modal"));
    assert_eq!(data(&response).title.as_deref(), Some("Create a poll"));
    assert!(h.action.interaction("1").is_ok());
}

#[tokio::test]
async fn modal_submit_posts_poll_with_option_buttons() {
    let h = harness();
    let response = h
        .action
        .handle(&modal_submit("1", "Lunch?", "  Pizza\n\nSushi \nTacos\n"))
        .await
        .unwrap();
    assert!(!response.is_ephemeral());

    let payload = data(&response);
    let embed = &payload.embeds[0];
    assert_eq!(embed.title.as_deref(), Some("Lunch?"));
    assert_eq!(embed.fields[0].name, "pollID");
    assert_eq!(embed.description.as_deref(), Some("Pizza\n\nSushi \nTacos"));
    let poll_id = embed.fields[0].value.clone();

    assert_eq!(payload.components.len(), 2);
    let options = &payload.components[0].components;
    let labels: Vec<&str> = options
        .iter()
        .map(|b| b.label.as_deref().unwrap())
        .collect();
    assert_eq!(labels, ["Pizza", "Sushi", "Tacos"]);
    assert!(options
        .iter()
        .all(|b| b.style == Some(2)
            && b.custom_id.as_deref().unwrap().starts_with(&format!("poll:{poll_id}:"))));

    let results = &payload.components[1].components[0];
    assert_eq!(results.label.as_deref(), Some("View Results"));
    assert_eq!(results.style, Some(1));
    assert_eq!(
        results.custom_id.as_deref(),
        Some(format!("poll:{poll_id}:view-results").as_str())
    );
}

#[tokio::test]
async fn twenty_options_fill_four_rows_plus_results() {
    let h = harness();
    let options: Vec<String> = (1..=20).map(|i| format!("Option {i}")).collect();
    let response = h
        .action
        .handle(&modal_submit("1", "Pick", &options.join("\n")))
        .await
        .unwrap();
    let rows = &data(&response).components;
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4].components[0].label.as_deref(), Some("View Results"));
}

#[tokio::test]
async fn modal_input_is_validated() {
    let h = harness();
    let one = h
        .action
        .handle(&modal_submit("1", "Lunch?", "Pizza"))
        .await
        .unwrap();
    assert_eq!(content(&one), BAD_OPTIONS);

    let many: Vec<String> = (0..21).map(|i| i.to_string()).collect();
    let too_many = h
        .action
        .handle(&modal_submit("2", "Lunch?", &many.join("\n")))
        .await
        .unwrap();
    assert_eq!(content(&too_many), BAD_OPTIONS);

    let blank = h
        .action
        .handle(&modal_submit("3", "   ", "A\nB"))
        .await
        .unwrap();
    assert_eq!(content(&blank), MISSING_QUESTION);
}

#[tokio::test]
async fn revoting_replaces_the_previous_vote() {
    let h = harness();
    let (poll_id, option_ids) = create_poll(&h, "Red\nBlue").await;

    let first = h
        .action
        .handle(&click("2", &format!("poll:{poll_id}:{}", option_ids[0]), Some("900")))
        .await
        .unwrap();
    assert!(first.is_ephemeral());
    let embed = &data(&first).embeds[0];
    assert!(embed.description.as_deref().unwrap().starts_with("Vote ID: "));
    assert_eq!(embed.fields[0].value, "1");
    assert!(embed.fields.iter().all(|f| f.inline));

    let second = h
        .action
        .handle(&click("3", &format!("poll:{poll_id}:{}", option_ids[1]), Some("900")))
        .await
        .unwrap();
    let embed = &data(&second).embeds[0];
    assert_eq!(embed.fields[0].value, "0");
    assert_eq!(embed.fields[1].value, "1");
    assert_eq!(h.polls.vote_count(&poll_id), 1);

    h.action
        .handle(&click("4", &format!("poll:{poll_id}:{}", option_ids[1]), Some("901")))
        .await
        .unwrap();
    let poll = h.polls.get_poll(&poll_id).await.unwrap();
    assert_eq!(poll.options[1].votes_count, 2);
}

#[tokio::test]
async fn stale_option_keeps_the_existing_vote() {
    let h = harness();
    let (poll_id, option_ids) = create_poll(&h, "Red\nBlue").await;
    h.action
        .handle(&click("2", &format!("poll:{poll_id}:{}", option_ids[0]), Some("900")))
        .await
        .unwrap();

    let stale = h
        .action
        .handle(&click("3", &format!("poll:{poll_id}:opt_unknown"), Some("900")))
        .await
        .unwrap();
    assert!(stale.is_ephemeral());
    assert_eq!(content(&stale), UNKNOWN_OPTION);

    assert_eq!(h.polls.vote_count(&poll_id), 1);
    let poll = h.polls.get_poll(&poll_id).await.unwrap();
    assert_eq!(poll.options[0].votes_count, 1);
}

#[tokio::test]
async fn view_results_does_not_vote() {
    let h = harness();
    let (poll_id, _) = create_poll(&h, "Red\nBlue").await;

    let response = h
        .action
        .handle(&click("2", &format!("poll:{poll_id}:view-results"), Some("900")))
        .await
        .unwrap();
    let embed = &data(&response).embeds[0];
    assert_eq!(embed.title.as_deref(), Some("Lunch?"));
    assert!(embed.description.is_none());
    assert_eq!(embed.fields.len(), 2);
    assert_eq!(h.polls.vote_count(&poll_id), 0);
}

#[tokio::test]
async fn votes_need_a_user_and_a_live_poll() {
    let h = harness();
    let (poll_id, option_ids) = create_poll(&h, "Red\nBlue").await;

    let anonymous = h
        .action
        .handle(&click("2", &format!("poll:{poll_id}:{}", option_ids[0]), None))
        .await
        .unwrap();
    assert_eq!(content(&anonymous), UNKNOWN_VOTER);

    let gone = h
        .action
        .handle(&click("3", "poll:missing:opt", Some("900")))
        .await
        .unwrap();
    assert_eq!(content(&gone), POLL_GONE);

    let gone_results = h
        .action
        .handle(&click("4", "poll:missing:view-results", Some("900")))
        .await
        .unwrap();
    assert_eq!(content(&gone_results), POLL_GONE);
}

#[tokio::test]
async fn foreign_interactions_are_ignored() {
    let h = harness();
    for req in [
        click("1", "list:button:join:rec1", Some("900")),
        click("2", "poll:text:options", Some("900")),
        request(json!({"id": "3", "type": 2, "data": {"name": "polling"}})),
        request(json!({"id": "4", "type": 4, "data": {"name": "poll"}})),
        request(json!({"id": "5", "type": 5, "data": {"custom_id": "poll:other:thing"}})),
    ] {
        assert!(h.action.handle(&req).await.is_none());
    }
    assert!(h.action.log().is_empty());
}
