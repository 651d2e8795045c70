//! HTTP backends exercised against an in-process stub of the three remote APIs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use listkit_services::{
    AirtableClient, AirtableConfig, AllowListBackend, EntryStatus, ListStatus, NewRecord,
    NewVote, PollBackend, PollsClient, PollsConfig, ProjectCredentials, RecordPatch,
    RecordStoreBackend, ServiceError, SpearmintClient, SpearmintConfig,
};

#[derive(Debug, Clone)]
struct Captured {
    method: &'static str,
    path: String,
    auth: Option<String>,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<Mutex<Vec<Captured>>>,
}

impl Stub {
    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.calls.lock().unwrap().push(Captured {
            method,
            path,
            auth: header("authorization"),
            api_key: header("api-key"),
            body,
        });
    }

    fn calls(&self) -> Vec<Captured> {
        self.calls.lock().unwrap().clone()
    }
}

/// Two pages: the first carries an `offset` token pointing at the second.
async fn list_records(
    State(stub): State<Stub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    match query.get("offset").map(String::as_str) {
        None => {
            stub.record("GET", "/v0/app1/Lists".into(), &headers, Value::Null);
            Json(json!({
                "records": [{
                    "id": "recAAA",
                    "createdTime": "2026-10-18T00:00:00.000Z",
                    "fields": {"Name": "Drop1", "Proj ID": "P1", "API key": "K1", "status": "open"}
                }],
                "offset": "itrPAGE2"
            }))
        }
        Some(offset) => {
            stub.record(
                "GET",
                format!("/v0/app1/Lists?offset={offset}"),
                &headers,
                Value::Null,
            );
            Json(json!({
                "records": [{
                    "id": "recBBB",
                    "createdTime": "2026-10-18T00:00:00.000Z",
                    "fields": {"Name": "Drop3", "Proj ID": "P3", "API key": "K3", "status": "closed"}
                }]
            }))
        }
    }
}

async fn create_record(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record("POST", "/v0/app1/Lists".into(), &headers, body.clone());
    Json(json!({"id": "recNEW", "createdTime": "2026-10-18T00:00:00.000Z", "fields": body["fields"]}))
}

async fn get_record(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    stub.record("GET", format!("/v0/app1/Lists/{id}"), &headers, Value::Null);
    if id == "recMISSING" {
        return Err((StatusCode::NOT_FOUND, "{\"error\":\"NOT_FOUND\"}"));
    }
    Ok(Json(json!({"id": id, "fields": {"Name": "Drop1"}})))
}

async fn patch_record(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record("PATCH", format!("/v0/app1/Lists/{id}"), &headers, body.clone());
    Json(json!({"id": id, "fields": {"Name": "Drop1", "status": body["fields"]["status"]}}))
}

async fn put_schema(
    State(stub): State<Stub>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record(
        "PUT",
        format!("/projects/{project}/attestationSchema"),
        &headers,
        body.clone(),
    );
    Json(json!({"data": body}))
}

async fn put_entry(
    State(stub): State<Stub>,
    Path((project, address)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record(
        "PUT",
        format!("/projects/{project}/entries/{address}"),
        &headers,
        body.clone(),
    );
    Json(json!({"data": {
        "address": address,
        "status": "submitted",
        "tentativeStatus": body["tentativeStatus"],
        "attestationData": body["attestationData"]
    }}))
}

async fn entry_status(
    State(stub): State<Stub>,
    Path((project, address)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.record(
        "GET",
        format!("/projects/{project}/entries/{address}/status"),
        &headers,
        Value::Null,
    );
    if address == "0xnobody" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({"data": {"status": "waitlisted"}})))
}

async fn create_poll(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record("POST", "/v1/create/poll".into(), &headers, body.clone());
    let options: Vec<Value> = body["options"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, o)| json!({"id": format!("opt{i}"), "text": o["text"], "votes_count": 0, "poll_id": "poll1"}))
        .collect();
    Json(json!({
        "status": "success",
        "statusCode": 200,
        "data": {"id": "poll1", "question": body["question"], "options": options, "entity": "Poll"}
    }))
}

async fn list_votes(
    State(stub): State<Stub>,
    Path(poll): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    stub.record(
        "GET",
        format!(
            "/v1/get/votes/{poll}?offset={}&limit={}",
            query.get("offset").map(String::as_str).unwrap_or("-"),
            query.get("limit").map(String::as_str).unwrap_or("-")
        ),
        &headers,
        Value::Null,
    );
    Json(json!({
        "status": "success",
        "statusCode": 200,
        "data": {
            "docs": [{"id": "vote1", "poll_id": poll, "option_id": "opt0", "identifier": "900"}],
            "totalDocs": 1, "offset": 0, "limit": 1000, "totalPages": 1, "page": 1,
            "pagingCounter": 1, "hasPrevPage": false, "hasNextPage": false,
            "prevPage": null, "nextPage": null
        }
    }))
}

async fn create_vote(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record("POST", "/v1/create/vote".into(), &headers, body.clone());
    Json(json!({"status": "success", "statusCode": 200, "data": {
        "id": "vote2", "poll_id": body["poll_id"], "option_id": body["option_id"],
        "identifier": body["identifier"], "entity": "Vote"
    }}))
}

async fn remove_vote(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.record("POST", "/v1/remove/vote".into(), &headers, body);
    Json(json!({"status": "success", "statusCode": 200, "data": null}))
}

async fn spawn_stub() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/v0/app1/Lists", get(list_records).post(create_record))
        .route("/v0/app1/Lists/{id}", get(get_record).patch(patch_record))
        .route("/projects/{project}/attestationSchema", put(put_schema))
        .route("/projects/{project}/entries/{address}", put(put_entry))
        .route(
            "/projects/{project}/entries/{address}/status",
            get(entry_status),
        )
        .route("/v1/create/poll", post(create_poll))
        .route("/v1/get/votes/{poll}", get(list_votes))
        .route("/v1/create/vote", post(create_vote))
        .route("/v1/remove/vote", post(remove_vote))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), stub)
}

fn airtable(base_url: &str) -> AirtableClient {
    AirtableClient::new(&AirtableConfig {
        base_url: base_url.to_string(),
        token: "tok-airtable".into(),
        base_id: "app1".into(),
        table: "Lists".into(),
    })
    .unwrap()
}

#[tokio::test]
async fn airtable_client_speaks_rest_v0() {
    let (base_url, stub) = spawn_stub().await;
    let client = airtable(&base_url);

    let records = client.list_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name(), "Drop1");
    assert_eq!(records[0].fields.status, Some(ListStatus::Open));
    assert_eq!(records[1].name(), "Drop3");
    assert!(records[1].is_closed());

    let created = client
        .create_record(&NewRecord {
            name: "Drop2".into(),
            project_id: "P2".into(),
            api_key: "K2".into(),
            status: Some(ListStatus::Open),
            server_name: Some("Mint Club".into()),
            creation_date: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "recNEW");
    assert_eq!(created.fields.project_id, "P2");

    let closed = client
        .update_record("recAAA", &RecordPatch::status(ListStatus::Closed))
        .await
        .unwrap();
    assert!(closed.is_closed());

    let calls = stub.calls();
    assert!(calls
        .iter()
        .all(|c| c.auth.as_deref() == Some("Bearer tok-airtable")));
    assert_eq!(calls[0].path, "/v0/app1/Lists");
    assert_eq!(calls[1].path, "/v0/app1/Lists?offset=itrPAGE2");
    assert_eq!(calls[2].method, "POST");
    assert_eq!(calls[2].body["fields"]["Name"], "Drop2");
    assert_eq!(calls[2].body["fields"]["server name"], "Mint Club");
    assert_eq!(calls[3].method, "PATCH");
    assert_eq!(calls[3].body, json!({"fields": {"status": "closed"}}));
}

#[tokio::test]
async fn airtable_404_is_a_not_found_status() {
    let (base_url, _stub) = spawn_stub().await;
    let err = airtable(&base_url)
        .get_record("recMISSING")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        ServiceError::Status { status, body, .. } => {
            assert_eq!(status, 404);
            assert!(body.contains("NOT_FOUND"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn spearmint_upsert_installs_schema_then_writes_entry() {
    let (base_url, stub) = spawn_stub().await;
    let client = SpearmintClient::new(&SpearmintConfig {
        base_url,
        api_key: "svc-key".into(),
    })
    .unwrap();
    let project = ProjectCredentials {
        project_id: "P1".into(),
        api_key: "K1".into(),
    };

    let entry = client
        .create_or_update_entry(&project, "0xabc", "900", EntryStatus::NotSelected)
        .await
        .unwrap();
    assert_eq!(entry.tentative_status, Some(EntryStatus::NotSelected));

    let status = client.get_entry_status(&project, "0xabc").await.unwrap();
    assert_eq!(status, EntryStatus::Waitlisted);

    let calls = stub.calls();
    assert_eq!(calls[0].path, "/projects/P1/attestationSchema");
    assert_eq!(calls[0].body[0]["name"], "userId");
    assert_eq!(calls[0].body[1]["type"], "uint256");
    assert_eq!(calls[1].path, "/projects/P1/entries/0xabc");
    assert_eq!(calls[1].body["tentativeStatus"], "not_selected");
    assert_eq!(calls[1].body["shouldFinalize"], false);
    assert_eq!(calls[1].body["attestationData"]["userId"], "900");
    for call in &calls {
        assert_eq!(call.api_key.as_deref(), Some("svc-key"));
        assert_eq!(call.auth.as_deref(), Some("Bearer K1"));
    }
}

#[tokio::test]
async fn spearmint_missing_entry_is_not_found() {
    let (base_url, _stub) = spawn_stub().await;
    let client = SpearmintClient::new(&SpearmintConfig {
        base_url,
        api_key: "svc-key".into(),
    })
    .unwrap();
    let project = ProjectCredentials {
        project_id: "P1".into(),
        api_key: "K1".into(),
    };
    let err = client
        .get_entry_status(&project, "0xnobody")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn polls_client_round_trip_through_vote_replacement() {
    let (base_url, stub) = spawn_stub().await;
    let client = PollsClient::new(&PollsConfig {
        base_url,
        api_key: "poll-key".into(),
    })
    .unwrap();

    let poll = client
        .create_poll("Colour?", &["Red".to_string(), "Blue".to_string()])
        .await
        .unwrap();
    assert_eq!(poll.id, "poll1");
    assert_eq!(poll.options.len(), 2);
    assert_eq!(poll.options[1].text, "Blue");

    let page = client.list_votes("poll1", 0, 1000).await.unwrap();
    let prior = page.vote_by("900").unwrap();
    client.remove_vote(&prior.id).await.unwrap();
    let vote = client
        .create_vote(&NewVote {
            poll_id: "poll1".into(),
            option_id: "opt1".into(),
            identifier: "900".into(),
        })
        .await
        .unwrap();
    assert_eq!(vote.id, "vote2");

    let calls = stub.calls();
    assert_eq!(
        calls[0].body,
        json!({"question": "Colour?", "options": [{"text": "Red"}, {"text": "Blue"}]})
    );
    assert_eq!(calls[1].path, "/v1/get/votes/poll1?offset=0&limit=1000");
    assert_eq!(calls[2].body, json!({"vote_id": "vote1"}));
    assert_eq!(calls[3].body["identifier"], "900");
    assert!(calls
        .iter()
        .all(|c| c.api_key.as_deref() == Some("poll-key") && c.auth.is_none()));
}

#[test]
fn clients_refuse_blank_credentials() {
    let err = PollsClient::new(&PollsConfig {
        base_url: "https://api.pollsapi.com".into(),
        api_key: "".into(),
    })
    .err()
    .unwrap();
    assert!(matches!(err, ServiceError::Config(_)));

    let err = AirtableClient::new(&AirtableConfig {
        base_url: "https://api.airtable.com".into(),
        token: "tok".into(),
        base_id: " ".into(),
        table: "Lists".into(),
    })
    .err()
    .unwrap();
    assert!(matches!(err, ServiceError::Config(_)));
}
