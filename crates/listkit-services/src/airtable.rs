use std::sync::{Arc, RwLock};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, normalize_base_url, require_secret, send_empty, send_json};
use crate::spearmint::ProjectCredentials;
use crate::ServiceError;

const SERVICE: &str = "airtable";

/// Lifecycle of an allow list. Closed lists stay visible but accept no joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Open,
    Closed,
}

/// Column values of one allow-list row. Column names are the ones used in the
/// backing table; empty cells are omitted by the store, hence the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Proj ID", default)]
    pub project_id: String,
    #[serde(rename = "API key", default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListStatus>,
    #[serde(
        rename = "server name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_name: Option<String>,
    #[serde(
        rename = "creation date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<String>,
}

/// Partial update; only `Some` columns are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordPatch {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Proj ID", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "API key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListStatus>,
}

impl RecordPatch {
    pub fn status(status: ListStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn apply(&self, fields: &mut NewRecord) {
        if let Some(name) = &self.name {
            fields.name = name.clone();
        }
        if let Some(project_id) = &self.project_id {
            fields.project_id = project_id.clone();
        }
        if let Some(api_key) = &self.api_key {
            fields.api_key = api_key.clone();
        }
        if let Some(status) = self.status {
            fields.status = Some(status);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListRecord {
    pub id: String,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    pub fields: NewRecord,
}

impl AllowListRecord {
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn is_closed(&self) -> bool {
        self.fields.status == Some(ListStatus::Closed)
    }

    pub fn credentials(&self) -> ProjectCredentials {
        ProjectCredentials {
            project_id: self.fields.project_id.clone(),
            api_key: self.fields.api_key.clone(),
        }
    }
}

/// CRUD surface of the tabular record store.
#[allow(async_fn_in_trait)]
pub trait RecordStoreBackend: Send + Sync {
    async fn list_records(&self) -> Result<Vec<AllowListRecord>, ServiceError>;

    async fn get_record(&self, record_id: &str) -> Result<AllowListRecord, ServiceError>;

    async fn create_record(&self, fields: &NewRecord) -> Result<AllowListRecord, ServiceError>;

    async fn update_record(
        &self,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<AllowListRecord, ServiceError>;

    async fn delete_record(&self, record_id: &str) -> Result<(), ServiceError>;
}

/// Enum-dispatch wrapper so the router can hold a `Clone` handle without
/// boxing `async fn in trait` futures.
#[derive(Clone)]
pub enum RecordStore {
    Airtable(AirtableClient),
    Memory(MemoryRecordStore),
}

impl RecordStore {
    pub async fn list_records(&self) -> Result<Vec<AllowListRecord>, ServiceError> {
        match self {
            RecordStore::Airtable(s) => s.list_records().await,
            RecordStore::Memory(s) => s.list_records().await,
        }
    }

    pub async fn get_record(&self, record_id: &str) -> Result<AllowListRecord, ServiceError> {
        match self {
            RecordStore::Airtable(s) => s.get_record(record_id).await,
            RecordStore::Memory(s) => s.get_record(record_id).await,
        }
    }

    pub async fn create_record(&self, fields: &NewRecord) -> Result<AllowListRecord, ServiceError> {
        match self {
            RecordStore::Airtable(s) => s.create_record(fields).await,
            RecordStore::Memory(s) => s.create_record(fields).await,
        }
    }

    pub async fn update_record(
        &self,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<AllowListRecord, ServiceError> {
        match self {
            RecordStore::Airtable(s) => s.update_record(record_id, patch).await,
            RecordStore::Memory(s) => s.update_record(record_id, patch).await,
        }
    }

    pub async fn delete_record(&self, record_id: &str) -> Result<(), ServiceError> {
        match self {
            RecordStore::Airtable(s) => s.delete_record(record_id).await,
            RecordStore::Memory(s) => s.delete_record(record_id).await,
        }
    }
}

// ── HTTP backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub base_url: String,
    pub token: String,
    pub base_id: String,
    pub table: String,
}

#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    table_url: String,
    token: String,
}

/// One page of a table listing. `offset` is set while more pages remain.
#[derive(Debug, Deserialize)]
struct RecordList {
    records: Vec<AllowListRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Serialize)]
struct FieldsBody<'a, T: Serialize> {
    fields: &'a T,
}

impl AirtableClient {
    pub fn new(config: &AirtableConfig) -> Result<Self, ServiceError> {
        require_secret(SERVICE, "token", &config.token)?;
        require_secret(SERVICE, "base id", &config.base_id)?;
        require_secret(SERVICE, "table", &config.table)?;
        let base_url = normalize_base_url(SERVICE, &config.base_url)?;
        Ok(Self {
            http: build_client(SERVICE)?,
            table_url: format!("{}/v0/{}/{}", base_url, config.base_id, config.table),
            token: config.token.clone(),
        })
    }

    fn record_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.table_url, record_id)
    }
}

impl RecordStoreBackend for AirtableClient {
    async fn list_records(&self) -> Result<Vec<AllowListRecord>, ServiceError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut request = self.http.get(&self.table_url).bearer_auth(&self.token);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset)]);
            }
            let page: RecordList = send_json(SERVICE, request).await?;
            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        tracing::debug!(count = records.len(), "records retrieved");
        Ok(records)
    }

    async fn get_record(&self, record_id: &str) -> Result<AllowListRecord, ServiceError> {
        let request = self
            .http
            .get(self.record_url(record_id))
            .bearer_auth(&self.token);
        send_json(SERVICE, request).await
    }

    async fn create_record(&self, fields: &NewRecord) -> Result<AllowListRecord, ServiceError> {
        let request = self
            .http
            .post(&self.table_url)
            .bearer_auth(&self.token)
            .json(&FieldsBody { fields });
        let record: AllowListRecord = send_json(SERVICE, request).await?;
        tracing::info!(record_id = %record.id, name = %record.name(), "record created");
        Ok(record)
    }

    async fn update_record(
        &self,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<AllowListRecord, ServiceError> {
        let request = self
            .http
            .patch(self.record_url(record_id))
            .bearer_auth(&self.token)
            .json(&FieldsBody { fields: patch });
        let record: AllowListRecord = send_json(SERVICE, request).await?;
        tracing::info!(record_id, "record updated");
        Ok(record)
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), ServiceError> {
        let request = self
            .http
            .delete(self.record_url(record_id))
            .bearer_auth(&self.token);
        send_empty(SERVICE, request).await?;
        tracing::info!(record_id, "record deleted");
        Ok(())
    }
}

// ── In-memory backend ────────────────────────────────────────────────────────

/// Process-local table used for offline runs and tests. Records keep
/// insertion order, like the remote listing.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<Vec<AllowListRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<AllowListRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<AllowListRecord>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl RecordStoreBackend for MemoryRecordStore {
    async fn list_records(&self) -> Result<Vec<AllowListRecord>, ServiceError> {
        Ok(self.read().clone())
    }

    async fn get_record(&self, record_id: &str) -> Result<AllowListRecord, ServiceError> {
        self.read()
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("record {record_id}")))
    }

    async fn create_record(&self, fields: &NewRecord) -> Result<AllowListRecord, ServiceError> {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        let record = AllowListRecord {
            id: format!("rec{}", &simple[..14]),
            created_time: Some(chrono::Utc::now().to_rfc3339()),
            fields: fields.clone(),
        };
        self.write().push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        record_id: &str,
        patch: &RecordPatch,
    ) -> Result<AllowListRecord, ServiceError> {
        let mut records = self.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| ServiceError::NotFound(format!("record {record_id}")))?;
        patch.apply(&mut record.fields);
        Ok(record.clone())
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), ServiceError> {
        let mut records = self.write();
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(ServiceError::NotFound(format!("record {record_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop1() -> NewRecord {
        NewRecord {
            name: "Drop1".into(),
            project_id: "P1".into(),
            api_key: "K1".into(),
            status: Some(ListStatus::Open),
            server_name: Some("Mint Club".into()),
            creation_date: Some("2026-10-18T00:00:00Z".into()),
        }
    }

    #[test]
    fn fields_use_table_column_names() {
        let json = serde_json::to_value(drop1()).unwrap();
        assert_eq!(json["Name"], "Drop1");
        assert_eq!(json["Proj ID"], "P1");
        assert_eq!(json["API key"], "K1");
        assert_eq!(json["status"], "open");
        assert_eq!(json["server name"], "Mint Club");
        assert_eq!(json["creation date"], "2026-10-18T00:00:00Z");
    }

    #[test]
    fn sparse_rows_deserialize_with_defaults() {
        let record: AllowListRecord = serde_json::from_value(serde_json::json!({
            "id": "rec1",
            "createdTime": "2026-10-18T00:00:00.000Z",
            "fields": {"Name": "Drop1"}
        }))
        .unwrap();
        assert_eq!(record.name(), "Drop1");
        assert_eq!(record.fields.status, None);
        assert!(!record.is_closed());
        assert_eq!(record.credentials().project_id, "");
    }

    #[test]
    fn status_patch_serializes_only_status() {
        let json = serde_json::to_value(RecordPatch::status(ListStatus::Closed)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "closed"}));
    }

    #[tokio::test]
    async fn memory_store_round_trips_records() {
        let store = MemoryRecordStore::new();
        let created = store.create_record(&drop1()).await.unwrap();
        assert!(created.id.starts_with("rec"));

        let listed = store.list_records().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        let closed = store
            .update_record(&created.id, &RecordPatch::status(ListStatus::Closed))
            .await
            .unwrap();
        assert!(closed.is_closed());
        assert_eq!(closed.fields.project_id, "P1");

        store.delete_record(&created.id).await.unwrap();
        assert!(store.is_empty());
        let err = store.get_record(&created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_store_rejects_unknown_ids() {
        let store = MemoryRecordStore::new();
        assert!(store
            .update_record("recX", &RecordPatch::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete_record("recX").await.unwrap_err().is_not_found());
    }

    #[test]
    fn client_requires_credentials() {
        let config = AirtableConfig {
            base_url: "https://api.airtable.com".into(),
            token: String::new(),
            base_id: "app1".into(),
            table: "tbl1".into(),
        };
        assert!(matches!(
            AirtableClient::new(&config),
            Err(ServiceError::Config(_))
        ));
    }
}
