use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{build_client, normalize_base_url, require_secret, send_json};
use crate::ServiceError;

const SERVICE: &str = "spearmint";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Submitted,
    Selected,
    Waitlisted,
    NotSelected,
    Disqualified,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Submitted => "submitted",
            EntryStatus::Selected => "selected",
            EntryStatus::Waitlisted => "waitlisted",
            EntryStatus::NotSelected => "not_selected",
            EntryStatus::Disqualified => "disqualified",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project id plus the project-scoped API key, both read from the allow-list
/// record that owns the project.
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectCredentials {
    pub project_id: String,
    pub api_key: String,
}

impl fmt::Debug for ProjectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectCredentials")
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub address: String,
    pub status: EntryStatus,
    #[serde(default)]
    pub tentative_status: Option<EntryStatus>,
    #[serde(default)]
    pub attestation_data: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub proof: Vec<String>,
    #[serde(default)]
    pub attestation_data: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub default_value: Value,
}

/// Schema attached to every project before entries are written: the Discord
/// user id and the write timestamp.
pub fn default_attestation_schema() -> Vec<AttestationField> {
    vec![
        AttestationField {
            name: "userId".into(),
            field_type: "string".into(),
            default_value: Value::String("user-id".into()),
        },
        AttestationField {
            name: "timestamp".into(),
            field_type: "uint256".into(),
            default_value: Value::String("0".into()),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: EntryStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryUpsert<'a> {
    tentative_status: EntryStatus,
    should_finalize: bool,
    attestation_data: EntryAttestation<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryAttestation<'a> {
    user_id: &'a str,
    timestamp: String,
}

/// Entry and attestation surface of the allow-list service.
#[allow(async_fn_in_trait)]
pub trait AllowListBackend: Send + Sync {
    async fn create_attestation_schema(
        &self,
        project: &ProjectCredentials,
    ) -> Result<Vec<AttestationField>, ServiceError>;

    /// Install the attestation schema, then write the caller's entry with the
    /// given tentative status.
    async fn create_or_update_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
        user_id: &str,
        status: EntryStatus,
    ) -> Result<Entry, ServiceError>;

    async fn get_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Entry, ServiceError>;

    async fn get_entry_status(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<EntryStatus, ServiceError>;

    async fn get_proof(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Proof, ServiceError>;
}

#[derive(Clone)]
pub enum AllowListService {
    Spearmint(SpearmintClient),
    Memory(MemoryAllowListService),
}

impl AllowListService {
    pub async fn create_attestation_schema(
        &self,
        project: &ProjectCredentials,
    ) -> Result<Vec<AttestationField>, ServiceError> {
        match self {
            AllowListService::Spearmint(s) => s.create_attestation_schema(project).await,
            AllowListService::Memory(s) => s.create_attestation_schema(project).await,
        }
    }

    pub async fn create_or_update_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
        user_id: &str,
        status: EntryStatus,
    ) -> Result<Entry, ServiceError> {
        match self {
            AllowListService::Spearmint(s) => {
                s.create_or_update_entry(project, address, user_id, status)
                    .await
            }
            AllowListService::Memory(s) => {
                s.create_or_update_entry(project, address, user_id, status)
                    .await
            }
        }
    }

    pub async fn get_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Entry, ServiceError> {
        match self {
            AllowListService::Spearmint(s) => s.get_entry(project, address).await,
            AllowListService::Memory(s) => s.get_entry(project, address).await,
        }
    }

    pub async fn get_entry_status(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<EntryStatus, ServiceError> {
        match self {
            AllowListService::Spearmint(s) => s.get_entry_status(project, address).await,
            AllowListService::Memory(s) => s.get_entry_status(project, address).await,
        }
    }

    pub async fn get_proof(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Proof, ServiceError> {
        match self {
            AllowListService::Spearmint(s) => s.get_proof(project, address).await,
            AllowListService::Memory(s) => s.get_proof(project, address).await,
        }
    }
}

// ── HTTP backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SpearmintConfig {
    pub base_url: String,
    /// Service-level key sent as `api-key` on every request.
    pub api_key: String,
}

#[derive(Clone)]
pub struct SpearmintClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl SpearmintClient {
    pub fn new(config: &SpearmintConfig) -> Result<Self, ServiceError> {
        require_secret(SERVICE, "api key", &config.api_key)?;
        Ok(Self {
            http: build_client(SERVICE)?,
            base_url: normalize_base_url(SERVICE, &config.base_url)?,
            service_key: config.api_key.clone(),
        })
    }

    fn project_url(&self, project: &ProjectCredentials, rest: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, project.project_id, rest)
    }

    fn authorized(&self, request: RequestBuilder, project: &ProjectCredentials) -> RequestBuilder {
        request
            .header("api-key", &self.service_key)
            .bearer_auth(&project.api_key)
            .header("accept", "application/json")
    }
}

impl AllowListBackend for SpearmintClient {
    async fn create_attestation_schema(
        &self,
        project: &ProjectCredentials,
    ) -> Result<Vec<AttestationField>, ServiceError> {
        let request = self.authorized(
            self.http
                .put(self.project_url(project, "attestationSchema"))
                .json(&default_attestation_schema()),
            project,
        );
        let body: DataEnvelope<Vec<AttestationField>> = send_json(SERVICE, request).await?;
        Ok(body.data)
    }

    async fn create_or_update_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
        user_id: &str,
        status: EntryStatus,
    ) -> Result<Entry, ServiceError> {
        self.create_attestation_schema(project).await?;

        let payload = EntryUpsert {
            tentative_status: status,
            should_finalize: false,
            attestation_data: EntryAttestation {
                user_id,
                timestamp: chrono::Utc::now().timestamp_millis().to_string(),
            },
        };
        let request = self.authorized(
            self.http
                .put(self.project_url(project, &format!("entries/{address}")))
                .json(&payload),
            project,
        );
        let body: DataEnvelope<Entry> = send_json(SERVICE, request).await?;
        tracing::info!(
            project_id = %project.project_id,
            address,
            status = %status,
            "entry written"
        );
        Ok(body.data)
    }

    async fn get_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Entry, ServiceError> {
        let request = self.authorized(
            self.http
                .get(self.project_url(project, &format!("entries/{address}"))),
            project,
        );
        let body: DataEnvelope<Entry> = send_json(SERVICE, request).await?;
        Ok(body.data)
    }

    async fn get_entry_status(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<EntryStatus, ServiceError> {
        let request = self.authorized(
            self.http
                .get(self.project_url(project, &format!("entries/{address}/status"))),
            project,
        );
        let body: DataEnvelope<StatusBody> = send_json(SERVICE, request).await?;
        Ok(body.data.status)
    }

    async fn get_proof(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Proof, ServiceError> {
        let request = self.authorized(
            self.http
                .get(self.project_url(project, &format!("proofs/{address}"))),
            project,
        );
        let body: DataEnvelope<Proof> = send_json(SERVICE, request).await?;
        Ok(body.data)
    }
}

// ── In-memory backend ────────────────────────────────────────────────────────

type EntryKey = (String, String);

#[derive(Default)]
struct MemoryEntries {
    schemas: HashSet<String>,
    entries: HashMap<EntryKey, Entry>,
}

/// Offline stand-in. Entries are not finalized remotely, so the written
/// tentative status doubles as the reported status.
#[derive(Clone, Default)]
pub struct MemoryAllowListService {
    inner: Arc<RwLock<MemoryEntries>>,
}

impl MemoryAllowListService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryEntries> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryEntries> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn has_schema(&self, project_id: &str) -> bool {
        self.read().schemas.contains(project_id)
    }

    fn lookup(&self, project: &ProjectCredentials, address: &str) -> Result<Entry, ServiceError> {
        self.read()
            .entries
            .get(&(project.project_id.clone(), address.to_string()))
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "entry {address} in project {}",
                    project.project_id
                ))
            })
    }
}

impl AllowListBackend for MemoryAllowListService {
    async fn create_attestation_schema(
        &self,
        project: &ProjectCredentials,
    ) -> Result<Vec<AttestationField>, ServiceError> {
        self.write().schemas.insert(project.project_id.clone());
        Ok(default_attestation_schema())
    }

    async fn create_or_update_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
        user_id: &str,
        status: EntryStatus,
    ) -> Result<Entry, ServiceError> {
        self.create_attestation_schema(project).await?;

        let attestation = HashMap::from([
            ("userId".to_string(), Value::String(user_id.to_string())),
            (
                "timestamp".to_string(),
                Value::String(chrono::Utc::now().timestamp_millis().to_string()),
            ),
        ]);
        let entry = Entry {
            address: address.to_string(),
            status,
            tentative_status: Some(status),
            attestation_data: Some(attestation),
        };
        self.write().entries.insert(
            (project.project_id.clone(), address.to_string()),
            entry.clone(),
        );
        Ok(entry)
    }

    async fn get_entry(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Entry, ServiceError> {
        self.lookup(project, address)
    }

    async fn get_entry_status(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<EntryStatus, ServiceError> {
        self.lookup(project, address).map(|e| e.status)
    }

    async fn get_proof(
        &self,
        project: &ProjectCredentials,
        address: &str,
    ) -> Result<Proof, ServiceError> {
        let entry = self.lookup(project, address)?;
        if entry.status != EntryStatus::Selected {
            return Err(ServiceError::NotFound(format!(
                "proof for {address} (entry is {})",
                entry.status
            )));
        }
        Ok(Proof {
            proof: Vec::new(),
            attestation_data: entry.attestation_data,
        })
    }
}
