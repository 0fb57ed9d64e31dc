//! Execution ledger backends
//!
//! All backends are append-only: a record is written once under its
//! execution id and never updated. Re-writing an identical record is
//! accepted as a no-op so a retried write cannot corrupt the ledger.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::http::{read_error, HttpEndpoint};
use super::{ExecutionLedger, LedgerError};
use crate::engine::result::ExecutionRecord;

/// Process-local ledger, used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<Vec<ExecutionRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record in write order
    pub async fn records(&self) -> Vec<ExecutionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ExecutionLedger for MemoryLedger {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records
            .iter()
            .find(|r| r.execution_id == record.execution_id)
        {
            return check_duplicate(existing, record);
        }
        records.push(record.clone());
        Ok(())
    }
}

fn check_duplicate(
    existing: &ExecutionRecord,
    incoming: &ExecutionRecord,
) -> Result<(), LedgerError> {
    if existing == incoming {
        debug!(execution_id = %incoming.execution_id, "Record already stored");
        Ok(())
    } else {
        Err(LedgerError::Conflict(incoming.execution_id.clone()))
    }
}

/// JSON Lines ledger: one record per line in `<dir>/<table>.jsonl`
///
/// The file is scanned once, on the first write, to build an id index;
/// later writes consult the index instead of re-reading the file. The
/// index assumes this instance is the only writer to the file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    index: Mutex<Option<HashMap<String, ExecutionRecord>>>,
}

impl FileLedger {
    pub fn new(dir: impl AsRef<Path>, table: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.jsonl", table)),
            index: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in the file, oldest first
    pub async fn read_records(&self) -> Result<Vec<ExecutionRecord>, LedgerError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(LedgerError::from))
            .collect()
    }

    async fn load_index(&self) -> Result<HashMap<String, ExecutionRecord>, LedgerError> {
        let records = self.read_records().await?;
        debug!(path = %self.path.display(), records = records.len(), "Ledger index loaded");
        Ok(records
            .into_iter()
            .map(|r| (r.execution_id.clone(), r))
            .collect())
    }
}

#[async_trait]
impl ExecutionLedger for FileLedger {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError> {
        let mut guard = self.index.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_index().await?);
        }
        let index = guard.get_or_insert_with(HashMap::new);

        if let Some(existing) = index.get(&record.execution_id) {
            return check_duplicate(existing, record);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        index.insert(record.execution_id.clone(), record.clone());
        debug!(
            execution_id = %record.execution_id,
            path = %self.path.display(),
            "Record appended"
        );
        Ok(())
    }
}

/// Remote ledger: `PUT /tables/{table}/records/{execution_id}`
///
/// Writes are conditional (`If-None-Match: *`) so an existing record is
/// never replaced. When the service reports one already exists, it is
/// fetched and compared: an identical record is a no-op, anything else
/// is a conflict.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    endpoint: HttpEndpoint,
    table: String,
}

impl HttpLedger {
    pub fn new(base_url: &str, table: &str, timeout_ms: u64) -> Result<Self, LedgerError> {
        let endpoint = HttpEndpoint::new(base_url, timeout_ms)
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint,
            table: table.to_string(),
        })
    }

    fn record_path(&self, execution_id: &str) -> String {
        format!("/tables/{}/records/{}", self.table, execution_id)
    }

    async fn fetch_record(&self, execution_id: &str) -> Option<ExecutionRecord> {
        let url = self.endpoint.url(&self.record_path(execution_id));
        let response = self.endpoint.client().get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }
}

#[async_trait]
impl ExecutionLedger for HttpLedger {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError> {
        let url = self.endpoint.url(&self.record_path(&record.execution_id));
        let response = self
            .endpoint
            .client()
            .put(&url)
            .header(reqwest::header::IF_NONE_MATCH, "*")
            .json(record)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return match self.fetch_record(&record.execution_id).await {
                Some(existing) => check_duplicate(&existing, record),
                None => Err(LedgerError::Conflict(record.execution_id.clone())),
            };
        }
        if !status.is_success() {
            let (status, detail) = read_error(response).await;
            return Err(LedgerError::Http {
                status,
                message: detail.message,
            });
        }
        Ok(())
    }
}
