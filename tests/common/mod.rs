#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use compute_toggle::bridge::{
    ComputeControl, ComputeInventory, ExecutionLedger, InstancePage, InstanceQuery,
    InstanceSummary, LedgerError, MemoryLedger, NotificationChannel, NotifyError, ProviderError,
};
use compute_toggle::engine::{ExecutionRecord, Orchestrator, Services};
use compute_toggle::request::Action;
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_services_config(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("services.yaml");
    std::fs::write(&path, content).expect("Failed to write services.yaml");
    path
}

pub const TAG_KEY: &str = "Env";
pub const TAG_VALUE: &str = "AutoStop";

/// How the fake control service answers
pub enum ControlBehavior {
    Succeed,
    Fail(ProviderError),
    Hang,
}

/// Inventory + control fake that serves scripted pages and records calls
pub struct ScriptedCompute {
    pages: Mutex<VecDeque<Result<Vec<String>, ProviderError>>>,
    control: ControlBehavior,
    pub queries: Mutex<Vec<InstanceQuery>>,
    pub transitions: Mutex<Vec<(Vec<String>, Action)>>,
}

impl ScriptedCompute {
    pub fn with_instances(ids: &[&str]) -> Self {
        Self::with_pages(vec![Ok(ids.iter().map(|s| s.to_string()).collect())])
    }

    pub fn with_pages(pages: Vec<Result<Vec<String>, ProviderError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            control: ControlBehavior::Succeed,
            queries: Mutex::new(Vec::new()),
            transitions: Mutex::new(Vec::new()),
        }
    }

    pub fn control(mut self, behavior: ControlBehavior) -> Self {
        self.control = behavior;
        self
    }

    pub fn transitions(&self) -> Vec<(Vec<String>, Action)> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<InstanceQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeInventory for ScriptedCompute {
    async fn describe_instances(
        &self,
        query: &InstanceQuery,
        _next_token: Option<&str>,
    ) -> Result<InstancePage, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());

        let mut pages = self.pages.lock().unwrap();
        let page = pages.pop_front().unwrap_or_else(|| Ok(Vec::new()))?;
        let next_token = if pages.is_empty() {
            None
        } else {
            Some(format!("page-{}", pages.len()))
        };

        Ok(InstancePage {
            instances: page
                .into_iter()
                .map(|instance_id| InstanceSummary {
                    instance_id,
                    state: query.state,
                })
                .collect(),
            next_token,
        })
    }
}

#[async_trait]
impl ComputeControl for ScriptedCompute {
    async fn change_state(
        &self,
        instance_ids: &[String],
        action: Action,
    ) -> Result<(), ProviderError> {
        self.transitions
            .lock()
            .unwrap()
            .push((instance_ids.to_vec(), action));

        match &self.control {
            ControlBehavior::Succeed => Ok(()),
            ControlBehavior::Fail(e) => Err(e.clone()),
            ControlBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Notification channel that records every message, optionally failing
#[derive(Default)]
pub struct RecordingChannel {
    fail: bool,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            fail: true,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
        if self.fail {
            Err(NotifyError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Ledger that rejects its first `failures` writes, then stores in memory
pub struct FlakyLedger {
    failures: AtomicUsize,
    pub attempts: AtomicUsize,
    pub inner: MemoryLedger,
}

impl FlakyLedger {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            inner: MemoryLedger::new(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionLedger for FlakyLedger {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(LedgerError::Transport("ledger unavailable".to_string()));
        }
        self.inner.put_record(record).await
    }
}

/// Ledger that stores each record immediately but acknowledges late
pub struct SlowAckLedger {
    delay: Duration,
    pub inner: MemoryLedger,
}

impl SlowAckLedger {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: MemoryLedger::new(),
        }
    }
}

#[async_trait]
impl ExecutionLedger for SlowAckLedger {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError> {
        self.inner.put_record(record).await?;
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

pub fn orchestrator(
    compute: Arc<ScriptedCompute>,
    ledger: Arc<dyn ExecutionLedger>,
    channel: Arc<RecordingChannel>,
) -> Orchestrator {
    orchestrator_with_timeout(compute, ledger, channel, Duration::from_secs(5))
}

pub fn orchestrator_with_timeout(
    compute: Arc<ScriptedCompute>,
    ledger: Arc<dyn ExecutionLedger>,
    channel: Arc<RecordingChannel>,
    timeout: Duration,
) -> Orchestrator {
    let services = Services {
        inventory: compute.clone(),
        control: compute,
        ledger,
        channel,
    };
    Orchestrator::new(services, TAG_KEY, TAG_VALUE, timeout)
}

/// Fresh collaborators for a scenario
pub struct Harness {
    pub compute: Arc<ScriptedCompute>,
    pub ledger: Arc<MemoryLedger>,
    pub channel: Arc<RecordingChannel>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(compute: ScriptedCompute) -> Self {
        Self::with_channel(compute, RecordingChannel::default())
    }

    pub fn with_channel(compute: ScriptedCompute, channel: RecordingChannel) -> Self {
        let compute = Arc::new(compute);
        let ledger = Arc::new(MemoryLedger::new());
        let channel = Arc::new(channel);
        let orchestrator = orchestrator(compute.clone(), ledger.clone(), channel.clone());
        Self {
            compute,
            ledger,
            channel,
            orchestrator,
        }
    }

    /// The single record written by the last invocation
    pub async fn only_record(&self) -> ExecutionRecord {
        let records = self.ledger.records().await;
        assert_eq!(records.len(), 1, "expected exactly one ledger record");
        records[0].clone()
    }
}
