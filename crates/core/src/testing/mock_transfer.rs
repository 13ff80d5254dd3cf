//! Mock transfer agent for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::transfer::{
    TransferAgent, TransferError, TransferProgress, TransferReport, TransferRequest,
};
use crate::work::Identifier;

/// Scripted result of a mock transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferBehavior {
    /// Report progress, write the destination file, exit 0.
    Succeed,
    /// Exit with a non-zero code.
    FailWithExit { code: i32, stderr: String },
    /// Fail before a process would start.
    SpawnFail,
    /// Never finish on its own; only cancellation ends it.
    Hang,
}

/// Mock implementation of the TransferAgent trait.
///
/// Behaves like a subprocess-backed agent without spawning anything:
/// successful transfers write a small file to the destination, hanging
/// transfers end only when cancelled and are recorded as terminated.
#[derive(Debug)]
pub struct MockTransferAgent {
    behaviors: Arc<RwLock<HashMap<Identifier, TransferBehavior>>>,
    default_behavior: Arc<RwLock<TransferBehavior>>,
    progress_steps: Arc<RwLock<Vec<f32>>>,
    duration: Arc<RwLock<Duration>>,
    requests: Arc<RwLock<Vec<TransferRequest>>>,
    terminated: Arc<RwLock<Vec<Identifier>>>,
    validate_fails: Arc<RwLock<bool>>,
    active: Arc<AtomicUsize>,
}

impl Default for MockTransferAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransferAgent {
    /// Create a new mock agent.
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            default_behavior: Arc::new(RwLock::new(TransferBehavior::Succeed)),
            progress_steps: Arc::new(RwLock::new(vec![25.0, 50.0, 75.0, 100.0])),
            duration: Arc::new(RwLock::new(Duration::from_millis(5))),
            requests: Arc::new(RwLock::new(Vec::new())),
            terminated: Arc::new(RwLock::new(Vec::new())),
            validate_fails: Arc::new(RwLock::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Behavior for one identifier.
    pub async fn set_behavior(&self, identifier: Identifier, behavior: TransferBehavior) {
        self.behaviors.write().await.insert(identifier, behavior);
    }

    /// Behavior for identifiers without their own.
    pub async fn set_default_behavior(&self, behavior: TransferBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    /// Progress values reported by successful transfers.
    pub async fn set_progress_steps(&self, steps: Vec<f32>) {
        *self.progress_steps.write().await = steps;
    }

    /// Simulated transfer time.
    pub async fn set_duration(&self, duration: Duration) {
        *self.duration.write().await = duration;
    }

    /// Make `validate` fail as if the program were missing.
    pub async fn set_validate_fails(&self, fails: bool) {
        *self.validate_fails.write().await = fails;
    }

    /// Requests received, in arrival order.
    pub async fn requests(&self) -> Vec<TransferRequest> {
        self.requests.read().await.clone()
    }

    /// Identifiers whose transfer was killed by cancellation, sorted.
    pub async fn terminated(&self) -> Vec<Identifier> {
        let mut ids = self.terminated.read().await.clone();
        ids.sort_unstable();
        ids
    }

    /// Transfers currently running.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn behavior_for(&self, identifier: Identifier) -> TransferBehavior {
        match self.behaviors.read().await.get(&identifier) {
            Some(b) => b.clone(),
            None => self.default_behavior.read().await.clone(),
        }
    }

    async fn run_behavior(
        &self,
        behavior: TransferBehavior,
        request: TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<TransferReport, TransferError> {
        let identifier = request.identifier;
        match behavior {
            TransferBehavior::Hang => {
                let _ = progress_tx.try_send(TransferProgress {
                    identifier,
                    percent: 10.0,
                });
                cancel.cancelled().await;
                Err(self.killed(identifier).await)
            }
            TransferBehavior::FailWithExit { code, stderr } => Err(TransferError::ExitStatus {
                code: Some(code),
                stderr,
            }),
            TransferBehavior::Succeed | TransferBehavior::SpawnFail => {
                let steps = self.progress_steps.read().await.clone();
                let step_delay = *self.duration.read().await / (steps.len().max(1) as u32);
                for percent in steps {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(self.killed(identifier).await),
                        _ = tokio::time::sleep(step_delay) => {}
                    }
                    let _ = progress_tx.try_send(TransferProgress { identifier, percent });
                }

                if let Some(parent) = request.destination.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&request.destination, b"mock").await?;

                Ok(TransferReport {
                    identifier,
                    destination: request.destination,
                    bytes: 4,
                    duration_ms: step_delay.as_millis() as u64,
                    exit_code: Some(0),
                })
            }
        }
    }

    async fn killed(&self, identifier: Identifier) -> TransferError {
        self.terminated.write().await.push(identifier);
        TransferError::Cancelled
    }
}

#[async_trait]
impl TransferAgent for MockTransferAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transfer(
        &self,
        request: TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<TransferReport, TransferError> {
        self.requests.write().await.push(request.clone());
        let identifier = request.identifier;

        let behavior = self.behavior_for(identifier).await;
        if behavior == TransferBehavior::SpawnFail {
            return Err(TransferError::spawn_failed("mock spawn failure"));
        }

        self.active.fetch_add(1, Ordering::SeqCst);
        let result = self.run_behavior(behavior, request, progress_tx, cancel).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn validate(&self) -> Result<(), TransferError> {
        if *self.validate_fails.read().await {
            return Err(TransferError::ProgramNotFound {
                program: "mock".to_string(),
            });
        }
        Ok(())
    }
}
