//! Crawl scheduler implementation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::{SchedulerConfig, SchedulingMode};
use super::types::{RunRequest, RunSummary, SchedulerError, SchedulerStatus};
use crate::download::{DownloadConfig, DownloadDispatcher, DownloadOutcome};
use crate::extraction::{ExtractionConfig, ExtractionPipeline, LinkExtractor};
use crate::metrics;
use crate::report::{OrderedReporter, ReportConfig, ReportSink, TracingSink};
use crate::results::{
    config_hash, ResultStore, RunSnapshot, SnapshotMetadata, SnapshotWriter, StatsAggregator,
};
use crate::transfer::TransferAgent;
use crate::work::{AggregateRecord, Identifier, StateTracker, WorkItemClassifier};

/// State owned by the writer loop of one run.
struct RunState {
    reporter: OrderedReporter,
    store: ResultStore,
    emitted: Vec<AggregateRecord>,
}

/// Runs extraction and download for one identifier.
async fn process_item(
    pipeline: ExtractionPipeline,
    dispatcher: DownloadDispatcher,
    identifier: Identifier,
    cancel: CancellationToken,
) -> AggregateRecord {
    let extraction = pipeline.run(identifier, &cancel).await;
    let download = if extraction.is_success() && dispatcher.enabled() {
        dispatcher.dispatch(&extraction, &cancel).await
    } else {
        DownloadOutcome::not_attempted(identifier)
    };
    AggregateRecord::from_stages(extraction, download)
}

/// Schedules a crawl run with bounded concurrency and ordered reporting.
pub struct CrawlScheduler {
    config: SchedulerConfig,
    classifier: WorkItemClassifier,
    pipeline: ExtractionPipeline,
    dispatcher: DownloadDispatcher,
    report_config: ReportConfig,
    sink: Arc<dyn ReportSink>,
    snapshot: Option<(SnapshotWriter, serde_json::Value)>,
    cancel: CancellationToken,
    tracker: StateTracker,
    stats: Arc<StatsAggregator>,

    // Runtime state
    running: AtomicBool,
    run_id: RwLock<Option<String>>,
}

impl CrawlScheduler {
    /// Create a new scheduler.
    pub fn new(
        config: SchedulerConfig,
        classifier: WorkItemClassifier,
        extractor: Arc<dyn LinkExtractor>,
        extraction_config: ExtractionConfig,
        agent: Arc<dyn TransferAgent>,
        download_config: DownloadConfig,
    ) -> Self {
        let tracker = StateTracker::new();
        Self {
            config,
            classifier,
            pipeline: ExtractionPipeline::new(extractor, extraction_config, tracker.clone()),
            dispatcher: DownloadDispatcher::new(agent, download_config, tracker.clone()),
            report_config: ReportConfig::default(),
            sink: Arc::new(TracingSink),
            snapshot: None,
            cancel: CancellationToken::new(),
            tracker,
            stats: Arc::new(StatsAggregator::default()),
            running: AtomicBool::new(false),
            run_id: RwLock::new(None),
        }
    }

    /// Send released records to `sink` instead of the log.
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_report_config(mut self, report_config: ReportConfig) -> Self {
        self.report_config = report_config;
        self
    }

    /// Persist a snapshot at the end of each run, embedding `config_echo`.
    pub fn with_snapshot(mut self, writer: SnapshotWriter, config_echo: serde_json::Value) -> Self {
        self.snapshot = Some((writer, config_echo));
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the current run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> Arc<StatsAggregator> {
        Arc::clone(&self.stats)
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Current status.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            run_id: self.run_id.read().await.clone(),
            cancelled: self.cancel.is_cancelled(),
            stats: self.stats.snapshot(),
            active: self.tracker.snapshot().await,
        }
    }

    /// Run the crawl to completion or cancellation.
    pub async fn run(&self, request: RunRequest) -> Result<RunSummary, SchedulerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return Err(SchedulerError::AlreadyRunning);
        }

        let result = self.run_inner(request).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, request: RunRequest) -> Result<RunSummary, SchedulerError> {
        let run_id = Uuid::new_v4().to_string();
        *self.run_id.write().await = Some(run_id.clone());

        let classified = self.classifier.classify(&request.identifiers);
        self.stats.reset(classified.len() as u64);

        info!(
            run_id = %run_id,
            total = classified.len(),
            filler = classified.skip.len(),
            canon = classified.process.len(),
            rejected = request.rejected.len(),
            workers = self.config.effective_workers(),
            mode = %self.config.mode,
            auto_download = self.dispatcher.enabled(),
            "Starting crawl"
        );

        if self.dispatcher.enabled() {
            if let Err(e) = self.dispatcher.validate().await {
                error!(error = %e, "Download capability unavailable, aborting run");
                self.pipeline.shutdown().await;
                return Err(e.into());
            }
        }

        let mut state = RunState {
            reporter: OrderedReporter::new(
                classified
                    .skip
                    .iter()
                    .chain(&classified.process)
                    .map(|i| i.identifier),
            ),
            store: ResultStore::new(),
            emitted: Vec::with_capacity(classified.len()),
        };

        // Filler items are final before any worker starts.
        for item in &classified.skip {
            self.finish(&mut state, AggregateRecord::filler(item.identifier))
                .await;
        }

        let queue = classified.process_ids();
        let (launched, chunks) = match self.config.mode {
            SchedulingMode::Chunked => self.run_chunked(&queue, &mut state).await,
            SchedulingMode::Dynamic => self.run_dynamic(&queue, &mut state).await,
        };

        let interrupted = self.cancel.is_cancelled();
        let not_started = queue[launched..].to_vec();

        let leftovers = state.reporter.flush_remaining();
        if !leftovers.is_empty() {
            debug!(count = leftovers.len(), "Flushing buffered records");
        }
        for mut record in leftovers {
            if interrupted {
                record.interrupted = true;
                state.store.mark_interrupted(record.identifier);
            }
            self.emit(&mut state, record);
        }

        let stats = self.stats.snapshot();
        if self.report_config.progress_every == 0
            || state.emitted.len() as u64 % self.report_config.progress_every != 0
        {
            self.sink.progress(&stats);
        }

        self.pipeline.shutdown().await;

        if interrupted {
            warn!(
                run_id = %run_id,
                recorded = stats.recorded,
                not_started = not_started.len(),
                "Crawl interrupted"
            );
        } else {
            info!(run_id = %run_id, recorded = stats.recorded, "Crawl finished");
        }

        let snapshot_path = match &self.snapshot {
            Some((writer, echo)) => {
                let snapshot = RunSnapshot {
                    metadata: SnapshotMetadata {
                        run_id: run_id.clone(),
                        generated_at: Utc::now(),
                        interrupted,
                        totals: stats.clone(),
                        config: echo.clone(),
                        config_hash: config_hash(echo),
                        rejected: request.rejected.iter().map(Into::into).collect(),
                        not_started: not_started.clone(),
                    },
                    records: state.store.into_map(),
                };
                Some(writer.write(&snapshot).await?)
            }
            None => None,
        };

        Ok(RunSummary {
            run_id,
            stats,
            records: state.emitted,
            interrupted,
            not_started,
            snapshot_path,
            chunks,
        })
    }

    /// Spawns the pipeline for one identifier. A task that panics yields a
    /// failed record for that identifier only.
    fn launch(&self, identifier: Identifier) -> impl Future<Output = AggregateRecord> {
        let handle = tokio::spawn(process_item(
            self.pipeline.clone(),
            self.dispatcher.clone(),
            identifier,
            self.cancel.clone(),
        ));

        async move {
            match handle.await {
                Ok(record) => record,
                Err(e) => {
                    error!(identifier, error = %e, "Pipeline task failed");
                    AggregateRecord::failed(identifier, format!("pipeline task failed: {}", e))
                }
            }
        }
    }

    /// Fixed chunks of K; returns (items launched, chunks launched).
    async fn run_chunked(&self, queue: &[Identifier], state: &mut RunState) -> (usize, usize) {
        let workers = self.config.effective_workers();
        let delay = self.config.effective_delay();
        let mut launched = 0;
        let mut chunks = 0;

        for (index, chunk) in queue.chunks(workers).enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            if index > 0 && !delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            chunks += 1;
            metrics::CHUNKS_LAUNCHED.inc();
            debug!(
                chunk = chunks,
                size = chunk.len(),
                first = chunk[0],
                last = chunk[chunk.len() - 1],
                "Launching chunk"
            );

            let mut in_flight: FuturesUnordered<_> =
                chunk.iter().map(|&id| self.launch(id)).collect();
            launched += chunk.len();

            while let Some(record) = in_flight.next().await {
                self.finish(state, record).await;
            }
        }

        if self.cancel.is_cancelled() && launched < queue.len() {
            info!(
                remaining = queue.len() - launched,
                "Cancellation requested, no further chunks launched"
            );
        }

        (launched, chunks)
    }

    /// Pool of K refilled on every completion; returns (items launched, 0).
    async fn run_dynamic(&self, queue: &[Identifier], state: &mut RunState) -> (usize, usize) {
        let workers = self.config.effective_workers();
        let mut pending = queue.iter().copied();
        let mut in_flight = FuturesUnordered::new();
        let mut launched = 0;

        loop {
            while in_flight.len() < workers && !self.cancel.is_cancelled() {
                match pending.next() {
                    Some(id) => {
                        in_flight.push(self.launch(id));
                        launched += 1;
                    }
                    None => break,
                }
            }

            match in_flight.next().await {
                Some(record) => self.finish(state, record).await,
                None => break,
            }
        }

        (launched, 0)
    }

    /// Single entry point for terminal records.
    async fn finish(&self, state: &mut RunState, record: AggregateRecord) {
        let identifier = record.identifier;
        self.tracker.remove(identifier).await;

        if let Err(e) = state.store.insert(record.clone()) {
            warn!(identifier, error = %e, "Dropping duplicate record");
            return;
        }
        self.stats.record(&record);

        match state.reporter.complete(record) {
            Ok(released) => {
                for record in released {
                    self.emit(state, record);
                }
            }
            Err(e) => warn!(identifier, error = %e, "Record rejected by reporter"),
        }
    }

    fn emit(&self, state: &mut RunState, record: AggregateRecord) {
        self.sink.record(&record);
        state.emitted.push(record);

        let every = self.report_config.progress_every;
        if every > 0 && state.emitted.len() as u64 % every == 0 {
            self.sink.progress(&self.stats.snapshot());
        }
    }
}
