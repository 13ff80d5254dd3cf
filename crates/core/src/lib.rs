pub mod config;
pub mod download;
pub mod extraction;
pub mod metrics;
pub mod report;
pub mod results;
pub mod scheduler;
pub mod testing;
pub mod transfer;
pub mod work;

pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
    SanitizedConfig, StatusConfig,
};
pub use download::{DispatchError, DownloadConfig, DownloadDispatcher, DownloadOutcome, DownloadStatus};
pub use extraction::{
    canonicalize_url, ExtractionConfig, ExtractionError, ExtractionPipeline, ExtractionResult,
    ExtractionStatus, HttpLinkExtractor, LinkExtractor, LinkSet,
};
pub use report::{OrderedReporter, ReportConfig, ReportError, ReportSink, TracingSink};
pub use results::{
    ResultStore, RunSnapshot, SnapshotConfig, SnapshotError, SnapshotWriter, StatsAggregator,
    StatsSnapshot, StoreError,
};
pub use scheduler::{
    CrawlScheduler, RunRequest, RunSummary, SchedulerConfig, SchedulerError, SchedulerStatus,
    SchedulingMode,
};
pub use transfer::{
    CommandTransferAgent, TransferAgent, TransferConfig, TransferError, TransferProgress,
    TransferReport, TransferRequest,
};
pub use work::{
    parse_identifiers, AggregateRecord, Classification, ClassifierConfig, Identifier,
    IdentifierError, Outcome, ParsedIdentifiers, StateTracker, WorkItem, WorkItemClassifier,
    WorkState,
};
