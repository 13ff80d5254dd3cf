//! Destinations for released records.

use tracing::info;

use crate::results::StatsSnapshot;
use crate::work::{AggregateRecord, Outcome};

/// Receives records in emission order.
///
/// Called from the single writer loop of a run, so implementations see
/// records one at a time.
pub trait ReportSink: Send + Sync {
    /// One released record.
    fn record(&self, record: &AggregateRecord);

    /// Aggregate progress, emitted every N records.
    fn progress(&self, _stats: &StatsSnapshot) {}
}

/// One line per record, tagged with its outcome.
pub fn render_record(record: &AggregateRecord) -> String {
    let mut line = format!("#{} {}", record.identifier, record.outcome);

    let detail = match record.outcome {
        Outcome::Filler | Outcome::Cancelled => None,
        Outcome::ExtractFailed => record
            .extraction
            .as_ref()
            .and_then(|e| e.error.as_ref())
            .map(|e| e.to_string()),
        Outcome::NoDownload => record.extraction.as_ref().map(|e| {
            let kinds: Vec<&str> = e.links.keys().map(String::as_str).collect();
            format!("{} link(s) [{}]", kinds.len(), kinds.join(", "))
        }),
        Outcome::Downloaded => record.download.local_file_name.clone(),
        Outcome::DownloadFailed => record.download.error.clone(),
    };

    if let Some(detail) = detail {
        line.push_str(": ");
        line.push_str(&single_line(&detail));
    }
    if record.interrupted {
        line.push_str(" [interrupted]");
    }
    line
}

/// Joins the non-empty lines of a multi-line detail with ` | `.
fn single_line(detail: &str) -> String {
    detail
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Aggregate progress line.
pub fn render_progress(stats: &StatsSnapshot) -> String {
    format!(
        "progress: {}/{} recorded (extracted {}, extract failed {}, filler {}, downloaded {}, download failed {})",
        stats.recorded,
        stats.total,
        stats.extraction_succeeded,
        stats.extraction_failed,
        stats.filler_skipped,
        stats.download_completed,
        stats.download_failed,
    )
}

/// Writes records to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn record(&self, record: &AggregateRecord) {
        info!(
            identifier = record.identifier,
            outcome = %record.outcome,
            interrupted = record.interrupted,
            "{}",
            render_record(record)
        );
    }

    fn progress(&self, stats: &StatsSnapshot) {
        info!("{}", render_progress(stats));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadOutcome, DownloadStatus};
    use crate::extraction::{ExtractionError, ExtractionResult, LinkSet};

    #[test]
    fn test_render_filler() {
        assert_eq!(render_record(&AggregateRecord::filler(7)), "#7 filler");
    }

    #[test]
    fn test_render_extract_failed() {
        let extraction = ExtractionResult::failed(
            4,
            "http://p/4",
            ExtractionError::content_not_found("http://p/4"),
            2,
        );
        let record = AggregateRecord::from_stages(extraction, DownloadOutcome::not_attempted(4));
        assert_eq!(render_record(&record), "#4 extract_failed: No content found at http://p/4");
    }

    #[test]
    fn test_render_downloaded_and_interrupted() {
        let mut links = LinkSet::new();
        links.insert("720p".into(), "https://x/1".into());
        let extraction = ExtractionResult::succeeded(1, "http://p/1", links, 1);
        let download = DownloadOutcome {
            status: DownloadStatus::Completed,
            local_file_name: Some("episode-0001-720p.mp4".into()),
            ..DownloadOutcome::not_attempted(1)
        };
        let mut record = AggregateRecord::from_stages(extraction, download);
        assert_eq!(render_record(&record), "#1 downloaded: episode-0001-720p.mp4");

        record.interrupted = true;
        assert!(render_record(&record).ends_with("[interrupted]"));
    }

    #[test]
    fn test_render_multiline_stderr_on_one_line() {
        let mut links = LinkSet::new();
        links.insert("720p".into(), "https://x/1".into());
        let extraction = ExtractionResult::succeeded(1, "http://p/1", links, 1);
        let err = crate::transfer::TransferError::ExitStatus {
            code: Some(3),
            stderr: "a\nb\n".to_string(),
        };
        let download = DownloadOutcome {
            status: DownloadStatus::Failed,
            error: Some(err.detail()),
            ..DownloadOutcome::not_attempted(1)
        };
        let record = AggregateRecord::from_stages(extraction, download);

        let line = render_record(&record);
        assert!(!line.contains('\n'));
        assert_eq!(line, "#1 download_failed: Transfer exited with code 3: a | b");
        assert_eq!(
            record.download.error.as_deref(),
            Some("Transfer exited with code 3: a\nb\n")
        );
    }

    #[test]
    fn test_render_no_download_lists_kinds() {
        let mut links = LinkSet::new();
        links.insert("720p".into(), "https://x/1".into());
        links.insert("1080p".into(), "https://x/2".into());
        let extraction = ExtractionResult::succeeded(2, "http://p/2", links, 1);
        let record = AggregateRecord::from_stages(extraction, DownloadOutcome::not_attempted(2));
        assert_eq!(render_record(&record), "#2 no_download: 2 link(s) [1080p, 720p]");
    }
}
