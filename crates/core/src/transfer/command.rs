//! Subprocess implementation of [`TransferAgent`].

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant as Deadline};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::TransferConfig;
use super::error::TransferError;
use super::traits::TransferAgent;
use super::types::{TransferProgress, TransferReport, TransferRequest};

static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").unwrap());

/// Smallest progress change worth reporting, in percent.
const PROGRESS_STEP: f32 = 1.0;

/// Extracts the last percentage token (`42.5%`) from a line of output.
pub fn parse_percent(line: &str) -> Option<f32> {
    PERCENT
        .captures_iter(line)
        .filter_map(|c| c.get(1)?.as_str().parse::<f32>().ok())
        .filter(|p| (0.0..=100.0).contains(p))
        .last()
}

async fn wait_deadline(deadline: Option<Deadline>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs a configurable program per transfer.
///
/// Both output streams are read in raw chunks and split on `\r` as well as
/// `\n`, since progress bars redraw a single line with carriage returns.
pub struct CommandTransferAgent {
    config: TransferConfig,
}

impl CommandTransferAgent {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TransferConfig::default())
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Program arguments with placeholders substituted.
    pub fn build_args(&self, request: &TransferRequest) -> Vec<String> {
        let output = request.destination.to_string_lossy();
        let id = request.identifier.to_string();
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{url}", &request.url)
                    .replace("{output}", &output)
                    .replace("{id}", &id)
            })
            .collect()
    }

    fn spawn(&self, args: &[String]) -> Result<Child, TransferError> {
        Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TransferError::ProgramNotFound {
                        program: self.config.program.clone(),
                    }
                } else {
                    TransferError::spawn_failed(e.to_string())
                }
            })
    }
}

async fn forward_lines<R>(mut reader: R, stream: Stream, tx: mpsc::Sender<(Stream, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for &byte in &buf[..n] {
            if byte == b'\r' || byte == b'\n' {
                if !pending.is_empty() {
                    let line = String::from_utf8_lossy(&pending).into_owned();
                    pending.clear();
                    if tx.send((stream, line)).await.is_err() {
                        return;
                    }
                }
            } else {
                pending.push(byte);
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx
            .send((stream, String::from_utf8_lossy(&pending).into_owned()))
            .await;
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill transfer process");
    }
}

#[async_trait]
impl TransferAgent for CommandTransferAgent {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn transfer(
        &self,
        request: TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<TransferReport, TransferError> {
        let start = Instant::now();

        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        if let Some(parent) = request.destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(&request);
        debug!(
            identifier = request.identifier,
            program = %self.config.program,
            ?args,
            "Spawning transfer"
        );
        let mut child = self.spawn(&args)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            terminate(&mut child).await;
            return Err(TransferError::spawn_failed("output streams not captured"));
        };

        let (line_tx, mut line_rx) = mpsc::channel(64);
        tokio::spawn(forward_lines(stdout, Stream::Stdout, line_tx.clone()));
        tokio::spawn(forward_lines(stderr, Stream::Stderr, line_tx));

        let timeout_secs = self.config.timeout_secs;
        // Unrepresentable deadlines mean no time limit.
        let deadline = Deadline::now().checked_add(Duration::from_secs(timeout_secs));
        let tail_len = self.config.stderr_tail_lines;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(tail_len);
        let mut last_percent: Option<f32> = None;

        // Drain output until both streams close.
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    terminate(&mut child).await;
                    debug!(identifier = request.identifier, "Transfer cancelled");
                    return Err(TransferError::Cancelled);
                }
                _ = wait_deadline(deadline) => {
                    terminate(&mut child).await;
                    return Err(TransferError::Timeout { timeout_secs });
                }
                line = line_rx.recv() => {
                    let Some((stream, line)) = line else { break };

                    if let Some(percent) = parse_percent(&line) {
                        let changed = last_percent
                            .map(|last| (percent - last).abs() >= PROGRESS_STEP || (percent >= 100.0 && last < 100.0))
                            .unwrap_or(true);
                        if changed {
                            last_percent = Some(percent);
                            // Non-blocking send
                            let _ = progress_tx.try_send(TransferProgress {
                                identifier: request.identifier,
                                percent,
                            });
                        }
                    } else if stream == Stream::Stderr && tail_len > 0 {
                        if stderr_tail.len() == tail_len {
                            stderr_tail.pop_front();
                        }
                        stderr_tail.push_back(line);
                    }
                }
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate(&mut child).await;
                return Err(TransferError::Cancelled);
            }
            _ = wait_deadline(deadline) => {
                terminate(&mut child).await;
                return Err(TransferError::Timeout { timeout_secs });
            }
            status = child.wait() => status?,
        };

        if !status.success() {
            return Err(TransferError::ExitStatus {
                code: status.code(),
                stderr: Vec::from(stderr_tail).join("\n"),
            });
        }

        let bytes = tokio::fs::metadata(&request.destination)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(TransferReport {
            identifier: request.identifier,
            destination: request.destination,
            bytes,
            duration_ms: start.elapsed().as_millis() as u64,
            exit_code: status.code(),
        })
    }

    async fn validate(&self) -> Result<(), TransferError> {
        // Any exit status counts; only a missing program is fatal.
        let result = Command::new(&self.config.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TransferError::ProgramNotFound {
                    program: self.config.program.clone(),
                })
            }
            Err(e) => Err(TransferError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(destination: PathBuf) -> TransferRequest {
        TransferRequest {
            identifier: 7,
            url: "https://cdn.example.com/7.mp4".to_string(),
            destination,
        }
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("######    45.0%"), Some(45.0));
        assert_eq!(parse_percent("  3 %  then 17.5%"), Some(17.5));
        assert_eq!(parse_percent("[download] 100% of 10MiB"), Some(100.0));
        assert_eq!(parse_percent("no progress here"), None);
        assert_eq!(parse_percent("999%"), None);
    }

    #[test]
    fn test_build_args_substitutes_placeholders() {
        let agent = CommandTransferAgent::with_defaults();
        let args = agent.build_args(&request(PathBuf::from("/tmp/out/ep-0007.mp4")));
        assert_eq!(
            args,
            vec![
                "-L",
                "--fail",
                "--progress-bar",
                "-o",
                "/tmp/out/ep-0007.mp4",
                "https://cdn.example.com/7.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program() {
        let agent = CommandTransferAgent::new(TransferConfig::new(
            "reelcrawl-no-such-program",
            vec![],
        ));
        assert!(matches!(
            agent.validate().await,
            Err(TransferError::ProgramNotFound { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let err = agent
            .transfer(request(dir.path().join("x")), tx, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::ProgramNotFound { .. }));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> CommandTransferAgent {
        CommandTransferAgent::new(TransferConfig::new(
            "sh",
            vec![
                "-c".to_string(),
                script.to_string(),
                "sh".to_string(),
                "{output}".to_string(),
            ],
        ))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_and_completion() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("ep.mp4");
        let agent = sh(r#"printf '10%%\r50.5%%\r50.9%%\r100%%\n' >&2; printf data > "$1""#);

        let (tx, mut rx) = mpsc::channel(16);
        let report = agent
            .transfer(request(dest.clone()), tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.exit_code, Some(0));
        assert_eq!(report.bytes, 4);
        assert!(dest.exists());

        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p.percent);
        }
        assert_eq!(seen, vec![10.0, 50.5, 100.0]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_keeps_stderr_tail() {
        let dir = tempfile::tempdir().unwrap();
        let agent = sh("echo 'connection refused' >&2; exit 3");

        let (tx, _rx) = mpsc::channel(8);
        let err = agent
            .transfer(request(dir.path().join("ep.mp4")), tx, CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            TransferError::ExitStatus { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let agent = sh("sleep 30");
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let (tx, _rx) = mpsc::channel(8);
        let err = agent
            .transfer(request(dir.path().join("ep.mp4")), tx, cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = sh("sleep 30");
        agent.config.timeout_secs = 1;

        let (tx, _rx) = mpsc::channel(8);
        let err = agent
            .transfer(request(dir.path().join("ep.mp4")), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Timeout { timeout_secs: 1 }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_huge_timeout_means_no_limit() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ep.mp4");
        let mut agent = sh(r#"printf data > "$1""#);
        agent.config.timeout_secs = u64::MAX;

        let (tx, _rx) = mpsc::channel(8);
        let report = agent
            .transfer(request(dest.clone()), tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.exit_code, Some(0));
        assert_eq!(report.bytes, 4);
    }

    #[test]
    fn test_wait_deadline_none_never_fires() {
        let mut wait = tokio_test::task::spawn(wait_deadline(None));
        assert!(wait.poll().is_pending());
    }
}
