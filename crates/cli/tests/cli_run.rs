//! Binary tests for `reelcrawl`.
//!
//! Each test starts an in-process page host serving episode pages, writes a
//! config pointing at it and runs the real binary.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::{sleep, timeout};

/// Serves `/episodes/{id}` with one 1080p Drive link per page.
struct PageHost {
    missing: HashSet<u32>,
    slow: HashSet<u32>,
    hits: AtomicUsize,
}

async fn episode_page(
    State(host): State<Arc<PageHost>>,
    UrlPath(id): UrlPath<u32>,
) -> impl IntoResponse {
    host.hits.fetch_add(1, Ordering::SeqCst);
    if host.slow.contains(&id) {
        sleep(Duration::from_secs(3)).await;
    }
    if host.missing.contains(&id) {
        return (StatusCode::NOT_FOUND, Html(String::from("not here"))).into_response();
    }
    Html(format!(
        r#"<html><body>
<h1>Episode {id}</h1>
<a class="btn" href="https://drive.google.com/file/d/ep{id}/view?usp=sharing">Download 1080p</a>
<a href="/about">About</a>
</body></html>"#
    ))
    .into_response()
}

async fn start_page_host(missing: &[u32], slow: &[u32]) -> (SocketAddr, Arc<PageHost>) {
    let host = Arc::new(PageHost {
        missing: missing.iter().copied().collect(),
        slow: slow.iter().copied().collect(),
        hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/episodes/{id}", get(episode_page))
        .with_state(Arc::clone(&host));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, host)
}

/// Find an available port
fn get_available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(dir: &Path, addr: SocketAddr, extra: &str) -> PathBuf {
    let path = dir.join("reelcrawl.toml");
    let config = format!(
        r#"
[scheduler]
workers = 2
inter_chunk_delay_ms = 0

[extraction]
page_url_template = "http://{addr}/episodes/{{id}}"
retry_delay_ms = 10
attempt_timeout_secs = 10

[classifier]
filler = ["2"]

[snapshot]
directory = "{snapshots}"
prefix = "test"

{extra}
"#,
        addr = addr,
        snapshots = dir.join("snapshots").display(),
        extra = extra,
    );
    std::fs::write(&path, config).unwrap();
    path
}

fn reelcrawl(config: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_reelcrawl"));
    command
        .arg("--config")
        .arg(config)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .env_remove("REELCRAWL_CONFIG")
        .kill_on_drop(true);
    command
}

async fn run_to_end(command: &mut Command) -> Output {
    timeout(Duration::from_secs(60), command.output())
        .await
        .expect("reelcrawl did not finish")
        .expect("Failed to run reelcrawl")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn snapshots_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir.join("snapshots")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_run_reports_in_order_and_writes_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, host) = start_page_host(&[3], &[]).await;
    let config = write_config(temp_dir.path(), addr, "");

    let output = run_to_end(reelcrawl(&config).args(["run", "1-4"])).await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = stdout_lines(&output);
    let records: Vec<&String> = lines.iter().filter(|l| l.starts_with('#')).collect();
    assert_eq!(records.len(), 4, "stdout: {:?}", lines);
    assert_eq!(records[0], "#1 no_download: 1 link(s) [1080p]");
    assert_eq!(records[1], "#2 filler");
    assert!(records[2].starts_with("#3 extract_failed"));
    assert_eq!(records[3], "#4 no_download: 1 link(s) [1080p]");
    assert!(lines.last().unwrap().starts_with("progress: 4/4 recorded"));

    // Two attempts for the missing page, one for each other canon page.
    assert_eq!(host.hits.load(Ordering::SeqCst), 4);

    let snapshots = snapshots_in(temp_dir.path());
    assert_eq!(snapshots.len(), 1);
    let name = snapshots[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("test-"));
    assert!(!name.contains("interrupted"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshots[0]).unwrap()).unwrap();
    assert_eq!(json["metadata"]["interrupted"], false);
    assert_eq!(json["metadata"]["totals"]["recorded"], 4);
    assert_eq!(
        json["records"]["1"]["extraction"]["links"]["1080p"],
        "https://drive.google.com/uc?export=download&id=ep1"
    );
    assert_eq!(json["records"]["2"]["outcome"], "filler");
    assert_eq!(json["records"]["3"]["extraction"]["attempts"], 2);
}

#[tokio::test]
async fn test_invalid_tokens_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, _host) = start_page_host(&[], &[]).await;
    let config = write_config(temp_dir.path(), addr, "");

    let output = run_to_end(reelcrawl(&config).args(["run", "abc", "5", "9-7", "--no-snapshot"])).await;
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    let records: Vec<&String> = lines.iter().filter(|l| l.starts_with('#')).collect();
    assert_eq!(records.len(), 1);
    assert!(records[0].starts_with("#5 "));
    assert!(snapshots_in(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_no_valid_identifiers_exits_with_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, host) = start_page_host(&[], &[]).await;
    let config = write_config(temp_dir.path(), addr, "");

    let output = run_to_end(reelcrawl(&config).args(["run", "abc", "0"])).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_lines(&output).is_empty());
    assert_eq!(host.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(
        &path,
        "[extraction]\npage_url_template = \"https://example.com/no-placeholder\"\n",
    )
    .unwrap();

    let output = run_to_end(reelcrawl(&path).args(["run", "1"])).await;
    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_config_command_hides_cookie() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, _host) = start_page_host(&[], &[]).await;
    let config = write_config(temp_dir.path(), addr, "");
    let text = std::fs::read_to_string(&config)
        .unwrap()
        .replace("retry_delay_ms = 10", "retry_delay_ms = 10\ncookie = \"sid=top-secret\"");
    std::fs::write(&config, text).unwrap();

    let output = run_to_end(reelcrawl(&config).arg("config")).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cookie_configured = true"));
    assert!(!stdout.contains("top-secret"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_download_with_command_agent() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, _host) = start_page_host(&[], &[]).await;
    let dest = temp_dir.path().join("episodes");
    let config = write_config(
        temp_dir.path(),
        addr,
        r#"
[transfer]
program = "sh"
args = ["-c", "echo ' 42.0%' >&2; printf '%s' \"$1\" > \"$0\"; echo '100.0%' >&2", "{output}", "{url}"]
"#,
    );

    let output = run_to_end(
        reelcrawl(&config)
            .args(["run", "1,3", "--download", "--dest"])
            .arg(&dest),
    )
    .await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = stdout_lines(&output);
    assert!(lines.contains(&"#1 downloaded: episode-0001-1080p.mp4".to_string()));
    assert!(lines.contains(&"#3 downloaded: episode-0003-1080p.mp4".to_string()));

    let written = std::fs::read_to_string(dest.join("episode-0003-1080p.mp4")).unwrap();
    assert_eq!(written, "https://drive.google.com/uc?export=download&id=ep3");
}

#[tokio::test]
async fn test_status_endpoint_during_run() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, _host) = start_page_host(&[], &[7]).await;
    let config = write_config(temp_dir.path(), addr, "");
    let port = get_available_port();

    let mut child = reelcrawl(&config)
        .args(["run", "7", "--status-port", &port.to_string()])
        .stdout(std::process::Stdio::null())
        .spawn()
        .expect("Failed to spawn reelcrawl");

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}/api/v1", port);

    // The page for 7 takes seconds, so the run is still going.
    let mut running = false;
    for _ in 0..40 {
        if let Ok(response) = client.get(format!("{}/status", base)).send().await {
            let status: serde_json::Value = response.json().await.unwrap();
            if status["running"] == true && status["stats"]["total"] == 1 {
                running = true;
                break;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(running, "status endpoint never reported the run");

    let metrics = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("reelcrawl_run_active"));

    let exit = timeout(Duration::from_secs(30), child.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(exit.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_sigterm_writes_interrupted_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let (addr, host) = start_page_host(&[], &[1]).await;
    let config = write_config(temp_dir.path(), addr, "");

    let mut child = reelcrawl(&config)
        .args(["run", "1-5", "--workers", "1"])
        .stdout(std::process::Stdio::piped())
        .spawn()
        .expect("Failed to spawn reelcrawl");

    // Wait until the first page request is in flight.
    timeout(Duration::from_secs(10), async {
        while host.hits.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let pid = child.id().unwrap();
    let killed = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let output = timeout(Duration::from_secs(30), child.wait_with_output())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(output.status.code(), Some(130));

    let lines = stdout_lines(&output);
    assert!(lines.contains(&"#1 cancelled [interrupted]".to_string()));
    assert!(lines.contains(&"#2 filler".to_string()));

    let snapshots = snapshots_in(temp_dir.path());
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0]
        .to_string_lossy()
        .ends_with("-interrupted.json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshots[0]).unwrap()).unwrap();
    assert_eq!(json["metadata"]["interrupted"], true);
    assert_eq!(json["metadata"]["not_started"], serde_json::json!([3, 4, 5]));
}
