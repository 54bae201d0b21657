//! Constant load on the test app
//!
//! Requests are issued one after another for as long as the duration and
//! request limits allow. Every report interval a throughput line is appended
//! to a log file; nothing is reported back to the caller of [`LoadLauncher`].

mod stats;

pub use stats::{LoadTotals, LoadWindow};

use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::http::HttpClient;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open load log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create HTTP client: {0}")]
    Client(#[from] crate::http::HttpError),
}

/// Load generation settings
#[derive(Clone, Debug)]
pub struct LoadConfig {
    /// Target URL
    pub url: String,

    /// Stop after this much time
    pub duration: Duration,

    /// Stop after this many requests
    pub request_limit: u64,

    /// Append-only statistics log
    pub log_path: PathBuf,

    /// How often a statistics line is written
    pub report_interval: Duration,
}

impl LoadConfig {
    pub fn new(url: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            duration: Duration::from_secs(5 * 60 * 60),
            request_limit: 100_000_000_000,
            log_path: log_path.into(),
            report_interval: Duration::from_secs(10),
        }
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }
}

fn open_log(path: &Path) -> Result<File, LoadError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoadError::Log {
            path: path.to_path_buf(),
            source,
        })
}

fn write_line(log: &mut File, line: &str) {
    let stamped = format!("{} {}\n", Utc::now().format("%Y/%m/%d %H:%M:%S"), line);
    if let Err(e) = log.write_all(stamped.as_bytes()) {
        warn!("Failed to write load statistics: {}", e);
    }
}

/// Produce load until the duration or request limit is reached, whichever comes first
pub async fn produce_load(client: &HttpClient, config: &LoadConfig) -> Result<LoadTotals, LoadError> {
    let mut log = open_log(&config.log_path)?;
    let end = Instant::now() + config.duration;
    let mut window = LoadWindow::start(Instant::now());
    let mut totals = LoadTotals::default();

    for _ in 0..config.request_limit {
        let now = Instant::now();
        if now >= end {
            break;
        }

        if now.duration_since(window.started()) >= config.report_interval {
            write_line(&mut log, &window.summary_line(now));
            window = LoadWindow::start(now);
        }

        match client.get(&config.url).await {
            Ok(response) if response.is_success() => {
                debug!(
                    "Load request returned {} bytes in {:?}",
                    response.body_len, response.duration
                );
                window.record_success();
                totals.successes += 1;
            }
            Ok(response) => {
                debug!("Load request got status {}", response.status_code);
                window.record_error();
                totals.errors += 1;
            }
            Err(e) => {
                debug!("Load request failed: {}", e);
                window.record_error();
                totals.errors += 1;
            }
        }
    }

    if window.requests() > 0 {
        write_line(&mut log, &window.summary_line(Instant::now()));
    }

    Ok(totals)
}

/// Starts load generation without waiting for it
pub trait LoadLauncher: Send + Sync {
    fn launch(&self, url: &str);
}

/// Launches [`produce_load`] as a detached tokio task
#[derive(Clone, Debug)]
pub struct BackgroundLoad {
    template: LoadConfig,
}

impl BackgroundLoad {
    /// `template` supplies everything but the URL
    pub fn new(template: LoadConfig) -> Self {
        Self { template }
    }
}

impl LoadLauncher for BackgroundLoad {
    fn launch(&self, url: &str) {
        let config = LoadConfig {
            url: url.to_string(),
            ..self.template.clone()
        };

        info!(
            "Producing load on {} for up to {:?}, statistics in {}",
            config.url,
            config.duration,
            config.log_path.display()
        );

        // Detached: the handle is dropped and the task shares nothing with the caller.
        tokio::spawn(async move {
            let result = match HttpClient::new() {
                Ok(client) => produce_load(&client, &config).await,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(totals) => info!(
                    "Load finished: {} requests, {} errors",
                    totals.requests(),
                    totals.errors
                ),
                Err(e) => warn!("Load generation stopped: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_stops_at_request_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(5)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig {
            request_limit: 5,
            ..LoadConfig::new(server.uri(), dir.path().join("load.log"))
        };

        let totals = produce_load(&HttpClient::new().unwrap(), &config)
            .await
            .unwrap();

        assert_eq!(totals.requests(), 5);
        assert_eq!(totals.errors, 0);
    }

    #[tokio::test]
    async fn test_stops_at_duration_and_logs_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(20)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("load.log");
        let config = LoadConfig::new(server.uri(), &log_path)
            .duration(Duration::from_millis(300))
            .report_interval(Duration::from_millis(100));

        let totals = produce_load(&HttpClient::new().unwrap(), &config)
            .await
            .unwrap();
        assert!(totals.requests() > 0);

        let log = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert!(lines.len() >= 2, "expected periodic lines, got {log}");
        for line in lines {
            assert!(line.contains("numRequests"));
            assert!(line.contains("errorCount 0"));
            assert!(line.contains("error rate: 0.00000"));
        }
    }

    #[tokio::test]
    async fn test_log_is_appended() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("load.log");
        std::fs::write(&log_path, "previous run\n").unwrap();

        let config = LoadConfig {
            request_limit: 3,
            ..LoadConfig::new(server.uri(), &log_path)
        };
        produce_load(&HttpClient::new().unwrap(), &config)
            .await
            .unwrap();

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.starts_with("previous run\n"));
        assert!(log.contains("numRequests 3, successCount 3, errorCount 0"));
    }

    #[tokio::test]
    async fn test_error_status_counts_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("load.log");
        let config = LoadConfig {
            request_limit: 4,
            ..LoadConfig::new(server.uri(), &log_path)
        };

        let totals = produce_load(&HttpClient::new().unwrap(), &config)
            .await
            .unwrap();
        assert_eq!(totals, LoadTotals { successes: 0, errors: 4 });

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("successCount 0, errorCount 4, error rate: 1.00000"));
    }

    #[tokio::test]
    async fn test_unreachable_target_counts_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig {
            request_limit: 2,
            ..LoadConfig::new("http://127.0.0.1:9/", dir.path().join("load.log"))
        };

        let totals = produce_load(&HttpClient::with_timeout(2).unwrap(), &config)
            .await
            .unwrap();

        assert_eq!(totals.errors, 2);
        assert_eq!(totals.successes, 0);
    }
}
