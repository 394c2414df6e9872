use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;

use super::loader;
use super::model::RecordStore;

/// Upper bound on a vectors payload.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Errors surfaced when a data source cannot produce a record set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network unreachable, connection refused, timeout, ...
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The payload could not be read as a vector table.
    #[error("invalid vector data: {0:#}")]
    Format(#[from] anyhow::Error),

    /// The worker thread went away before reporting.
    #[error("load was interrupted before it finished")]
    Interrupted,
}

/// Where a session's records come from. Called once per load.
pub trait DataSource: Send {
    fn fetch(&self) -> Result<RecordStore, FetchError>;

    /// Human-readable origin for status lines and logs.
    fn describe(&self) -> String;
}

/// Result of one load request, tagged so the session can drop stale ones.
#[derive(Debug)]
pub struct LoadOutcome {
    pub request: u64,
    pub origin: String,
    pub result: Result<RecordStore, FetchError>,
}

/// Run `source.fetch()` on a worker thread; exactly one outcome is sent.
///
/// No retry and no cancellation: dropping the receiver just discards the result.
pub fn spawn_fetch(source: Box<dyn DataSource>, request: u64) -> Receiver<LoadOutcome> {
    let (tx, rx) = mpsc::channel();
    let origin = source.describe();
    thread::spawn(move || {
        log::info!("Fetching vectors from {origin} (request {request})");
        let result = source.fetch();
        if tx.send(LoadOutcome { request, origin, result }).is_err() {
            log::debug!("Load request {request} finished after the viewer stopped listening");
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// HTTP endpoint
// ---------------------------------------------------------------------------

/// `GET` a JSON array of vectors from the backend.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        HttpSource {
            url: url.into(),
            timeout,
        }
    }

    fn transport(&self, e: impl std::fmt::Display) -> FetchError {
        FetchError::Transport {
            url: self.url.clone(),
            message: e.to_string(),
        }
    }
}

impl DataSource for HttpSource {
    fn fetch(&self) -> Result<RecordStore, FetchError> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(config);

        let mut response = agent
            .get(self.url.as_str())
            .header("Accept", "application/json")
            .call()
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(|e| self.transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(loader::parse_json_records(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Pull the `error` field out of a `{"error": "..."}` body, else a trimmed snippet.
fn error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

// ---------------------------------------------------------------------------
// Local export
// ---------------------------------------------------------------------------

/// A `.json` / `.csv` / `.parquet` export on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<RecordStore, FetchError> {
        Ok(loader::load_file(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn error_body_message_is_extracted() {
        assert_eq!(error_message(r#"{"error": "No vectors found"}"#), "No vectors found");
        assert_eq!(error_message("  Internal Server Error \n"), "Internal Server Error");
        assert_eq!(error_message(""), "empty response");
    }

    #[test]
    fn file_source_reads_export() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"id": "a", "x": 1, "y": 2, "z": 3, "kind": "doc"}}]"#).unwrap();
        let source = FileSource::new(file.path());
        let store = source.fetch().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn file_source_reports_format_errors() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"id": "a"}}"#).unwrap();
        let err = FileSource::new(file.path()).fetch().unwrap_err();
        assert!(matches!(err, FetchError::Format(_)));
    }

    #[test]
    fn spawned_fetch_delivers_one_outcome() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"id": "a", "x": 1, "y": 2, "z": 3}}]"#).unwrap();
        let rx = spawn_fetch(Box::new(FileSource::new(file.path())), 7);
        let outcome = rx.recv().unwrap();
        assert_eq!(outcome.request, 7);
        assert_eq!(outcome.result.unwrap().len(), 1);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let source = HttpSource::new("http://127.0.0.1:9/api/vectors", Duration::from_secs(2));
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
