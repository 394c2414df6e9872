use std::path::PathBuf;
use std::time::Duration;

use crate::data::source::{DataSource, FileSource, HttpSource};

pub const URL_VAR: &str = "VECTOR_SCOPE_URL";
pub const TIMEOUT_VAR: &str = "VECTOR_SCOPE_TIMEOUT_SECS";

pub const DEFAULT_URL: &str = "http://127.0.0.1:5000/api/vectors";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Where the initial dataset comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Http(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub source: SourceSpec,
    /// The API endpoint used by "Reload from API", even when started on a file.
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: SourceSpec::Http(DEFAULT_URL.to_string()),
            api_url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ViewerConfig {
    /// Read `VECTOR_SCOPE_*` variables and the first CLI argument.
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok(), std::env::args().nth(1))
    }

    /// `arg` is either an `http(s)://` URL or a path to a local export.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>, arg: Option<String>) -> Self {
        let api_url = lookup(URL_VAR)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    log::warn!(
                        "Ignoring {TIMEOUT_VAR}={raw:?}, using {DEFAULT_TIMEOUT_SECS}s"
                    );
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let source = match arg {
            Some(a) if is_url(&a) => SourceSpec::Http(a),
            Some(a) => SourceSpec::File(PathBuf::from(a)),
            None => SourceSpec::Http(api_url.clone()),
        };

        ViewerConfig {
            source,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn initial_source(&self) -> Box<dyn DataSource> {
        match &self.source {
            SourceSpec::Http(url) => Box::new(HttpSource::new(url.clone(), self.timeout)),
            SourceSpec::File(path) => Box::new(FileSource::new(path.clone())),
        }
    }

    pub fn api_source(&self) -> Box<dyn DataSource> {
        Box::new(HttpSource::new(self.api_url.clone(), self.timeout))
    }
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
