//! Document sources
//!
//! The extractor only ever sees document bytes. Where they come from is up to
//! a [`DocumentSource`]: a static-page HTTP client or the filesystem. Pages
//! that need JavaScript rendering need a different implementation.

use std::io::Read;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Produces the raw bytes of a document.
pub trait DocumentSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP(S) source backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(config: &FetchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .user_agent(config.user_agent.as_str())
            .build()
            .into();
        Self { agent }
    }

    /// Use a preconfigured agent, e.g. one with custom proxy or TLS settings.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let url = parse_http_url(location)?;

        info!(url = %url, "fetching document");
        let response = match self.agent.get(url.as_str()).call() {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(status)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Err(source) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    source: Box::new(source),
                });
            }
        };

        let body = response
            .into_body()
            .read_to_vec()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(source),
            })?;

        debug!(url = %url, bytes = body.len(), "fetched document");
        Ok(body)
    }
}

/// Validate that `location` is an absolute http or https URL.
pub fn parse_http_url(location: &str) -> Result<Url, FetchError> {
    let url = Url::parse(location).map_err(|source| FetchError::InvalidUrl {
        url: location.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// Reads documents from the filesystem; `-` reads standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let io_error = |source| FetchError::Io {
            path: location.to_string(),
            source,
        };

        if location == "-" {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).map_err(io_error)?;
            return Ok(buf);
        }

        let body = std::fs::read(location).map_err(io_error)?;
        debug!(path = location, bytes = body.len(), "read document");
        Ok(body)
    }
}

/// True when `location` is an http(s) URL rather than a path. Schemes are
/// matched case-insensitively.
pub fn is_url(location: &str) -> bool {
    Url::parse(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
