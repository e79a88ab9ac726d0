//! Loading raw inputs from local files or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::require;
use crate::error::PipelineError;

/// Where a raw input is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(String),
}

impl Source {
    /// `http://` and `https://` values are URLs, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Remote(raw.to_string())
        } else {
            Source::Local(PathBuf::from(raw))
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Local(path)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local(path) => write!(f, "{}", path.display()),
            Source::Remote(url) => f.write_str(url),
        }
    }
}

/// Downloads `url`, failing on a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, PipelineError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| PipelineError::InvalidInput {
        source_name: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Opens a raw input for reading.
///
/// Local files are streamed; remote inputs are downloaded in full first.
#[tracing::instrument(skip(client, source), fields(source = %source))]
pub async fn open_source<C: HttpClient>(
    client: &C,
    source: &Source,
) -> Result<Box<dyn Read + Send>, PipelineError> {
    match source {
        Source::Local(path) => {
            require(path, "taxi_explorer clean --trips <URL> --zones <URL>")?;
            debug!("Reading local input");
            Ok(Box::new(File::open(path)?))
        }
        Source::Remote(url) => {
            let bytes = fetch_bytes(client, url).await?;
            info!(bytes = bytes.len(), "Input downloaded");
            Ok(Box::new(Cursor::new(bytes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http;

    use super::*;

    /// Answers every request with a fixed status and body.
    struct CannedClient {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.seen.lock().unwrap().push(req.url().to_string());
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    fn read_all(mut reader: Box<dyn Read + Send>) -> String {
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.com/trips.csv"),
            Source::Remote("https://example.com/trips.csv".to_string())
        );
        assert_eq!(
            Source::parse("data/trips.csv"),
            Source::Local(PathBuf::from("data/trips.csv"))
        );
        assert_eq!(Source::parse("data/trips.csv").to_string(), "data/trips.csv");
    }

    #[tokio::test]
    async fn test_open_local_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "LocationID,Borough").unwrap();

        let source = Source::from(file.path().to_path_buf());
        let reader = open_source(&CannedClient::new(500, ""), &source)
            .await
            .unwrap();
        assert_eq!(read_all(reader), "LocationID,Borough");
    }

    #[tokio::test]
    async fn test_open_missing_local_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::Local(dir.path().join("absent.csv"));
        let result = open_source(&CannedClient::new(200, ""), &source).await;
        assert!(matches!(
            result,
            Err(PipelineError::MissingPrerequisite { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_remote_source() {
        let client = CannedClient::new(200, "a,b\n1,2\n");
        let source = Source::parse("https://example.com/zones.csv");
        let reader = open_source(&client, &source).await.unwrap();
        assert_eq!(read_all(reader), "a,b\n1,2\n");
        assert_eq!(
            *client.seen.lock().unwrap(),
            vec!["https://example.com/zones.csv".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_error_status() {
        let client = CannedClient::new(404, "not found");
        let result = fetch_bytes(&client, "https://example.com/missing.csv").await;
        assert!(matches!(result, Err(PipelineError::Download(_))));
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        let client = CannedClient::new(200, "");
        let result = fetch_bytes(&client, "not a url").await;
        assert!(matches!(result, Err(PipelineError::InvalidInput { .. })));
        assert!(client.seen.lock().unwrap().is_empty());
    }
}
