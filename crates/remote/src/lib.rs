//! HTTP implementation of [`RemoteSource`].
//!
//! Files are requested as `<base_url>/<path>` and streamed to the caller
//! without buffering the whole body.

use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::StatusCode;
use slashlaunch_protocol::{FetchError, FetchFuture, RemoteFile, RemoteSource};
use tokio_util::io::StreamReader;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors building an [`HttpSource`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Fetches patch files over HTTP(S).
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Creates a source rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl RemoteSource for HttpSource {
    fn fetch(&self, path: &str) -> FetchFuture<'_> {
        let url = self.url_for(path);
        Box::pin(async move {
            tracing::debug!(%url, "fetching");
            let resp = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(format!("{url}: {e}")))?;

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url));
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(FetchError::Transport(format!("{url}: {status}: {body}")));
            }

            let stream = resp.bytes_stream().map_err(std::io::Error::other);
            Ok(Box::pin(StreamReader::new(stream)) as RemoteFile)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a one-shot HTTP server. The handle yields the request line.
    async fn mock_server(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let status = status.to_string();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return String::new();
            };
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;

            request.lines().next().unwrap_or_default().to_string()
        });

        (url, handle)
    }

    async fn read_all(mut file: RemoteFile) -> String {
        let mut out = String::new();
        file.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn fetch_streams_body() {
        let (url, handle) = mock_server("200 OK", r#"{"files":[]}"#).await;
        let source = HttpSource::new(&format!("{url}/")).unwrap();

        let file = source.fetch("current/manifest.json").await.unwrap();
        assert_eq!(read_all(file).await, r#"{"files":[]}"#);
        assert_eq!(
            handle.await.unwrap(),
            "GET /current/manifest.json HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn not_found_is_distinguished() {
        let (url, handle) = mock_server("404 Not Found", "").await;
        let source = HttpSource::new(&url).unwrap();

        let err = source.fetch("hd/D2HD.dll").await.err().unwrap();
        match err {
            FetchError::NotFound(path) => assert!(path.ends_with("/hd/D2HD.dll")),
            other => panic!("unexpected error: {other}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn server_error_is_transport() {
        let (url, handle) = mock_server("503 Service Unavailable", "maintenance").await;
        let source = HttpSource::new(&url).unwrap();

        let err = source.fetch("1.13c/Game.exe").await.err().unwrap();
        match err {
            FetchError::Transport(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("maintenance"));
            }
            other => panic!("unexpected error: {other}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_server_is_transport() {
        // Bind and drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let source = HttpSource::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let err = source.fetch("current/manifest.json").await.err().unwrap();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            HttpSource::new("ftp://files.example"),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(HttpSource::new("").is_err());
    }

    #[test]
    fn joins_paths() {
        let source = HttpSource::new("https://patch.example/files/").unwrap();
        assert_eq!(source.base_url(), "https://patch.example/files");
        assert_eq!(
            source.url_for("/maphack/BH.dll"),
            "https://patch.example/files/maphack/BH.dll"
        );
    }
}
