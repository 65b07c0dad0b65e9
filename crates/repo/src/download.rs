use crate::error::{ErrorKind, Result};
use crate::model::{Repository, RepositoryIndex};
use exn::ResultExt;
use time::OffsetDateTime;
use tracing::instrument;
use vexcat_transport::HttpClient;

/// Fetch and parse a repository manifest.
#[instrument(skip(client))]
pub async fn download_manifest(client: &dyn HttpClient, url: &str) -> Result<Repository> {
    let response = client.get(url).await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    serde_json::from_slice(&response.body).or_raise(|| ErrorKind::Decode(url.to_string()))
}

/// Fetch and parse a repository index.
///
/// Also returns when the index was last updated: its own `updated_at` when
/// that parses, else the response's `Last-Modified`, else now.
#[instrument(skip(client))]
pub async fn download_index(client: &dyn HttpClient, url: &str) -> Result<(RepositoryIndex, OffsetDateTime)> {
    let response = client.get(url).await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    let index: RepositoryIndex =
        serde_json::from_slice(&response.body).or_raise(|| ErrorKind::Decode(url.to_string()))?;
    let updated = index
        .updated_at()
        .or(response.last_modified)
        .unwrap_or_else(OffsetDateTime::now_utc);
    Ok((index, updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use vexcat_transport::{MockClient, MockRoute};

    const URL: &str = "https://example.com/vex/index.json";

    #[tokio::test]
    async fn test_index_timestamp_precedence() {
        let modified = datetime!(2024-01-01 00:00:00 UTC);
        let client = MockClient::with_routes([(
            URL,
            MockRoute::ok(r#"{"updated_at":"2024-06-01T00:00:00Z","packages":[]}"#).last_modified(modified),
        )]);
        let (_, updated) = download_index(&client, URL).await.unwrap();
        assert_eq!(updated, datetime!(2024-06-01 00:00:00 UTC));

        client
            .route(URL, MockRoute::ok(r#"{"updated_at":"yesterday"}"#).last_modified(modified))
            .await;
        let (_, updated) = download_index(&client, URL).await.unwrap();
        assert_eq!(updated, modified);

        client.route(URL, MockRoute::ok(r#"{"packages":[]}"#)).await;
        let before = OffsetDateTime::now_utc();
        let (_, updated) = download_index(&client, URL).await.unwrap();
        assert!(updated >= before);
    }

    #[tokio::test]
    async fn test_download_errors() {
        let client = MockClient::with_routes([
            ("https://example.com/bad.json", MockRoute::ok("<html>")),
            ("https://example.com/down.json", MockRoute::status(503)),
        ]);
        let err = download_manifest(&client, "https://example.com/bad.json").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Decode("https://example.com/bad.json".to_string()));
        let err = download_index(&client, "https://example.com/down.json").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
