//! Remote package sources
//!
//! The Thunderstore listing is split in two gzip layers:
//!
//! ```text
//! package-listing-index/   (gzip) → ["https://…/chunk-0.json.gz", …]
//!     │
//!     └── chunk-N.json.gz  (gzip) → [{ "name": …, "versions": [...] }, …]
//! ```

use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

use super::PackageRecord;
use crate::error::FetchError;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Where package records come from
///
/// Implementations return the complete listing or fail; the record cache
/// decides what to serve on failure.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Fetch every package record
    async fn fetch_all(&self) -> Result<Vec<PackageRecord>, FetchError>;

    /// Source identifier for logging
    fn name(&self) -> &str;
}

/// Thunderstore community package listing
pub struct ThunderstoreSource {
    client: reqwest::Client,
    index_url: String,
}

impl ThunderstoreSource {
    pub fn new(index_url: impl Into<String>, user_agent: &str) -> Result<Self, FetchError> {
        let index_url = index_url.into();
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|source| FetchError::Http {
                url: index_url.clone(),
                source,
            })?;

        Ok(Self { client, index_url })
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PackageSource for ThunderstoreSource {
    async fn fetch_all(&self) -> Result<Vec<PackageRecord>, FetchError> {
        let index_body = self.get_bytes(&self.index_url).await?;
        let index = decode_body(&self.index_url, &index_body)?;
        let chunks = parse_index(&self.index_url, &index)?;
        debug!("Package index lists {} chunk(s)", chunks.len());

        let mut records = Vec::new();
        for chunk_url in &chunks {
            let body = self.get_bytes(chunk_url).await?;
            let json = decode_body(chunk_url, &body)?;
            let mut chunk = parse_packages(chunk_url, &json)?;
            debug!("Fetched {} packages from {}", chunk.len(), chunk_url);
            records.append(&mut chunk);
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        "thunderstore"
    }
}

/// Gunzip a response body; bodies without the gzip header pass through
pub fn decode_body(url: &str, body: &[u8]) -> Result<Vec<u8>, FetchError> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|source| FetchError::Decompress {
            url: url.to_string(),
            source,
        })?;
    Ok(out)
}

/// Parse the listing index into chunk URLs
pub fn parse_index(url: &str, body: &[u8]) -> Result<Vec<String>, FetchError> {
    let chunks: Vec<String> = serde_json::from_slice(body).map_err(|source| FetchError::Parse {
        url: url.to_string(),
        source,
    })?;

    let chunks: Vec<String> = chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if chunks.is_empty() {
        return Err(FetchError::EmptyIndex(url.to_string()));
    }
    Ok(chunks)
}

/// Parse one listing chunk into package records
pub fn parse_packages(url: &str, body: &[u8]) -> Result<Vec<PackageRecord>, FetchError> {
    serde_json::from_slice(body).map_err(|source| FetchError::Parse {
        url: url.to_string(),
        source,
    })
}

/// Bound a source call so a hung registry cannot stall refreshes forever
pub async fn fetch_with_timeout(
    source: &dyn PackageSource,
    timeout: Duration,
) -> Result<Vec<PackageRecord>, FetchError> {
    tokio::time::timeout(timeout, source.fetch_all())
        .await
        .map_err(|_| FetchError::Timeout(timeout.as_secs()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_gzip_body() {
        let body = gzip(br#"["https://example.com/chunk.json.gz"]"#);
        let decoded = decode_body("index", &body).unwrap();
        assert_eq!(decoded, br#"["https://example.com/chunk.json.gz"]"#.to_vec());
    }

    #[test]
    fn test_decode_plain_body_passes_through() {
        let decoded = decode_body("index", b"[]").unwrap();
        assert_eq!(decoded, b"[]".to_vec());
    }

    #[test]
    fn test_decode_truncated_gzip_fails() {
        let mut body = gzip(b"[1, 2, 3, 4, 5, 6, 7, 8]");
        body.truncate(12);
        let err = decode_body("chunk", &body).unwrap_err();
        assert!(matches!(err, FetchError::Decompress { .. }));
    }

    #[test]
    fn test_parse_index() {
        let chunks = parse_index("index", br#"[" https://a/0.json.gz ", "", "https://a/1.json.gz"]"#)
            .unwrap();
        assert_eq!(chunks, vec!["https://a/0.json.gz", "https://a/1.json.gz"]);
    }

    #[test]
    fn test_parse_empty_index() {
        let err = parse_index("index", b"[]").unwrap_err();
        assert!(matches!(err, FetchError::EmptyIndex(_)));
    }

    #[test]
    fn test_parse_index_not_json() {
        let err = parse_index("index", b"<html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
        assert!(err.to_string().contains("index"));
    }

    #[test]
    fn test_parse_packages() {
        let records = parse_packages(
            "chunk",
            br#"[{"name": "A", "versions": []}, {"name": "B", "full_name": "X-B"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].full_name(), "X-B");
    }

    struct SlowSource;

    #[async_trait]
    impl PackageSource for SlowSource {
        async fn fetch_all(&self) -> Result<Vec<PackageRecord>, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let err = fetch_with_timeout(&SlowSource, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(5)));
    }
}
