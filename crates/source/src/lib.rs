//! Asset record sources.
//!
//! Provides the `AssetSource` trait with an HTTP implementation for the
//! asset API and a JSON file implementation, plus `CachedSource`, an
//! explicit cache over any source. Aggregation stays independent of where
//! records come from.

use iplandscape_model::{parse_collection, RawAssetRecord};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors from record source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for record sources (asset API, exported files, etc.)
pub trait AssetSource {
    /// Fetch the full asset collection.
    fn fetch_assets(
        &self,
    ) -> impl Future<Output = Result<Vec<RawAssetRecord>, SourceError>> + Send;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Asset API configuration.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the backend
    pub base_url: String,
    /// Path of the asset collection endpoint
    pub assets_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            assets_path: "/api/ip-assets".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Asset API source.
pub struct HttpAssetSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpAssetSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn assets_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.assets_path.trim_start_matches('/')
        )
    }
}

/// Parse a collection payload from any source. Legal statuses are
/// upper-cased the way the dashboard expects them, so filters, the radar
/// and the status trend all see the same label.
pub fn parse_payload(payload: &Value) -> Vec<RawAssetRecord> {
    let mut records = parse_collection(payload);
    for record in &mut records {
        if let Some(status) = record.legal_status.as_mut() {
            *status = status.to_uppercase();
        }
    }
    records
}

impl AssetSource for HttpAssetSource {
    async fn fetch_assets(&self) -> Result<Vec<RawAssetRecord>, SourceError> {
        let url = self.assets_url();

        tracing::debug!(url = %url, "Fetching asset collection");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))?;

        let records = parse_payload(&json);
        tracing::debug!(count = records.len(), "Fetched asset collection");
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Reads an exported asset collection from a JSON file.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    path: PathBuf,
}

impl FileAssetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AssetSource for FileAssetSource {
    async fn fetch_assets(&self) -> Result<Vec<RawAssetRecord>, SourceError> {
        tracing::debug!(path = %self.path.display(), "Reading asset file");

        let text = tokio::fs::read_to_string(&self.path).await?;
        let json: Value =
            serde_json::from_str(&text).map_err(|e| SourceError::ParseError(e.to_string()))?;

        Ok(parse_payload(&json))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Holds the last fetched collection of a source.
///
/// The collection is fetched on first use and kept until `invalidate` is
/// called, e.g. when the caller changes the reporting period.
pub struct CachedSource<S> {
    inner: S,
    cached: Mutex<Option<Arc<Vec<RawAssetRecord>>>>,
}

impl<S: AssetSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }

    /// Cached collection, fetching it on a miss.
    pub async fn records(&self) -> Result<Arc<Vec<RawAssetRecord>>, SourceError> {
        let mut cached = self.cached.lock().await;

        if let Some(records) = cached.as_ref() {
            tracing::debug!(source = self.inner.name(), "Asset cache hit");
            return Ok(Arc::clone(records));
        }

        tracing::debug!(source = self.inner.name(), "Asset cache miss");
        let records = Arc::new(self.inner.fetch_assets().await?);
        *cached = Some(Arc::clone(&records));
        Ok(records)
    }

    /// Drop the cached collection; the next `records` call refetches.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl AssetSource for CountingSource {
        async fn fetch_assets(&self) -> Result<Vec<RawAssetRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Connection("refused".to_string()));
            }
            Ok(vec![RawAssetRecord::new("Solar cell")])
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn test_assets_url() {
        let source = HttpAssetSource::new(HttpSourceConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(source.assets_url(), "http://localhost:8080/api/ip-assets");
    }

    #[test]
    fn test_parse_payload_uppercases_status() {
        let records = parse_payload(&json!([
            {"title": "Qubit array", "legalStatus": "granted"},
            null,
            {"title": "Brand", "legalStatus": "Under_Examination"},
            {"title": "No status"}
        ]));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].legal_status.as_deref(), Some("GRANTED"));
        assert_eq!(records[1].legal_status.as_deref(), Some("UNDER_EXAMINATION"));
        assert_eq!(records[2].legal_status, None);
    }

    #[test]
    fn test_parse_payload_non_array() {
        assert!(parse_payload(&json!({"error": "nope"})).is_empty());
    }

    #[tokio::test]
    async fn test_file_source() {
        let path = std::env::temp_dir().join(format!("iplandscape-assets-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"title": "Solar cell", "country": "DE", "filingDate": "2024-01-02"}, null]"#,
        )
        .await
        .unwrap();

        let records = FileAssetSource::new(&path).fetch_assets().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country.as_deref(), Some("DE"));
    }

    #[tokio::test]
    async fn test_file_source_uppercases_status() {
        let path = std::env::temp_dir().join(format!(
            "iplandscape-status-{}.json",
            std::process::id()
        ));
        tokio::fs::write(
            &path,
            r#"[{"title": "Qubit array", "legalStatus": "granted", "filingDate": "2024-01-02"}]"#,
        )
        .await
        .unwrap();

        let records = FileAssetSource::new(&path).fetch_assets().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(records[0].legal_status.as_deref(), Some("GRANTED"));
    }

    #[test]
    fn test_lowercase_status_counts_as_granted() {
        use iplandscape_aggregate::{analyze, AggregateConfig};
        use iplandscape_features::Normalizer;
        use iplandscape_model::RadarDimension;
        use iplandscape_query::AssetSelection;
        use iplandscape_radar::metric_value;

        let records = parse_payload(&json!([
            {"title": "Qubit array", "legalStatus": "granted", "filingDate": "2024-01-02"}
        ]));
        let report = analyze(
            &records,
            &Normalizer::default(),
            &AssetSelection::all().with_status("GRANTED"),
            &AggregateConfig::default().with_current_year(2024),
        );

        assert_eq!(report.status_distribution[0].key, "GRANTED");
        assert_eq!(metric_value(&report.radar, RadarDimension::GrantedRate), 100);
        assert_eq!(report.status_trend[0].granted, 1);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileAssetSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch_assets().await, Err(SourceError::Io(_))));
    }

    #[tokio::test]
    async fn test_cache_fetches_once_until_invalidated() {
        let cached = CachedSource::new(CountingSource::new(false));
        assert!(!cached.is_cached().await);

        let first = cached.records().await.unwrap();
        let second = cached.records().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        cached.invalidate().await;
        assert!(!cached.is_cached().await);
        cached.records().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_errors() {
        let cached = CachedSource::new(CountingSource::new(true));
        assert!(cached.records().await.is_err());
        assert!(cached.records().await.is_err());
        assert!(!cached.is_cached().await);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
