//! HTTP client for the historical weather archive.
//!
//! One client is built per run and passed to every fetch. It owns the pooled
//! connection and the optional response cache, and nothing else: it keeps no
//! state about which batches have been fetched.

use crate::types::granularity::Granularity;
use crate::types::weather_row::WeatherRow;
use crate::weather_data::error::FetchError;
use crate::weather_data::reshape::reshape_body;
use crate::weather_data::response::ErrorBody;
use crate::weather_data::response_cache::ResponseCache;
use crate::weather_data::source::{FetchRequest, WeatherSource};
use bon::bon;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ArchiveClient {
    base_url: String,
    download_client: Client,
    cache: Option<ResponseCache>,
}

#[bon]
impl ArchiveClient {
    /// Creates a new `ArchiveClient`.
    ///
    /// # Arguments
    ///
    /// * `.base_url(String)`: Optional. Archive endpoint, defaults to [`DEFAULT_ARCHIVE_URL`].
    /// * `.timeout(Duration)`: Optional. Per-request timeout, defaults to 60 seconds.
    /// * `.user_agent(String)`: Optional. Defaults to `ebird-weather/<version>`.
    /// * `.cache_dir(PathBuf)`: Optional. Directory for cached response bodies;
    ///   caching is disabled when not set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be configured and
    /// [`FetchError::CacheDirCreation`] if the cache directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use ebird_weather::{ArchiveClient, FetchError};
    /// # async fn run() -> Result<(), FetchError> {
    /// let client = ArchiveClient::builder().build().await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn new(
        base_url: Option<String>,
        timeout: Option<Duration>,
        user_agent: Option<String>,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, FetchError> {
        let download_client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                user_agent
                    .unwrap_or_else(|| format!("ebird-weather/{}", env!("CARGO_PKG_VERSION"))),
            )
            .build()
            .map_err(FetchError::ClientBuild)?;

        let cache = match cache_dir {
            Some(dir) => Some(ResponseCache::open(&dir).await?),
            None => None,
        };

        Ok(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            download_client,
            cache,
        })
    }

    /// Builds the query URL carrying every location of `request` at once.
    pub fn request_url(&self, request: &FetchRequest) -> Result<Url, FetchError> {
        let latitudes = request
            .locations()
            .iter()
            .map(|location| location.0.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let longitudes = request
            .locations()
            .iter()
            .map(|location| location.1.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let granularity: Granularity = request.granularity();

        Url::parse_with_params(
            &self.base_url,
            &[
                ("latitude", latitudes),
                ("longitude", longitudes),
                ("start_date", request.start().format("%Y-%m-%d").to_string()),
                ("end_date", request.end().format("%Y-%m-%d").to_string()),
                (granularity.block_name(), granularity.variables().join(",")),
                ("timezone", "GMT".to_string()),
                ("timeformat", "unixtime".to_string()),
            ],
        )
        .map_err(|e| {
            FetchError::InvalidRequest(format!("invalid base url '{}': {}", self.base_url, e))
        })
    }

    async fn fetch_rows(&self, request: &FetchRequest) -> Result<Vec<WeatherRow>, FetchError> {
        let url = self.request_url(request)?;

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.load(url.as_str()).await {
                match reshape_body(&body, url.as_str(), request) {
                    Ok(rows) => {
                        info!(
                            "Cache hit for {} locations, {} rows",
                            request.locations().len(),
                            rows.len()
                        );
                        return Ok(rows);
                    }
                    Err(e) => {
                        warn!("Discarding unusable cached response: {}", e);
                        cache.evict(url.as_str()).await;
                    }
                }
            }
        }

        let body = self.download(&url).await?;
        let rows = reshape_body(&body, url.as_str(), request)?;
        if let Some(cache) = &self.cache {
            cache.store(url.as_str(), &body).await;
        }
        Ok(rows)
    }

    async fn download(&self, url: &Url) -> Result<String, FetchError> {
        debug!("Requesting {}", url);

        let response = self
            .download_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| FetchError::NetworkRequest(url.to_string(), e));
        }

        warn!("HTTP error for {}: {}", url, status);
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorBody>(&body)
            .map(|error| error.reason)
            .unwrap_or(body);
        Err(FetchError::Rejected {
            url: url.to_string(),
            status,
            reason,
        })
    }
}

impl WeatherSource for ArchiveClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<WeatherRow>, FetchError> {
        self.fetch_rows(request).await
    }
}
