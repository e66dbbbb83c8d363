//! Address geocoding collaborators
//!
//! The analysis core never geocodes by itself; these types populate
//! apartment and offer coordinates before it runs. Every stage is an
//! explicit attempt returning `Ok(Some(..))` on a hit, `Ok(None)` on a clean
//! miss and `Err(..)` on failure, composed in a fixed order by
//! [`LocationResolver`].

use crate::config::GeocoderSettings;
use crate::core::distance::validate_coordinates;
use crate::models::{City, Coordinates, LocationSource};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur while geocoding
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoding API returned status {0}")]
    StatusError(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Geocoding is disabled")]
    Disabled,
}

/// Turns a free-form address into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Option<Coordinates>, GeocodeError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// One result of a Nominatim-style search; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// HTTP client for a Nominatim-compatible search API
///
/// Requests are spaced by at least `min_request_interval` and retried with
/// exponential backoff on network errors, HTTP 429 and 5xx responses.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    country: String,
    max_retries: u32,
    min_request_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            country: settings.country.clone(),
            max_retries: settings.max_retries,
            min_request_interval: Duration::from_millis(settings.min_request_interval_ms),
            last_request: tokio::sync::Mutex::new(None),
        })
    }

    /// Search queries from most to least specific
    fn query_variants(&self, address: &str, city: Option<&str>) -> Vec<String> {
        let mut variants = Vec::new();
        let parts: Vec<&str> = address.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();

        if let Some(city) = city {
            variants.push(format!("{}, {}, {}", address, city, self.country));
            // Street and house number, without district prefixes
            if parts.len() > 1 {
                if let Some(street) = parts.last() {
                    variants.push(format!("{}, {}, {}", street, city, self.country));
                }
            }
        }
        variants.push(format!("{}, {}", address, self.country));

        variants.dedup();
        variants
    }

    async fn respect_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn search(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let mut attempt = 0;
        loop {
            self.respect_rate_limit().await;

            match self.search_once(query).await {
                Ok(found) => return Ok(found),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    tracing::warn!(
                        "Geocoding '{}' failed (attempt {}): {}, retrying in {:?}",
                        query,
                        attempt + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn search_once(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::StatusError(status.as_u16()));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        let lat: f64 = hit
            .lat
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", hit.lat)))?;
        let lon: f64 = hit
            .lon
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", hit.lon)))?;

        validate_coordinates(lat, lon)
            .map(Some)
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))
    }
}

fn is_retryable(error: &GeocodeError) -> bool {
    match error {
        GeocodeError::RequestError(_) => true,
        GeocodeError::StatusError(code) => {
            *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || *code >= 500
        }
        _ => false,
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Option<Coordinates>, GeocodeError> {
        let address = normalize_address(address);
        if address.is_empty() {
            return Ok(None);
        }

        for query in self.query_variants(&address, city) {
            if let Some(found) = self.search(&query).await? {
                tracing::info!("Geocoded '{}' -> {:.6}, {:.6}", query, found.latitude, found.longitude);
                return Ok(Some(found));
            }
            tracing::debug!("No geocoding result for '{}'", query);
        }

        Ok(None)
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

/// Geocoder decorator that remembers successful lookups
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Arc<CacheManager>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Option<Coordinates>, GeocodeError> {
        let key = CacheKey::geocode(&normalize_address(address), city);

        match self.cache.get::<Coordinates>(&key).await {
            Ok(found) => {
                tracing::debug!("Geocoding cache hit for {}", key);
                return Ok(Some(found));
            }
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Geocoding cache lookup failed for {}: {}", key, e),
        }

        let found = self.inner.geocode(address, city).await?;
        if let Some(coordinates) = found {
            if let Err(e) = self.cache.set(&key, &coordinates).await {
                tracing::warn!("Failed to cache geocoding result for {}: {}", key, e);
            }
        }
        Ok(found)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Resolves an address to coordinates: geocoder first, then the city centroid
pub struct LocationResolver {
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder: Some(geocoder) }
    }

    /// Resolver that only ever falls back to city centroids
    pub fn centroid_only() -> Self {
        Self { geocoder: None }
    }

    /// Returns `None` when no stage could place the address
    pub async fn resolve(&self, address: &str, city: Option<&City>) -> Option<(Coordinates, LocationSource)> {
        match self.geocode(address, city).await {
            Ok(Some(found)) => return Some((found, LocationSource::Geocoder)),
            Ok(None) => tracing::info!("Address '{}' not found, trying city centroid", address),
            Err(e) => tracing::warn!("Geocoding '{}' failed: {}, trying city centroid", address, e),
        }

        match city.and_then(City::centroid) {
            Some(centroid) => Some((centroid, LocationSource::CityCentroid)),
            None => {
                tracing::warn!("Could not resolve a location for '{}'", address);
                None
            }
        }
    }

    async fn geocode(&self, address: &str, city: Option<&City>) -> Result<Option<Coordinates>, GeocodeError> {
        let geocoder = self.geocoder.as_ref().ok_or(GeocodeError::Disabled)?;
        tracing::debug!("Geocoding '{}' with {}", address, geocoder.name());
        geocoder.geocode(address, city.map(|c| c.name.as_str())).await
    }
}

/// Street-type abbreviations expanded before searching
const ABBREVIATIONS: &[(&str, &str)] = &[
    (" пр-кт ", " проспект "),
    (" пр. ", " проспект "),
    (" ул. ", " улица "),
    (" пер. ", " переулок "),
    (" наб. ", " набережная "),
    (" пл. ", " площадь "),
    (" ш. ", " шоссе "),
    (" бул. ", " бульвар "),
    (" б-р ", " бульвар "),
    (" пр-д ", " проезд "),
];

/// Collapse whitespace and expand common street abbreviations
pub fn normalize_address(address: &str) -> String {
    // Pad so abbreviations at either end still match the space-delimited patterns
    let mut normalized = format!(" {} ", address.split_whitespace().collect::<Vec<_>>().join(" "));
    for (short, long) in ABBREVIATIONS {
        normalized = normalized.replace(short, long);
    }
    normalized.trim().to_string()
}
