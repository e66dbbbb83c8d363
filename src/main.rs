use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use fair_rent::config::{LoggingSettings, Settings};
use fair_rent::core::Analyzer;
use fair_rent::routes::{self, AppState};
use fair_rent::services::{CacheManager, CachedGeocoder, LocationResolver, NominatimGeocoder, PostgresClient};
use std::sync::Arc;
use tracing::{info, warn, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL and LOG_FORMAT take precedence over the config file
fn init_tracing(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, e))
}

/// Geocoder chain: cache, then the remote API; centroid-only when disabled
async fn build_resolver(settings: &Settings) -> LocationResolver {
    if !settings.geocoder.enabled {
        info!("Geocoding disabled, locations fall back to city centroids");
        return LocationResolver::centroid_only();
    }

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(86_400);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match &settings.cache.redis_url {
        Some(url) => match CacheManager::new(url, l1_cache_size, cache_ttl).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Failed to connect to Redis ({}), caching geocoding results in memory only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => CacheManager::in_memory(l1_cache_size, cache_ttl),
    };

    info!(
        "Geocoding cache initialized (L1: {} entries, TTL: {}s, Redis: {})",
        l1_cache_size,
        cache_ttl,
        cache.has_shared_tier()
    );

    match NominatimGeocoder::new(&settings.geocoder) {
        Ok(geocoder) => {
            info!("Geocoder initialized ({})", settings.geocoder.endpoint);
            LocationResolver::new(Arc::new(CachedGeocoder::new(geocoder, Arc::new(cache))))
        }
        Err(e) => {
            warn!("Failed to build geocoder ({}), locations fall back to city centroids", e);
            LocationResolver::centroid_only()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging);

    info!("Starting Fair Rent analysis service...");

    let resolver = Arc::new(build_resolver(&settings).await);

    // Initialize PostgreSQL client
    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let filters = settings.filter_defaults();
    info!("Analyzer initialized with filter defaults: {:?}", filters);

    // Build application state
    let app_state = AppState {
        store: Arc::new(postgres),
        resolver,
        analyzer: Analyzer::new(filters),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
