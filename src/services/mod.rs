// Service exports
pub mod cache;
pub mod geocoder;
pub mod postgres;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use geocoder::{
    normalize_address, CachedGeocoder, GeocodeError, Geocoder, LocationResolver, NominatimGeocoder,
};
pub use postgres::{MarketDataStore, PostgresClient, PostgresError};
