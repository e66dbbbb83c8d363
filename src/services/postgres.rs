use crate::models::{AnalysisReport, City, Coordinates, MarketOffer, OfferQuery, OfferSource};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Data-access operations the service needs around an analysis
///
/// The analysis core only ever sees the materialized offer list; querying
/// and persistence stay behind this trait so handlers can run against fakes.
#[async_trait]
pub trait MarketDataStore: Send + Sync {
    async fn get_city(&self, city_id: i64) -> Result<Option<City>, PostgresError>;

    /// Active offers of a city within the room range, optionally pre-filtered by area
    async fn active_offers(&self, query: &OfferQuery) -> Result<Vec<MarketOffer>, PostgresError>;

    async fn save_report(&self, report: &AnalysisReport) -> Result<(), PostgresError>;

    async fn offers_missing_coordinates(&self, city_id: Option<i64>, limit: usize) -> Result<Vec<MarketOffer>, PostgresError>;

    async fn update_offer_coordinates(&self, offer_id: i64, coordinates: Coordinates) -> Result<(), PostgresError>;

    async fn health_check(&self) -> Result<bool, PostgresError>;
}

/// Columns selected for every market offer query
const OFFER_COLUMNS: &str = r#"
    id, city_id, source, external_id, address,
    area::float8 AS area, rooms, floor, price::float8 AS price, url,
    is_active, additional_info,
    latitude::float8 AS latitude, longitude::float8 AS longitude, parsed_date
"#;

/// PostgreSQL client for cities, market offers and analysis reports
///
/// Tables are owned by the ingestion side of the system; this client does
/// not create or migrate them.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl MarketDataStore for PostgresClient {
    async fn get_city(&self, city_id: i64) -> Result<Option<City>, PostgresError> {
        let query = r#"
            SELECT id, name, slug,
                   latitude::float8 AS latitude, longitude::float8 AS longitude,
                   COALESCE(avg_price_per_sqm, 0)::float8 AS avg_price_per_sqm,
                   population, description
            FROM cities
            WHERE id = $1
        "#;

        let row = sqlx::query(query).bind(city_id).fetch_optional(&self.pool).await?;

        row.map(|row| -> Result<City, PostgresError> {
            Ok(City {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                avg_price_per_sqm: row.try_get("avg_price_per_sqm")?,
                population: row.try_get::<Option<i32>, _>("population")?.map(i64::from),
                description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
            })
        })
        .transpose()
    }

    async fn active_offers(&self, query: &OfferQuery) -> Result<Vec<MarketOffer>, PostgresError> {
        if query.min_rooms > query.max_rooms {
            return Err(PostgresError::InvalidInput(format!(
                "room range {}-{} is empty",
                query.min_rooms, query.max_rooms
            )));
        }

        // Offers without coordinates always pass the bounding box so the
        // ranker can keep them
        let sql = format!(
            r#"
            SELECT {OFFER_COLUMNS}
            FROM market_offers
            WHERE city_id = $1
              AND is_active = TRUE
              AND rooms BETWEEN $2 AND $3
              AND ($4::float8 IS NULL OR (
                    latitude IS NULL OR longitude IS NULL
                    OR (latitude BETWEEN $4 AND $5 AND longitude BETWEEN $6 AND $7)
              ))
            ORDER BY price
            "#
        );

        let bbox = query.bounding_box;
        let rows = sqlx::query(&sql)
            .bind(query.city_id)
            .bind(i32::try_from(query.min_rooms).unwrap_or(i32::MAX))
            .bind(i32::try_from(query.max_rooms).unwrap_or(i32::MAX))
            .bind(bbox.map(|b| b.min_lat))
            .bind(bbox.map(|b| b.max_lat))
            .bind(bbox.map(|b| b.min_lon))
            .bind(bbox.map(|b| b.max_lon))
            .fetch_all(&self.pool)
            .await?;

        let offers = rows.iter().map(offer_from_row).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Loaded {} active offers for city {} ({}-{} rooms)",
            offers.len(),
            query.city_id,
            query.min_rooms,
            query.max_rooms
        );

        Ok(offers)
    }

    /// Store the report, replacing any previous report of the apartment
    async fn save_report(&self, report: &AnalysisReport) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO analysis_reports (
                apartment_id, fair_price, price_difference, similar_offers_count,
                avg_price_per_sqm, median_price, min_price, max_price,
                recommendation, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (apartment_id)
            DO UPDATE SET
                fair_price = EXCLUDED.fair_price,
                price_difference = EXCLUDED.price_difference,
                similar_offers_count = EXCLUDED.similar_offers_count,
                avg_price_per_sqm = EXCLUDED.avg_price_per_sqm,
                median_price = EXCLUDED.median_price,
                min_price = EXCLUDED.min_price,
                max_price = EXCLUDED.max_price,
                recommendation = EXCLUDED.recommendation,
                created_at = EXCLUDED.created_at
        "#;

        sqlx::query(query)
            .bind(report.apartment_id)
            .bind(report.fair_price)
            .bind(report.price_difference)
            .bind(report.similar_offers_count)
            .bind(report.avg_price_per_sqm)
            .bind(report.median_price)
            .bind(report.min_price)
            .bind(report.max_price)
            .bind(&report.recommendation)
            .bind(report.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Saved analysis report for apartment {}", report.apartment_id);

        Ok(())
    }

    async fn offers_missing_coordinates(&self, city_id: Option<i64>, limit: usize) -> Result<Vec<MarketOffer>, PostgresError> {
        let sql = format!(
            r#"
            SELECT {OFFER_COLUMNS}
            FROM market_offers
            WHERE (latitude IS NULL OR longitude IS NULL)
              AND ($1::bigint IS NULL OR city_id = $1)
            ORDER BY parsed_date DESC
            LIMIT $2
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(city_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(offer_from_row).collect()
    }

    async fn update_offer_coordinates(&self, offer_id: i64, coordinates: Coordinates) -> Result<(), PostgresError> {
        let query = r#"
            UPDATE market_offers
            SET latitude = $2, longitude = $3
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(offer_id)
            .bind(coordinates.latitude)
            .bind(coordinates.longitude)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("market offer {}", offer_id)));
        }

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn offer_from_row(row: &PgRow) -> Result<MarketOffer, PostgresError> {
    let rooms: i32 = row.try_get("rooms")?;
    let floor: Option<i32> = row.try_get("floor")?;
    let source: String = row.try_get("source")?;
    let external_id: Option<String> = row.try_get("external_id")?;
    let url: Option<String> = row.try_get("url")?;

    Ok(MarketOffer {
        id: row.try_get("id")?,
        city_id: row.try_get("city_id")?,
        source: OfferSource::from_db(&source),
        external_id: external_id.filter(|id| !id.is_empty()),
        address: row.try_get("address")?,
        area: row.try_get("area")?,
        rooms: u32::try_from(rooms)
            .map_err(|_| PostgresError::InvalidInput(format!("negative room count {}", rooms)))?,
        floor: floor.and_then(|f| u32::try_from(f).ok()),
        price: row.try_get("price")?,
        url: url.filter(|u| !u.is_empty()),
        is_active: row.try_get("is_active")?,
        additional_info: row.try_get("additional_info")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        parsed_at: row.try_get("parsed_date")?,
    })
}
