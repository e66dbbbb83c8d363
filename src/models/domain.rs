use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// City referenced by both apartments and market offers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub avg_price_per_sqm: f64,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub description: String,
}

impl City {
    /// Geographic centre of the city, if known
    pub fn centroid(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// Finish quality of an apartment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairType {
    None,
    #[default]
    Cosmetic,
    Euro,
    Designer,
}

/// The user's own listing being priced
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_floor_within_building", skip_on_field_errors = false))]
pub struct Apartment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub city_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub area: f64,
    #[validate(range(min = 1))]
    pub rooms: u32,
    #[validate(range(min = 1))]
    pub floor: u32,
    #[validate(range(min = 1))]
    pub total_floors: u32,
    #[serde(default)]
    pub has_balcony: bool,
    #[serde(default)]
    pub repair_type: RepairType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, max = 10_000_000.0))]
    pub desired_price: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Apartment {
    /// Location of the apartment when both coordinates are set
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Whether geocoding still has to run for this apartment
    pub fn needs_geocoding(&self) -> bool {
        !self.address.trim().is_empty() && self.coordinates().is_none()
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
    }
}

fn validate_floor_within_building(apartment: &Apartment) -> Result<(), ValidationError> {
    if apartment.floor > apartment.total_floors {
        let mut err = ValidationError::new("floor_above_total_floors");
        err.message = Some("floor cannot exceed the number of floors in the building".into());
        return Err(err);
    }
    Ok(())
}

/// Where a market offer was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSource {
    Avito,
    Cian,
    Yandex,
    /// Synthetic or analytic data
    #[default]
    Mock,
}

impl OfferSource {
    /// Parse the value stored in the `source` column, unknown values map to `Mock`
    pub fn from_db(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "avito" => Self::Avito,
            "cian" => Self::Cian,
            "yandex" => Self::Yandex,
            _ => Self::Mock,
        }
    }
}

/// A third-party comparison listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOffer {
    pub id: i64,
    pub city_id: i64,
    #[serde(default)]
    pub source: OfferSource,
    #[serde(default)]
    pub external_id: Option<String>,
    pub address: String,
    pub area: f64,
    pub rooms: u32,
    #[serde(default)]
    pub floor: Option<u32>,
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub additional_info: Option<serde_json::Value>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "Utc::now")]
    pub parsed_at: DateTime<Utc>,
}

impl MarketOffer {
    /// Price per square metre, 0 for offers without a recorded area
    pub fn price_per_area(&self) -> f64 {
        if self.area > 0.0 {
            self.price / self.area
        } else {
            0.0
        }
    }

    /// Raw coordinate pair; may still fail validation
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

fn default_true() -> bool { true }

/// A market offer that survived the similarity filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedOffer {
    #[serde(flatten)]
    pub offer: MarketOffer,
    /// Great-circle distance to the subject, when both sides are geolocated
    pub distance_km: Option<f64>,
}

impl RankedOffer {
    pub fn untagged(offer: MarketOffer) -> Self {
        Self { offer, distance_km: None }
    }

    pub fn price(&self) -> f64 {
        self.offer.price
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self { latitude, longitude }),
            _ => None,
        }
    }
}

/// Which stage of the location chain placed an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationSource {
    Geocoder,
    CityCentroid,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Parameters handed to the data-access layer when loading the offer pool
#[derive(Debug, Clone)]
pub struct OfferQuery {
    pub city_id: i64,
    pub min_rooms: u32,
    pub max_rooms: u32,
    /// Offers without coordinates always pass this pre-filter
    pub bounding_box: Option<BoundingBox>,
}
