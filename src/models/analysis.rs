use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the room count of an offer is compared against the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPolicy {
    /// Same number of rooms only
    #[default]
    Exact,
    /// Same number of rooms, or one more or one fewer
    Adjacent,
}

impl RoomPolicy {
    /// Inclusive room range accepted for a subject with `rooms` rooms
    pub fn bounds(&self, rooms: u32) -> (u32, u32) {
        match self {
            RoomPolicy::Exact => (rooms, rooms),
            RoomPolicy::Adjacent => (rooms.saturating_sub(1).max(1), rooms.saturating_add(1)),
        }
    }
}

/// Similarity filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub area_tolerance_percent: f64,
    pub price_tolerance_percent: f64,
    pub include_same_floor: bool,
    /// A value <= 0 disables distance filtering
    pub max_distance_km: f64,
    pub max_results: usize,
    pub room_policy: RoomPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            area_tolerance_percent: 20.0,
            price_tolerance_percent: 30.0,
            include_same_floor: false,
            max_distance_km: 10.0,
            max_results: 50,
            room_policy: RoomPolicy::Exact,
        }
    }
}

impl FilterConfig {
    pub fn distance_filter_enabled(&self) -> bool {
        self.max_distance_km > 0.0
    }
}

/// Aggregate price statistics over the matched offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatistics {
    pub count: usize,
    pub avg_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price_per_area: f64,
    pub price_range: String,
}

impl PriceStatistics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            avg_price: 0.0,
            median_price: 0.0,
            min_price: 0.0,
            max_price: 0.0,
            avg_price_per_area: 0.0,
            price_range: "0 - 0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Success,
    Warning,
    Danger,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Pricing advice derived from the statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub fair_price: f64,
    /// (desired - fair) / fair * 100
    pub price_difference_percent: f64,
    /// desired - fair
    pub price_difference_absolute: f64,
    pub text: String,
    pub category: RecommendationCategory,
    pub confidence: Confidence,
    pub suggested_price: f64,
}

/// Flat analysis outcome returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub count: usize,
    pub avg_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price_per_area: f64,
    pub price_range: String,
    pub fair_price: f64,
    pub price_difference_percent: f64,
    pub price_difference_absolute: f64,
    pub recommendation_text: String,
    pub recommendation_category: RecommendationCategory,
    pub confidence: Confidence,
    pub suggested_price: f64,
}

impl AnalysisResult {
    pub fn new(statistics: PriceStatistics, recommendation: Recommendation) -> Self {
        Self {
            count: statistics.count,
            avg_price: statistics.avg_price,
            median_price: statistics.median_price,
            min_price: statistics.min_price,
            max_price: statistics.max_price,
            avg_price_per_area: statistics.avg_price_per_area,
            price_range: statistics.price_range,
            fair_price: recommendation.fair_price,
            price_difference_percent: recommendation.price_difference_percent,
            price_difference_absolute: recommendation.price_difference_absolute,
            recommendation_text: recommendation.text,
            recommendation_category: recommendation.category,
            confidence: recommendation.confidence,
            suggested_price: recommendation.suggested_price,
        }
    }
}

/// Long-lived record of an analysis, stored by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub apartment_id: i64,
    pub fair_price: f64,
    pub price_difference: f64,
    pub similar_offers_count: i32,
    pub avg_price_per_sqm: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn from_result(apartment_id: i64, result: &AnalysisResult) -> Self {
        Self {
            apartment_id,
            fair_price: round_money(result.fair_price),
            price_difference: round_money(result.price_difference_percent),
            similar_offers_count: result.count as i32,
            avg_price_per_sqm: round_money(result.avg_price_per_area),
            median_price: round_money(result.median_price),
            min_price: round_money(result.min_price),
            max_price: round_money(result.max_price),
            recommendation: result.recommendation_text.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Round to two decimal places, the precision of the report columns
fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
