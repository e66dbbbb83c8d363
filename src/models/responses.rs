use serde::{Deserialize, Serialize};
use crate::models::{analysis::AnalysisResult, domain::{LocationSource, RankedOffer}};

/// Response for the analysis endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis_id: String,
    pub result: AnalysisResult,
    /// How missing apartment coordinates were filled in; `None` when the
    /// request carried them or no location could be found
    pub location_source: Option<LocationSource>,
}

/// Response for the similar offers endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarOffersResponse {
    pub offers: Vec<RankedOffer>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Outcome of an offer geocoding batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOffersResponse {
    pub processed: usize,
    pub updated: usize,
    /// Addresses the geocoder could not place or that failed to save
    pub failed: usize,
}
